// src/crawl/mod.rs
// =============================================================================
// This module handles crawling hidden-service sites.
//
// Submodules:
// - filter: link resolution, scope check and URL canonicalization
// - fetch: one HTTP GET with timeout, delay and a tagged result
// - frontier: the shared (url, depth) work queue with drain detection
// - visited: the shared set of claimed URLs
// - results: PageResult and the collector workers append to
// - engine: the worker pool tying all of the above together
// =============================================================================

mod engine;
mod fetch;
mod filter;
mod frontier;
mod results;
mod visited;

pub use engine::Engine;
pub use fetch::{FetchFailure, FetchResult, Fetcher};
pub use filter::UrlFilter;
