// src/crawl/engine.rs
// =============================================================================
// The crawl engine: a fixed pool of workers draining a shared frontier.
//
// How a run works:
// 1. Seed the frontier with every seed URL at depth 0
// 2. Spawn `concurrency` worker tasks
// 3. Each worker loops: pop -> check page cap -> check depth -> claim ->
//    fetch -> record result -> push in-scope children -> task_done
// 4. The run ends when the frontier drains, the page cap is hit, or the
//    caller cancels; the engine then cancels the run's stop token so idle
//    workers wake up, and waits for every worker before returning
//
// Failed fetches never end a run. A run where every request fails still
// completes and returns an empty list.
//
// Cancellation has two levels:
// - abort: the caller's token. Interrupts pops, in-flight requests and delays.
// - stop: a child of abort, owned by the run. Cancelled when the frontier
//   drains or the page cap is reached. Only wakes idle workers; a request
//   already in flight finishes and its page is kept.
// =============================================================================

use crate::config::CrawlConfig;
use crate::crawl::fetch::{FetchResult, Fetcher};
use crate::crawl::filter::{canonicalize, UrlFilter};
use crate::crawl::frontier::{Frontier, FrontierItem};
use crate::crawl::results::{PageResult, ResultCollector};
use crate::crawl::visited::{Claim, VisitedSet};
use crate::error::CrawlerError;
use crate::extract::{extract_emails, extract_links, extract_text, truncate_chars};
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Longest snippet stored per page, in characters
pub const SNIPPET_CHARS: usize = 2000;

/// Lifecycle of the engine's current (or last) run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Seeding,
    Running,
    Draining,
    Stopped,
}

/// Shared state of one `run()`; dropped when it returns
struct CrawlRun {
    frontier: Frontier,
    visited: VisitedSet,
    results: ResultCollector,
    stop: CancellationToken,
    abort: CancellationToken,
}

impl CrawlRun {
    fn new(abort: CancellationToken) -> Self {
        let stop = abort.child_token();
        Self {
            frontier: Frontier::new(stop.clone()),
            visited: VisitedSet::new(),
            results: ResultCollector::new(),
            stop,
            abort,
        }
    }
}

pub struct Engine {
    config: Arc<CrawlConfig>,
    fetcher: Arc<Fetcher>,
    filter: UrlFilter,
    cancel: CancellationToken,
    state: Mutex<EngineState>,
}

impl Engine {
    pub fn new(config: CrawlConfig, transport: Arc<dyn Transport>) -> Result<Self, CrawlerError> {
        config.validate()?;

        Ok(Self {
            fetcher: Arc::new(Fetcher::new(transport, &config)),
            filter: UrlFilter::new(&config.scope_suffix),
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            state: Mutex::new(EngineState::Idle),
        })
    }

    /// Uses `token` as the external cancellation signal for every run.
    ///
    /// Once cancelled, the current run winds down and later runs return
    /// right away with whatever their workers had finished.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    fn set_state(&self, state: EngineState) {
        debug!(?state, "engine state");
        *self.state.lock() = state;
    }

    /// Crawls outward from `seeds` and returns every page fetched.
    ///
    /// Order of the returned pages follows completion, not discovery.
    pub async fn run(&self, seeds: &[String]) -> Vec<PageResult> {
        if seeds.is_empty() {
            error!("no seeds to crawl");
            self.set_state(EngineState::Stopped);
            return Vec::new();
        }

        let run = Arc::new(CrawlRun::new(self.cancel.clone()));

        self.set_state(EngineState::Seeding);
        for seed in seeds {
            let url = canonicalize(seed);
            if !self.filter.in_scope(&url) {
                warn!(url = %url, suffix = %self.config.scope_suffix, "seed outside crawl scope");
            }
            run.frontier.push(FrontierItem::new(url, 0));
        }
        info!(
            seeds = seeds.len(),
            concurrency = self.config.concurrency,
            max_depth = self.config.max_depth,
            max_pages = self.config.max_pages,
            "crawl started"
        );

        self.set_state(EngineState::Running);
        let mut workers = JoinSet::new();
        for id in 0..self.config.concurrency {
            let worker = Worker {
                id,
                run: Arc::clone(&run),
                fetcher: Arc::clone(&self.fetcher),
                filter: self.filter.clone(),
                config: Arc::clone(&self.config),
            };
            workers.spawn(worker.run());
        }

        tokio::select! {
            _ = run.frontier.drained() => debug!("frontier drained"),
            _ = run.stop.cancelled() => debug!("stop requested"),
            Some(joined) = workers.join_next() => {
                // Workers only leave on their own after drain or stop, so
                // reaching this branch first means one of them died
                if let Err(e) = joined {
                    error!(error = %e, "crawl worker ended unexpectedly");
                }
            }
        }

        self.set_state(EngineState::Draining);
        run.stop.cancel();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "crawl worker ended unexpectedly");
            }
        }

        self.set_state(EngineState::Stopped);
        let pages = run.results.snapshot();
        info!(
            pages = pages.len(),
            visited = run.visited.len(),
            aborted = run.abort.is_cancelled(),
            "crawl complete"
        );
        pages
    }
}

/// What a worker should do after finishing one item
enum Step {
    Continue,
    /// Page cap reached, stop the whole run
    Stop,
}

/// One worker task. Holds handles to the run, no state of its own.
struct Worker {
    id: usize,
    run: Arc<CrawlRun>,
    fetcher: Arc<Fetcher>,
    filter: UrlFilter,
    config: Arc<CrawlConfig>,
}

impl Worker {
    async fn run(self) {
        debug!(worker = self.id, "worker started");

        while let Some(item) = self.run.frontier.pop().await {
            let step = self.process(&item).await;
            // Children are already pushed, so the frontier cannot look
            // drained while this item's links are still unqueued
            self.run.frontier.task_done();

            if let Step::Stop = step {
                info!(
                    worker = self.id,
                    max_pages = self.config.max_pages,
                    "page cap reached"
                );
                self.run.stop.cancel();
                break;
            }
        }

        debug!(worker = self.id, "worker finished");
    }

    async fn process(&self, item: &FrontierItem) -> Step {
        let max_pages = self.config.max_pages;

        if self.run.visited.len() >= max_pages {
            return Step::Stop;
        }

        if item.depth > self.config.max_depth {
            trace!(url = %item.url, depth = item.depth, "beyond max depth, skipped");
            return Step::Continue;
        }

        match self.run.visited.try_claim_within(&item.url, max_pages) {
            Claim::Claimed => {}
            Claim::AlreadyVisited => {
                trace!(url = %item.url, "already visited");
                return Step::Continue;
            }
            Claim::CapReached => return Step::Stop,
        }

        debug!(worker = self.id, url = %item.url, depth = item.depth, "crawling");
        let body = match self.fetcher.fetch(&item.url, &self.run.abort).await {
            FetchResult::Success { body, .. } => body,
            // Already logged by the fetcher; the URL stays visited
            FetchResult::Failure(_) => return Step::Continue,
        };

        self.run.results.append(PageResult {
            url: item.url.clone(),
            depth: item.depth,
            emails: extract_emails(&body),
            snippet: truncate_chars(&extract_text(&body), SNIPPET_CHARS),
        });

        let mut queued = 0;
        for href in extract_links(&body) {
            let Some(link) = self.filter.resolve(&item.url, &href) else {
                trace!(href = %href, "unresolvable link dropped");
                continue;
            };
            if !self.filter.host_in_scope(&link) {
                continue;
            }
            let link = canonicalize(link.as_str());
            if self.run.visited.contains(&link) {
                continue;
            }
            self.run
                .frontier
                .push(FrontierItem::new(link, item.depth + 1));
            queued += 1;
        }
        debug!(url = %item.url, queued, "links queued");

        Step::Continue
    }
}
