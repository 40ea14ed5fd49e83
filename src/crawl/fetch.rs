// src/crawl/fetch.rs
// =============================================================================
// Fetches one page and reports what happened as a tagged result.
//
// Key functionality:
// - One GET through the injected Transport, with the configured User-Agent
// - A hard timeout around the whole call
// - Classifies the outcome: success, timeout, HTTP error status, network error
// - Sleeps `request_delay` after EVERY attempt, success or failure, so a
//   worker never hits the proxy or the target faster than that
//
// Nothing here returns Err: a failed fetch is an ordinary outcome the worker
// matches on.
// =============================================================================

use crate::config::CrawlConfig;
use crate::transport::{Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a single fetch attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// 2xx response
    Success { status: u16, body: String },
    Failure(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// No response within `request_timeout`
    Timeout,
    /// The server answered with a non-2xx status
    Http(u16),
    /// Connection refused, DNS/proxy failure, broken body, ...
    Network(String),
    /// The run was aborted while the request or its delay was pending
    Cancelled,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "timed out"),
            FetchFailure::Http(status) => write!(f, "HTTP {}", status),
            FetchFailure::Network(reason) => write!(f, "network error: {}", reason),
            FetchFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

pub struct Fetcher {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    timeout: Duration,
    delay: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, config: &CrawlConfig) -> Self {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&config.user_agent) {
            Ok(agent) => {
                headers.insert(USER_AGENT, agent);
            }
            Err(_) => warn!(
                user_agent = %config.user_agent,
                "user agent is not a valid header value, sending none"
            ),
        }

        Self {
            transport,
            headers,
            timeout: config.request_timeout,
            delay: config.request_delay,
        }
    }

    /// Fetches `url`, then waits out the request delay.
    ///
    /// Cancelling `abort` ends both the request and the delay early with
    /// `FetchFailure::Cancelled`.
    pub async fn fetch(&self, url: &str, abort: &CancellationToken) -> FetchResult {
        let result = tokio::select! {
            biased;
            _ = abort.cancelled() => return FetchResult::Failure(FetchFailure::Cancelled),
            result = self.attempt(url) => result,
        };

        match &result {
            FetchResult::Success { body, .. } => {
                info!(url, len = body.len(), "fetched");
            }
            FetchResult::Failure(failure) => {
                warn!(url, %failure, "fetch failed");
            }
        }

        if !self.delay.is_zero() {
            tokio::select! {
                _ = abort.cancelled() => {
                    debug!(url, "request delay cut short by cancellation");
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        result
    }

    async fn attempt(&self, url: &str) -> FetchResult {
        let call = self.transport.get(url, &self.headers, self.timeout);

        match tokio::time::timeout(self.timeout, call).await {
            Err(_elapsed) => FetchResult::Failure(FetchFailure::Timeout),
            Ok(Err(TransportError::Timeout)) => FetchResult::Failure(FetchFailure::Timeout),
            Ok(Err(TransportError::Network(reason))) => {
                FetchResult::Failure(FetchFailure::Network(reason))
            }
            Ok(Ok(response)) if (200..300).contains(&response.status) => FetchResult::Success {
                status: response.status,
                body: response.body,
            },
            Ok(Ok(response)) => FetchResult::Failure(FetchFailure::Http(response.status)),
        }
    }
}
