// src/transport.rs
// =============================================================================
// The narrow HTTP interface the crawler talks through.
//
// The crawl engine never sees reqwest directly. It holds an
// Arc<dyn Transport> and asks for one GET at a time. That lets the tests swap
// in a scripted in-memory transport, and lets main decide whether requests go
// straight out or through the Tor SOCKS proxy.
//
// Rust concepts:
// - Traits as interfaces: Transport is implemented by ReqwestTransport and by
//   the test mock
// - async_trait: async fn in a trait that we want to use as `dyn Transport`
// =============================================================================

use crate::config::CrawlConfig;
use crate::error::CrawlerError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Status line and decoded body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// A request that never produced a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET request.
    ///
    /// Any HTTP status counts as a response; deciding what a 404 means is
    /// the caller's job.
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &CrawlConfig) -> Result<Self, CrawlerError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5));

        if config.use_proxy {
            let proxy_url = config.proxy_url();
            builder = builder.proxy(Proxy::all(&proxy_url)?);
            info!(proxy = %proxy_url, "HTTP transport routed through SOCKS proxy");
        } else {
            info!("HTTP transport without proxy");
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(categorize_error)?;

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn categorize_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Network(format!("connection failed: {}", error))
    } else if error.is_redirect() {
        TransportError::Network("too many redirects".to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}
