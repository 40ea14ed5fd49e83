// src/scrape.rs
// =============================================================================
// One-off scraping of individual pages, without following links.
//
// For each URL we report:
// - the HTTP status (when there was a response)
// - emails found in the page
// - in-scope links the page points to (resolved, not fetched)
// - the start of its visible text
// - an error message when the fetch failed
//
// Failures are written into the report instead of being returned as Err, so
// scraping a list of URLs always yields one report per URL.
// =============================================================================

use crate::crawl::{FetchFailure, FetchResult, Fetcher, UrlFilter};
use crate::extract::{extract_emails, extract_links, extract_text, truncate_chars};
use crate::output::Tabular;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Longest snippet stored per scraped page, in characters
pub const SCRAPE_SNIPPET_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub emails: BTreeSet<String>,
    pub links: Vec<String>,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeReport {
    fn failed(url: &str, status: Option<u16>, error: String) -> Self {
        Self {
            url: url.to_string(),
            status,
            emails: BTreeSet::new(),
            links: Vec::new(),
            snippet: String::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Tabular for ScrapeReport {
    fn header() -> &'static [&'static str] {
        &["url", "status", "emails", "links", "snippet", "error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.status.map(|s| s.to_string()).unwrap_or_default(),
            self.emails.iter().cloned().collect::<Vec<_>>().join(";"),
            self.links.join(";"),
            self.snippet.clone(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Scrapes a single page.
///
/// When `html_dir` is set the raw HTML is also written there, named after
/// the URL (see `html_file_name`). Cancelling `abort` ends the request and
/// yields a failed report.
pub async fn scrape_page(
    fetcher: &Fetcher,
    filter: &UrlFilter,
    url: &str,
    html_dir: Option<&Path>,
    abort: &CancellationToken,
) -> ScrapeReport {
    let (status, html) = match fetcher.fetch(url, abort).await {
        FetchResult::Success { status, body } => (status, body),
        FetchResult::Failure(failure) => {
            let status = match failure {
                FetchFailure::Http(status) => Some(status),
                _ => None,
            };
            return ScrapeReport::failed(url, status, failure.to_string());
        }
    };

    if let Some(dir) = html_dir {
        if let Err(e) = save_html(dir, url, &html) {
            error!(url, error = %e, "could not save page HTML");
        }
    }

    let text = extract_text(&html);
    let mut links = Vec::new();
    for href in extract_links(&html) {
        if let Some(link) = filter.resolve(url, &href) {
            if filter.host_in_scope(&link) && !links.contains(&link.to_string()) {
                links.push(link.to_string());
            }
        }
    }

    ScrapeReport {
        url: url.to_string(),
        status: Some(status),
        emails: extract_emails(&text),
        links,
        snippet: truncate_chars(&text, SCRAPE_SNIPPET_CHARS),
        error: None,
    }
}

/// Scrapes every URL, at most `concurrency` at a time.
///
/// Reports come back in completion order.
pub async fn scrape_all(
    fetcher: &Fetcher,
    filter: &UrlFilter,
    urls: &[String],
    html_dir: Option<&Path>,
    concurrency: usize,
    abort: &CancellationToken,
) -> Vec<ScrapeReport> {
    let reports: Vec<ScrapeReport> = stream::iter(urls)
        .map(|url| scrape_page(fetcher, filter, url, html_dir, abort))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    info!(pages = reports.len(), failed, "scrape complete");
    reports
}

/// File name the raw HTML of `url` is saved under
///
/// Example: "http://a.onion/x/y" -> "http_a.onion_x_y.html"
pub fn html_file_name(url: &str) -> String {
    format!("{}.html", url.replace("://", "_").replace('/', "_"))
}

fn save_html(dir: &Path, url: &str, html: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(html_file_name(url));
    std::fs::write(&path, html)?;
    info!(path = %path.display(), "saved page HTML");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use crate::transport::mock::{MockTransport, Reply};
    use std::sync::Arc;
    use std::time::Duration;

    const PAGE: &str = r#"
        <html><body>
          <h1>Forum</h1>
          <p>Mail ops@forum.onion for access</p>
          <a href="/rules">Rules</a>
          <a href="/rules">Rules again</a>
          <a href="http://other.onion/">Other</a>
          <a href="https://example.com/">Clearnet</a>
        </body></html>
    "#;

    fn fetcher(transport: MockTransport) -> Fetcher {
        let config = CrawlConfig {
            request_delay: Duration::ZERO,
            ..CrawlConfig::default()
        };
        Fetcher::new(Arc::new(transport), &config)
    }

    #[tokio::test]
    async fn test_scrape_page_report() {
        let fetcher = fetcher(MockTransport::new().page("http://forum.onion/", PAGE));
        let filter = UrlFilter::new(".onion");

        let abort = CancellationToken::new();

        let report = scrape_page(&fetcher, &filter, "http://forum.onion/", None, &abort).await;

        assert!(report.is_ok());
        assert_eq!(report.status, Some(200));
        assert!(report.emails.contains("ops@forum.onion"));
        assert_eq!(
            report.links,
            vec!["http://forum.onion/rules", "http://other.onion/"]
        );
        assert!(report.snippet.starts_with("Forum Mail ops@forum.onion"));
    }

    #[tokio::test]
    async fn test_scrape_failure_is_reported() {
        let fetcher = fetcher(MockTransport::new());
        let filter = UrlFilter::new(".onion");

        let abort = CancellationToken::new();

        let report = scrape_page(&fetcher, &filter, "http://gone.onion/", None, &abort).await;

        assert!(!report.is_ok());
        assert_eq!(report.status, Some(404));
        assert_eq!(report.error.as_deref(), Some("HTTP 404"));
        assert!(report.links.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_saves_html() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(MockTransport::new().page("http://forum.onion/", PAGE));
        let filter = UrlFilter::new(".onion");

        let abort = CancellationToken::new();

        scrape_page(
            &fetcher,
            &filter,
            "http://forum.onion/",
            Some(dir.path()),
            &abort,
        )
        .await;

        let saved = std::fs::read_to_string(dir.path().join("http_forum.onion_.html")).unwrap();
        assert_eq!(saved, PAGE);
    }

    #[tokio::test]
    async fn test_scrape_all_returns_one_report_per_url() {
        let fetcher = fetcher(
            MockTransport::new()
                .page("http://a.onion/", "<p>a</p>")
                .page("http://b.onion/", "<p>b</p>"),
        );
        let filter = UrlFilter::new(".onion");
        let urls: Vec<String> = ["http://a.onion/", "http://b.onion/", "http://c.onion/"]
            .iter()
            .map(|u| u.to_string())
            .collect();

        let abort = CancellationToken::new();

        let reports = scrape_all(&fetcher, &filter, &urls, None, 2, &abort).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports.iter().filter(|r| r.is_ok()).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_scrape_reports_every_url() {
        let transport = Arc::new(MockTransport::new().otherwise(Reply::Hang));
        let config = CrawlConfig {
            request_timeout: Duration::from_secs(3600),
            request_delay: Duration::ZERO,
            ..CrawlConfig::default()
        };
        let fetcher = Fetcher::new(transport, &config);
        let filter = UrlFilter::new(".onion");
        let urls: Vec<String> = ["http://a.onion/", "http://b.onion/"]
            .iter()
            .map(|u| u.to_string())
            .collect();
        let abort = CancellationToken::new();

        let scraping = scrape_all(&fetcher, &filter, &urls, None, 2, &abort);
        let cancel = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            abort.cancel();
        };
        let (reports, ()) = tokio::join!(scraping, cancel);

        assert_eq!(reports.len(), 2);
        assert!(reports
            .iter()
            .all(|r| r.error.as_deref() == Some("cancelled")));
    }

    #[test]
    fn test_html_file_name() {
        assert_eq!(html_file_name("http://a.onion/x/y"), "http_a.onion_x_y.html");
    }
}
