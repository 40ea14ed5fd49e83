// src/crawl/results.rs
// What a crawl produces: one PageResult per successfully fetched page.

use crate::output::Tabular;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Record of one fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub emails: BTreeSet<String>,
    /// Start of the page's visible text, bounded in length
    pub snippet: String,
}

impl Tabular for PageResult {
    fn header() -> &'static [&'static str] {
        &["url", "depth", "emails", "snippet"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.depth.to_string(),
            self.emails.iter().cloned().collect::<Vec<_>>().join(";"),
            self.snippet.clone(),
        ]
    }
}

/// Thread-safe, append-only list of page results.
///
/// Results land in completion order, which differs between runs with more
/// than one worker.
#[derive(Debug, Default)]
pub struct ResultCollector {
    pages: Mutex<Vec<PageResult>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, result: PageResult) {
        self.pages.lock().push(result);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn snapshot(&self) -> Vec<PageResult> {
        self.pages.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageResult {
        PageResult {
            url: url.to_string(),
            depth: 0,
            emails: BTreeSet::new(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_snapshot_preserves_append_order() {
        let collector = ResultCollector::new();
        collector.append(page("http://a.onion/"));
        collector.append(page("http://b.onion/"));

        let urls: Vec<_> = collector.snapshot().into_iter().map(|p| p.url).collect();
        assert_eq!(urls, vec!["http://a.onion/", "http://b.onion/"]);
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_page_result_json_shape() {
        let mut result = page("http://a.onion/");
        result.emails.insert("admin@a.onion".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["url"], "http://a.onion/");
        assert_eq!(json["depth"], 0);
        assert_eq!(json["emails"][0], "admin@a.onion");
    }

    #[test]
    fn test_csv_row_joins_emails() {
        let mut result = page("http://a.onion/");
        result.emails.insert("b@a.onion".to_string());
        result.emails.insert("a@a.onion".to_string());
        assert_eq!(result.row()[2], "a@a.onion;b@a.onion");
        assert_eq!(result.row().len(), PageResult::header().len());
    }
}
