// src/extract/html.rs
// =============================================================================
// This module pulls raw links and readable text out of HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (built on html5ever, so broken markup is fine)
// - Supports CSS selectors for finding elements
//
// Links are returned exactly as written in the href attribute. Resolving them
// against the page URL and deciding whether they are in scope is the job of
// crawl::filter, not of this module.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));

// Elements whose text content is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Returns every `<a href>` value in document order
///
/// Example:
///   html = "<a href='/docs'>Docs</a><a href='http://b.onion'>B</a>"
///   result = ["/docs", "http://b.onion"]
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Returns the visible text of a document, whitespace collapsed to single spaces
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}
