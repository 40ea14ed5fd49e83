// src/extract/mod.rs
// =============================================================================
// Pure text-processing helpers used on fetched pages.
//
// Submodules:
// - html: raw href values and visible text from an HTML document
// - email: email addresses found anywhere in a string
//
// Nothing in here touches the network or shared state; every function is a
// plain input -> output transformation.
// =============================================================================

mod email;
mod html;

pub use email::extract_emails;
pub use html::{extract_links, extract_text};

/// Shortens `text` to at most `max_chars` characters.
///
/// Counts characters, not bytes, so multi-byte text is never cut in the
/// middle of a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
