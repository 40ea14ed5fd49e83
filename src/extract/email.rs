// src/extract/email.rs
// Email address extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("static regex is valid"));

/// Every distinct email-looking string in `text`, sorted
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_emails() {
        let text = "Contact us at test@example.com or admin@lbs.edu.ng";
        let emails = extract_emails(text);
        assert!(emails.contains("admin@lbs.edu.ng"));
        assert!(emails.contains("test@example.com"));
        assert_eq!(emails.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let emails = extract_emails("a@b.onion, a@b.onion; a@b.onion");
        assert_eq!(emails.len(), 1);
    }

    #[test]
    fn test_mailto_href_is_found() {
        let html = r#"<a href="mailto:ops@market.onion">write to us</a>"#;
        let emails = extract_emails(html);
        assert_eq!(
            emails.into_iter().collect::<Vec<_>>(),
            vec!["ops@market.onion"]
        );
    }

    #[test]
    fn test_no_emails() {
        assert!(extract_emails("").is_empty());
        assert!(extract_emails("nothing @ here").is_empty());
    }
}
