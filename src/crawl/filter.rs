// src/crawl/filter.rs
// =============================================================================
// Decides which discovered links the crawler may follow.
//
// Three pure operations:
// - resolve: turn an href (possibly relative) into an absolute URL
// - in_scope: does the URL's host end with the scope suffix (e.g. ".onion")?
// - canonicalize: the string form used as the key in the visited set
// =============================================================================

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFilter {
    // Lowercased; hosts are compared case-insensitively
    suffix: String,
}

impl UrlFilter {
    pub fn new(scope_suffix: &str) -> Self {
        Self {
            suffix: scope_suffix.trim().to_ascii_lowercase(),
        }
    }

    /// Resolves `link` against `base` the way a browser would.
    ///
    /// Returns None instead of an error when either side is malformed.
    ///
    /// Examples:
    ///   base = "http://a.onion/dir/page"
    ///   link = "/docs"            -> Some("http://a.onion/docs")
    ///   link = "other"            -> Some("http://a.onion/dir/other")
    ///   link = "http://b.onion"   -> Some("http://b.onion/")
    ///   link = "http://[broken"   -> None
    pub fn resolve(&self, base: &str, link: &str) -> Option<Url> {
        let base = Url::parse(base).ok()?;
        base.join(link).ok()
    }

    /// True iff `url` parses and its host ends with the scope suffix
    pub fn in_scope(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.host_in_scope(&parsed),
            Err(_) => false,
        }
    }

    /// Same check as `in_scope` for an already parsed URL
    pub fn host_in_scope(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => host.to_ascii_lowercase().ends_with(&self.suffix),
            None => false,
        }
    }
}

/// The visited-set key for a URL: parsed form without its fragment.
///
/// "http://A.onion#top" and "http://a.onion/" share one key. Strings that
/// do not parse are used as they are.
pub fn canonicalize(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}
