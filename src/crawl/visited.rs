// src/crawl/visited.rs
// =============================================================================
// The set of URLs a crawl run has already claimed.
//
// "Claiming" a URL means: check that nobody has it yet AND insert it, under
// one lock. Whoever gets `true` back is the only worker allowed to fetch that
// URL during this run. Entries are never removed.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashSet;

/// Outcome of a capped claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// This caller inserted the URL and owns its fetch
    Claimed,
    /// Someone claimed it earlier
    AlreadyVisited,
    /// The set already holds `cap` URLs; nothing was inserted
    CapReached,
}

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` if absent. True iff this call did the insertion.
    #[cfg(test)]
    pub fn try_claim(&self, url: &str) -> bool {
        self.try_claim_within(url, usize::MAX) == Claim::Claimed
    }

    /// Like `try_claim`, but refuses new URLs once `cap` are present.
    ///
    /// The size check and the insertion share the lock, so the set can
    /// never grow past `cap` no matter how many workers race here.
    pub fn try_claim_within(&self, url: &str, cap: usize) -> Claim {
        let mut urls = self.urls.lock();
        if urls.contains(url) {
            Claim::AlreadyVisited
        } else if urls.len() >= cap {
            Claim::CapReached
        } else {
            urls.insert(url.to_string());
            Claim::Claimed
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_second_claim_loses() {
        let visited = VisitedSet::new();
        assert!(visited.try_claim("http://a.onion/"));
        assert!(!visited.try_claim("http://a.onion/"));
        assert!(visited.contains("http://a.onion/"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_capped_claim() {
        let visited = VisitedSet::new();
        assert_eq!(visited.try_claim_within("a", 2), Claim::Claimed);
        assert_eq!(visited.try_claim_within("a", 2), Claim::AlreadyVisited);
        assert_eq!(visited.try_claim_within("b", 2), Claim::Claimed);
        assert_eq!(visited.try_claim_within("c", 2), Claim::CapReached);
        // Known URLs still report as visited once the cap is hit
        assert_eq!(visited.try_claim_within("b", 2), Claim::AlreadyVisited);
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_zero_cap_claims_nothing() {
        let visited = VisitedSet::new();
        assert_eq!(visited.try_claim_within("a", 0), Claim::CapReached);
        assert!(visited.is_empty());
    }

    #[test]
    fn test_exactly_one_thread_wins() {
        let visited = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || visited.try_claim("http://race.onion/"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }

    #[test]
    fn test_cap_holds_under_contention() {
        let visited = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || visited.try_claim_within(&format!("u{}", i), 10))
            })
            .collect();

        let claimed = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|claim| *claim == Claim::Claimed)
            .count();

        assert_eq!(claimed, 10);
        assert_eq!(visited.len(), 10);
    }
}
