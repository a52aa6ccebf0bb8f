//! Per-node fetch bookkeeping.

use crate::store::Parent;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    InFlight,
    Done,
}

/// Remembers which listings were requested so each one is fetched at most
/// once per session.
///
/// A failed fetch is released so it can be triggered again.
#[derive(Debug, Default)]
pub struct FetchTracker {
    fetches: HashMap<Parent, FetchState>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for fetching. Returns `false` if it is already in flight
    /// or done.
    pub fn try_begin(&mut self, key: &Parent) -> bool {
        if self.fetches.contains_key(key) {
            return false;
        }
        self.fetches.insert(key.clone(), FetchState::InFlight);
        true
    }

    pub fn finish(&mut self, key: &Parent, success: bool) {
        if success {
            self.fetches.insert(key.clone(), FetchState::Done);
        } else {
            self.fetches.remove(key);
        }
    }

    pub fn is_fetched(&self, key: &Parent) -> bool {
        self.fetches.get(key) == Some(&FetchState::Done)
    }

    pub fn is_in_flight(&self, key: &Parent) -> bool {
        self.fetches.get(key) == Some(&FetchState::InFlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut tracker = FetchTracker::new();
        let key = Parent::Id("1".into());

        assert!(tracker.try_begin(&key));
        assert!(tracker.is_in_flight(&key));
        assert!(!tracker.try_begin(&key));

        tracker.finish(&key, true);
        assert!(tracker.is_fetched(&key));
        assert!(!tracker.try_begin(&key));
    }

    #[test]
    fn test_failure_releases_claim() {
        let mut tracker = FetchTracker::new();

        assert!(tracker.try_begin(&Parent::Root));
        tracker.finish(&Parent::Root, false);

        assert!(!tracker.is_fetched(&Parent::Root));
        assert!(tracker.try_begin(&Parent::Root));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = FetchTracker::new();
        assert!(tracker.try_begin(&Parent::Root));
        assert!(tracker.try_begin(&Parent::Id("1".into())));
        assert!(tracker.try_begin(&Parent::Id("2".into())));
    }
}
