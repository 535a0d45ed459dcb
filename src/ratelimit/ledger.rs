//! Timestamp ledger backing the sliding window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Ordered record of admission instants, oldest first.
///
/// Entries are appended in non-decreasing order, so pruning only ever has to
/// look at the front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: VecDeque<Instant>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose age at `now` is at least `window`.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self, now: Instant, window: Duration) -> usize {
        let expired = self
            .entries
            .partition_point(|at| now.saturating_duration_since(*at) >= window);
        self.entries.drain(..expired);
        expired
    }

    /// Record an admission at `at`.
    pub fn record(&mut self, at: Instant) {
        debug_assert!(self.entries.back().map_or(true, |last| *last <= at));
        self.entries.push_back(at);
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The oldest recorded admission, if any.
    pub fn oldest(&self) -> Option<Instant> {
        self.entries.front().copied()
    }

    /// The instant at which the oldest entry leaves the window.
    ///
    /// `None` when the ledger is empty or the expiry lies beyond what the
    /// clock can represent.
    pub fn next_expiry(&self, window: Duration) -> Option<Instant> {
        self.oldest().and_then(|at| at.checked_add(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_starts_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.oldest(), None);
        assert_eq!(ledger.next_expiry(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_prune_removes_only_expired_entries() {
        let window = Duration::from_secs(1);
        let start = Instant::now();
        let mut ledger = Ledger::new();

        ledger.record(start);
        ledger.record(start + Duration::from_millis(400));
        ledger.record(start + Duration::from_millis(900));

        // At exactly start + window the first entry has aged out.
        let removed = ledger.prune(start + window, window);
        assert_eq!(removed, 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.oldest(), Some(start + Duration::from_millis(400)));

        let removed = ledger.prune(start + Duration::from_millis(1500), window);
        assert_eq!(removed, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_next_expiry_tracks_oldest_entry() {
        let window = Duration::from_millis(250);
        let start = Instant::now();
        let mut ledger = Ledger::new();

        ledger.record(start);
        ledger.record(start + Duration::from_millis(10));

        assert_eq!(ledger.next_expiry(window), Some(start + window));
    }

    #[test]
    fn test_next_expiry_out_of_range() {
        let mut ledger = Ledger::new();
        ledger.record(Instant::now());

        assert_eq!(ledger.next_expiry(Duration::MAX), None);
    }
}
