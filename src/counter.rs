//! Per-day, per-source sequence counters.
//!
//! [`DailyCounterStore`] is created once at startup and shared by handle
//! (`Arc`) with every session. State is in memory only and is lost on
//! restart. All counters are cleared the first time a new day is observed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Snapshot of the counter state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyCounter {
    /// Day the counts belong to, as `DDMM`
    pub day: String,
    /// Last sequence number handed out per source code
    pub counts: HashMap<String, u32>,
}

/// Thread-safe counter store.
///
/// # Example
///
/// ```rust
/// use acctpack::counter::DailyCounterStore;
///
/// let store = DailyCounterStore::new();
/// assert_eq!(store.next_sequence("RANA", "0105"), 1);
/// assert_eq!(store.next_sequence("RANA", "0105"), 2);
/// assert_eq!(store.next_sequence("SHA", "0105"), 1);
/// assert_eq!(store.next_sequence("RANA", "0205"), 1);
/// ```
#[derive(Debug, Default)]
pub struct DailyCounterStore {
    inner: Mutex<DailyCounter>,
}

impl DailyCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments and returns the counter for `code` on `day`.
    ///
    /// If `day` differs from the stored day, every code is reset before the
    /// increment. The read, reset and write happen under one lock.
    pub fn next_sequence(&self, code: &str, day: &str) -> u32 {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.day != day {
            if !state.day.is_empty() {
                log::debug!("day rolled over from {} to {}, resetting counters", state.day, day);
            }
            state.counts.clear();
            state.day = day.to_string();
        }
        let next = state.counts.entry(code.to_string()).or_insert(0);
        *next += 1;
        *next
    }

    /// Returns the last sequence handed out for `code` today, without incrementing.
    pub fn peek(&self, code: &str) -> Option<u32> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.counts.get(code).copied()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> DailyCounter {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_starts_at_one() {
        let store = DailyCounterStore::new();
        assert_eq!(store.peek("RANA"), None);
        assert_eq!(store.next_sequence("RANA", "1510"), 1);
        assert_eq!(store.peek("RANA"), Some(1));
    }

    #[test]
    fn test_day_rollover_resets_all_codes() {
        let store = DailyCounterStore::new();
        store.next_sequence("RANA", "1510");
        store.next_sequence("RANA", "1510");
        store.next_sequence("KAR", "1510");

        assert_eq!(store.next_sequence("RANA", "1610"), 1);
        assert_eq!(store.peek("KAR"), None);

        let snap = store.snapshot();
        assert_eq!(snap.day, "1610");
        assert_eq!(snap.counts.len(), 1);
    }

    #[test]
    fn test_concurrent_increments_are_unique() {
        let store = Arc::new(DailyCounterStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| store.next_sequence("BL", "0101"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (1..=400).collect::<Vec<_>>());
    }
}
