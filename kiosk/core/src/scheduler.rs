//! Keyed Deadline Scheduler
//!
//! Every timer in the kiosk (display expiry, particle removal, the fullscreen
//! request) is an entry in a `Scheduler` owned by the component it belongs
//! to. There are no background tasks: the owning event loop asks for the
//! next deadline, waits on it, then drains whatever is due.
//!
//! # Guarantees
//!
//! - At most one pending deadline per key. Scheduling a key that is already
//!   pending replaces its deadline, so a stale deadline can never fire.
//! - `pop_due` hands out each key exactly once and in deadline order
//!   (ties broken by scheduling order).
//! - Dropping the scheduler drops every pending timer.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use tokio::time::Instant;

/// A set of pending deadlines keyed by `K`
#[derive(Debug)]
pub struct Scheduler<K> {
    /// Pending deadline and sequence number per key
    entries: HashMap<K, (Instant, u64)>,
    /// Ordered view for next-deadline lookups
    queue: BTreeSet<(Instant, u64)>,
    /// Sequence number to key, for resolving popped queue entries
    keys: HashMap<u64, K>,
    /// Monotonic sequence counter
    next_seq: u64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            queue: BTreeSet::new(),
            keys: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> Scheduler<K> {
    /// Create an empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to become due at `deadline`.
    ///
    /// Returns true if a pending deadline for the same key was replaced.
    pub fn schedule(&mut self, key: K, deadline: Instant) -> bool {
        let replaced = self.cancel(&key);

        let seq = self.next_seq;
        self.next_seq += 1;

        self.queue.insert((deadline, seq));
        self.keys.insert(seq, key.clone());
        self.entries.insert(key, (deadline, seq));

        replaced
    }

    /// Cancel the pending deadline for `key`. Returns false if none was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some((deadline, seq)) => {
                self.queue.remove(&(deadline, seq));
                self.keys.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) {
        self.entries.clear();
        self.queue.clear();
        self.keys.clear();
    }

    /// Whether `key` has a pending deadline
    #[must_use]
    pub fn is_scheduled(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Pending deadline for `key`
    #[must_use]
    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.entries.get(key).map(|(deadline, _)| *deadline)
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.first().map(|(deadline, _)| *deadline)
    }

    /// Remove and return every key whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();

        while let Some(&(deadline, seq)) = self.queue.first() {
            if deadline > now {
                break;
            }
            self.queue.pop_first();
            if let Some(key) = self.keys.remove(&seq) {
                self.entries.remove(&key);
                due.push(key);
            }
        }

        due
    }

    /// Number of pending deadlines
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule("late", t0 + ms(300));
        scheduler.schedule("early", t0 + ms(100));
        scheduler.schedule("middle", t0 + ms(200));

        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(100)));
        assert_eq!(scheduler.pop_due(t0 + ms(250)), vec!["early", "middle"]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(t0 + ms(300)), vec!["late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.schedule("expiry", t0 + ms(100)));
        assert!(scheduler.schedule("expiry", t0 + ms(500)));

        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pop_due(t0 + ms(100)).is_empty());
        assert_eq!(scheduler.pop_due(t0 + ms(500)), vec!["expiry"]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1u64, t0 + ms(10));

        assert!(scheduler.cancel(&1));
        assert!(!scheduler.cancel(&1));
        assert!(scheduler.pop_due(t0 + ms(10)).is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_due_keys_are_returned_once() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule('a', t0);

        assert_eq!(scheduler.pop_due(t0), vec!['a']);
        assert!(scheduler.pop_due(t0 + ms(1000)).is_empty());
        assert!(!scheduler.is_scheduled(&'a'));
    }

    #[test]
    fn test_equal_deadlines_keep_scheduling_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        for key in 0..5u32 {
            scheduler.schedule(key, t0 + ms(50));
        }
        assert_eq!(scheduler.pop_due(t0 + ms(50)), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_all() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1u8, t0 + ms(1));
        scheduler.schedule(2u8, t0 + ms(2));
        scheduler.cancel_all();

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.deadline(&1), None);
        assert!(scheduler.pop_due(t0 + ms(5)).is_empty());
    }
}
