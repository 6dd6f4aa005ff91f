//! Merging server snapshots into optimistically edited local state.
//!
//! Every change applied to a store's local collection is stamped with the
//! next value of a per-store sequence counter. Removals leave a tombstone
//! with their stamp, and clearing the collection records a clear marker.
//!
//! A fetch is issued as a [`FetchTicket`] that remembers the sequence value
//! at issue time (`T`) and a fetch generation. When the response arrives:
//!
//! - if a newer fetch has been issued since, the response is superseded and
//!   discarded;
//! - a remote entry replaces the local entry with the same key, unless the
//!   local entry, its tombstone, or the clear marker is stamped after `T`;
//! - a local entry missing from the snapshot survives only if it was stamped
//!   after `T`;
//! - stamps at or before `T` are then confirmed and forgotten.
//!
//! The merged collection lists the snapshot's entries first, in snapshot
//! order, followed by surviving local-only entries in their local order.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Something with a stable identity inside a store.
pub trait Keyed {
    type Key: Clone + Eq + Hash + std::fmt::Debug;

    fn key(&self) -> Self::Key;

    /// Copy server-assigned fields from `remote` when the local copy wins a merge.
    fn keep_server_fields(&mut self, _remote: &Self) {}
}

/// Receipt for an issued fetch; hand it back with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    issued_at: u64,
    generation: u64,
}

impl FetchTicket {
    /// Sequence value when the fetch was issued.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// Fetch generation of this ticket.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of applying a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The snapshot was merged into local state.
    Applied,
    /// A newer fetch was issued; this response was ignored.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    seq: u64,
    removed: bool,
}

/// Per-store bookkeeping for the merge law.
#[derive(Debug, Clone)]
pub struct Reconciler<K> {
    seq: u64,
    generation: u64,
    marks: HashMap<K, Mark>,
    cleared_at: Option<u64>,
}

impl<K> Default for Reconciler<K> {
    fn default() -> Self {
        Self {
            seq: 0,
            generation: 0,
            marks: HashMap::new(),
            cleared_at: None,
        }
    }
}

impl<K: Clone + Eq + Hash + std::fmt::Debug> Reconciler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sequence value.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    fn next(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Stamp a key as locally present.
    pub fn touch(&mut self, key: K) -> u64 {
        let seq = self.next();
        self.marks.insert(key, Mark { seq, removed: false });
        seq
    }

    /// Stamp a key as locally removed.
    pub fn tombstone(&mut self, key: K) -> u64 {
        let seq = self.next();
        self.marks.insert(key, Mark { seq, removed: true });
        seq
    }

    /// Record that the whole collection was cleared.
    ///
    /// Earlier stamps are subsumed by the marker.
    pub fn clear(&mut self) -> u64 {
        let seq = self.next();
        self.marks.clear();
        self.cleared_at = Some(seq);
        seq
    }

    /// Check if a key has a change not yet confirmed by a fetch.
    pub fn is_pending(&self, key: &K) -> bool {
        self.marks.get(key).is_some_and(|m| !m.removed)
    }

    /// Number of unconfirmed local changes, tombstones included.
    pub fn pending_count(&self) -> usize {
        self.marks.len()
    }

    /// Issue a new fetch, superseding any earlier one still in flight.
    pub fn issue(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            issued_at: self.seq,
            generation: self.generation,
        }
    }

    /// Check if no newer fetch has been issued since this ticket.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation >= self.generation
    }

    /// Merge a fetched snapshot into the local collection.
    ///
    /// Returns `None` if the ticket has been superseded; `local` is left
    /// untouched in that case.
    pub fn merge<T>(&mut self, ticket: FetchTicket, local: &[T], snapshot: Vec<T>) -> Option<Vec<T>>
    where
        T: Keyed<Key = K> + Clone,
    {
        if !self.is_current(&ticket) {
            return None;
        }
        let t = ticket.issued_at;
        let newer = |mark: Option<&Mark>| mark.is_some_and(|m| m.seq > t);
        let cleared_since = self.cleared_at.is_some_and(|c| c > t);

        let local_by_key: HashMap<K, &T> = local.iter().map(|item| (item.key(), item)).collect();
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut merged = Vec::with_capacity(snapshot.len().max(local.len()));

        for remote in snapshot {
            let key = remote.key();
            if !seen.insert(key.clone()) {
                continue;
            }
            let mark = self.marks.get(&key);
            match (mark, local_by_key.get(&key)) {
                (Some(m), Some(item)) if !m.removed && newer(mark) => {
                    let mut kept = (*item).clone();
                    kept.keep_server_fields(&remote);
                    merged.push(kept);
                }
                (Some(m), _) if m.removed && newer(mark) => {}
                _ if cleared_since => {}
                _ => merged.push(remote),
            }
        }

        for item in local {
            let key = item.key();
            if !seen.contains(&key) && newer(self.marks.get(&key)) {
                merged.push(item.clone());
            }
        }

        self.marks.retain(|_, m| m.seq > t);
        if !cleared_since {
            self.cleared_at = None;
        }

        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, u32);

    impl Keyed for Row {
        type Key = &'static str;

        fn key(&self) -> Self::Key {
            self.0
        }
    }

    #[test]
    fn test_untouched_state_takes_snapshot() {
        let mut r = Reconciler::new();
        let ticket = r.issue();
        let merged = r
            .merge(ticket, &[Row("a", 1)], vec![Row("b", 2), Row("a", 5)])
            .unwrap();
        assert_eq!(merged, vec![Row("b", 2), Row("a", 5)]);
    }

    #[test]
    fn test_removal_after_issue_is_not_resurrected() {
        let mut r = Reconciler::new();
        let ticket = r.issue();
        r.tombstone("a");
        let merged = r.merge(ticket, &[], vec![Row("a", 1), Row("b", 1)]).unwrap();
        assert_eq!(merged, vec![Row("b", 1)]);
        assert_eq!(r.pending_count(), 1);

        // The next fetch sees the tombstone as confirmed.
        let ticket = r.issue();
        let merged = r.merge(ticket, &merged, vec![Row("b", 1)]).unwrap();
        assert_eq!(merged, vec![Row("b", 1)]);
        assert_eq!(r.pending_count(), 0);
    }

    #[test]
    fn test_local_edit_after_issue_wins() {
        let mut r = Reconciler::new();
        let ticket = r.issue();
        r.touch("a");
        let merged = r
            .merge(ticket, &[Row("a", 3)], vec![Row("a", 1)])
            .unwrap();
        assert_eq!(merged, vec![Row("a", 3)]);
    }

    #[test]
    fn test_local_edit_before_issue_loses() {
        let mut r = Reconciler::new();
        r.touch("a");
        let ticket = r.issue();
        let merged = r
            .merge(ticket, &[Row("a", 3)], vec![Row("a", 1)])
            .unwrap();
        assert_eq!(merged, vec![Row("a", 1)]);
        assert!(!r.is_pending(&"a"));
    }

    #[test]
    fn test_local_only_entries() {
        let mut r = Reconciler::new();
        r.touch("old");
        let ticket = r.issue();
        r.touch("new");
        let merged = r
            .merge(ticket, &[Row("old", 1), Row("new", 1)], vec![Row("srv", 2)])
            .unwrap();
        assert_eq!(merged, vec![Row("srv", 2), Row("new", 1)]);
    }

    #[test]
    fn test_clear_after_issue_drops_snapshot() {
        let mut r = Reconciler::new();
        let ticket = r.issue();
        r.clear();
        r.touch("c");
        let merged = r
            .merge(ticket, &[Row("c", 1)], vec![Row("a", 1), Row("c", 9)])
            .unwrap();
        assert_eq!(merged, vec![Row("c", 1)]);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut r = Reconciler::<&'static str>::new();
        let first = r.issue();
        let second = r.issue();
        assert!(r.merge(first, &[Row("a", 1)], vec![]).is_none());
        assert!(r.merge(second, &[], vec![Row("a", 1)]).is_some());
    }

    #[test]
    fn test_duplicate_snapshot_keys_keep_first() {
        let mut r = Reconciler::new();
        let ticket = r.issue();
        let merged = r.merge(ticket, &[], vec![Row("a", 1), Row("a", 2)]).unwrap();
        assert_eq!(merged, vec![Row("a", 1)]);
    }
}
