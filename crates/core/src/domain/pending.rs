// Pending Queue - in-memory list and its invariants
//
// Pure and synchronous: no I/O, no clock. The application layer decides when
// to persist and supplies `now`.

use super::request::QueuedRequest;
use std::cmp::Reverse;

/// Ordered list of pending requests, unique per (method, endpoint)
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQueue<D = serde_json::Value, C = serde_json::Value> {
    entries: Vec<QueuedRequest<D, C>>,
}

impl<D, C> Default for PendingQueue<D, C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D, C> PendingQueue<D, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a persisted list as-is (no dedup or capacity pass)
    pub fn from_entries(entries: Vec<QueuedRequest<D, C>>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[QueuedRequest<D, C>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `request`, replacing any entry with the same key.
    ///
    /// The new entry is appended at the end; the replaced one, if any, is returned.
    pub fn upsert(&mut self, request: QueuedRequest<D, C>) -> Option<QueuedRequest<D, C>> {
        let replaced = self
            .entries
            .iter()
            .position(|existing| existing.same_key(&request))
            .map(|idx| self.entries.remove(idx));

        self.entries.push(request);
        replaced
    }

    /// Keep only the newest `max_entries` by timestamp.
    ///
    /// When over capacity the list is re-ordered newest first before
    /// truncating. Returns the number of entries dropped.
    pub fn enforce_capacity(&mut self, max_entries: usize) -> usize {
        if self.entries.len() <= max_entries {
            return 0;
        }

        let before = self.entries.len();
        self.entries.sort_by_key(|req| Reverse(req.timestamp));
        self.entries.truncate(max_entries);
        before - self.entries.len()
    }

    /// Remove the entry with `id`; returns whether one matched
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|req| req.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.entries.iter().map(|req| req.timestamp).min()
    }

    pub fn newest_timestamp(&self) -> Option<i64> {
        self.entries.iter().map(|req| req.timestamp).max()
    }

    /// Remove every entry older than `max_age_ms` at `now` and return them
    pub fn remove_expired(&mut self, now: i64, max_age_ms: i64) -> Vec<QueuedRequest<D, C>> {
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|req| req.is_expired(now, max_age_ms));
        self.entries = kept;
        expired
    }
}

impl<D: Clone, C: Clone> PendingQueue<D, C> {
    /// Owned copy of the list; mutating it never touches the queue
    pub fn snapshot(&self) -> Vec<QueuedRequest<D, C>> {
        self.entries.clone()
    }

    /// Entries older than `max_age_ms` at `now`, without removing them
    pub fn expired(&self, now: i64, max_age_ms: i64) -> Vec<QueuedRequest<D, C>> {
        self.entries
            .iter()
            .filter(|req| req.is_expired(now, max_age_ms))
            .cloned()
            .collect()
    }
}
