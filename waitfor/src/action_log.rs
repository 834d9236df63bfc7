use std::{fmt, sync::Arc};

use crate::{Action, Recorded};

/// Append-only, insertion-ordered history of recorded actions.
///
/// Nothing is deduplicated: dispatching the same kind twice leaves two
/// entries. The log only shrinks through [`clear`](Self::clear).
///
/// Entries are stored as `Arc<A>` so that matches can be handed out
/// without copying payloads. Entries are clones taken at record time, so
/// later changes to the caller's action never reach the log.
#[derive(Clone)]
pub struct ActionLog<A: Action> {
    entries: Vec<Recorded<A>>,
}

impl<A: Action> Default for ActionLog<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A: Action> fmt::Debug for ActionLog<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionLog")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<A: Action> ActionLog<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action and return the stored entry.
    pub fn push(&mut self, action: A) -> Recorded<A> {
        let entry = Arc::new(action);
        self.entries.push(entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recorded<A>> {
        self.entries.iter()
    }

    /// Returns a copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<Recorded<A>> {
        self.entries.clone()
    }

    /// Returns the earliest entry of the given kind.
    pub fn first_of_kind(&self, kind: &str) -> Option<Recorded<A>> {
        self.entries.iter().find(|entry| entry.kind() == kind).cloned()
    }

    /// Returns how many entries of the given kind were recorded.
    pub fn count_of_kind(&self, kind: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind() == kind)
            .count()
    }

    /// Returns the distinct kinds in the log, in order of first appearance.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        for entry in &self.entries {
            let kind = entry.kind();
            if !kinds.iter().any(|k| *k == kind) {
                kinds.push(kind.into_owned());
            }
        }
        kinds
    }

    /// Match a list of kinds against the log.
    ///
    /// Each requested kind, in the order given, is resolved to the earliest
    /// entry of that kind. Returns `None` as soon as one kind has no entry.
    /// An empty request is trivially satisfied with an empty match.
    ///
    /// Repeating a kind in the request repeats its earliest entry in the
    /// result; no other deduplication happens.
    pub fn match_kinds<K: AsRef<str>>(&self, kinds: &[K]) -> Option<Vec<Recorded<A>>> {
        kinds
            .iter()
            .map(|kind| self.first_of_kind(kind.as_ref()))
            .collect()
    }
}

impl<'a, A: Action> IntoIterator for &'a ActionLog<A> {
    type Item = &'a Recorded<A>;
    type IntoIter = std::slice::Iter<'a, Recorded<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
