use parking_lot::RwLock;
use plainly_core::{GlossaryEntry, GlossarySnapshot};
use std::sync::Arc;

/// The live glossary. Readers take an `Arc` snapshot; writers build a new
/// snapshot and swap it in, so a request never sees an edit half-applied.
#[derive(Clone, Default)]
pub struct GlossaryStore {
    current: Arc<RwLock<Arc<GlossarySnapshot>>>,
}

impl GlossaryStore {
    pub fn new(initial: GlossarySnapshot) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(initial))) }
    }

    pub fn snapshot(&self) -> Arc<GlossarySnapshot> {
        self.current.read().clone()
    }

    /// Add or replace terms; returns the new term count.
    pub fn upsert(&self, entries: Vec<GlossaryEntry>) -> usize {
        let mut guard = self.current.write();
        let next = guard.overlay(entries);
        let len = next.len();
        *guard = Arc::new(next);
        len
    }

    /// Remove a term; `None` if it was not present.
    pub fn remove(&self, term: &str) -> Option<usize> {
        let mut guard = self.current.write();
        guard.get(term)?;
        let next = guard.without(term);
        let len = next.len();
        *guard = Arc::new(next);
        Some(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_do_not_touch_taken_snapshots() {
        let store = GlossaryStore::new(GlossarySnapshot::empty());
        let before = store.snapshot();
        assert_eq!(store.upsert(vec![GlossaryEntry::new("lien", "a claim on property")]), 1);
        assert!(before.is_empty());
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.remove("LIEN"), Some(0));
        assert_eq!(store.remove("lien"), None);
    }
}
