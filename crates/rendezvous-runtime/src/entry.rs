//! Per-thread entries and the grow-only table that holds them

use std::collections::HashMap;
use std::sync::Arc;

use rendezvous_core::{Mutator, Residency, SavedState, ThreadId};

/// Saved state type for a mutator
pub(crate) type StateOf<M> = SavedState<<M as Mutator>::Zone>;

/// Bookkeeping for one thread ever associated with the isolate
pub(crate) struct Entry<M: Mutator> {
    /// Identity of the owning thread, never reassigned
    pub(crate) id: ThreadId,

    /// Handle used to reach the live zone while scheduled
    pub(crate) thread: Arc<M>,

    /// Kernel tid of the thread at creation, for diagnostics
    pub(crate) os_tid: u64,

    pub(crate) residency: Residency<StateOf<M>>,

    /// Last rendezvous round in which this entry's arrival was counted
    pub(crate) counted_round: u64,
}

impl<M: Mutator> Entry<M> {
    pub(crate) fn scheduled(thread: Arc<M>, os_tid: u64, round: u64) -> Self {
        Self {
            id: thread.thread_id(),
            thread,
            os_tid,
            residency: Residency::Scheduled,
            counted_round: round,
        }
    }

    #[inline]
    pub(crate) fn is_scheduled(&self) -> bool {
        self.residency.is_scheduled()
    }

    /// Zone to visit: the live one while scheduled, else the saved one
    pub(crate) fn zone(&self) -> Option<Arc<M::Zone>> {
        match &self.residency {
            Residency::Scheduled => self.thread.zone(),
            Residency::Parked(state) => state.zone.clone(),
        }
    }
}

/// Arena of entries indexed by thread identity
///
/// Entries are appended and never removed: a thread that detaches may
/// reattach later and must find its saved state.
pub(crate) struct EntryTable<M: Mutator> {
    entries: Vec<Entry<M>>,
    index: HashMap<ThreadId, usize>,
}

impl<M: Mutator> EntryTable<M> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn find(&self, id: ThreadId) -> Option<&Entry<M>> {
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }

    #[inline]
    pub(crate) fn find_mut(&mut self, id: ThreadId) -> Option<&mut Entry<M>> {
        match self.index.get(&id) {
            Some(&slot) => Some(&mut self.entries[slot]),
            None => None,
        }
    }

    /// Append a new entry; the caller has checked it is absent
    pub(crate) fn insert(&mut self, entry: Entry<M>) -> &mut Entry<M> {
        debug_assert!(!self.index.contains_key(&entry.id), "duplicate entry for {}", entry.id);
        let slot = self.entries.len();
        self.index.insert(entry.id, slot);
        self.entries.push(entry);
        &mut self.entries[slot]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry<M>> {
        self.entries.iter()
    }

    pub(crate) fn count_scheduled(&self) -> usize {
        self.entries.iter().filter(|e| e.is_scheduled()).count()
    }

    /// Scheduled entries other than `excluded`
    pub(crate) fn count_scheduled_except(&self, excluded: ThreadId) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_scheduled() && e.id != excluded)
            .count()
    }
}
