//! Reference-count ledger for heap-backed values.
//!
//! Every string and object value carries a [`VarId`] into this ledger. The
//! ledger is the sole owner of the payload; holders only own a counted
//! reference. When the count drops to zero the entry is removed and its
//! payload is handed back to the caller exactly once, which then runs the
//! payload's destructor outside of any ledger borrow.

use std::collections::HashMap;

use core_types::VarId;

/// Ledger statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Entries ever created
    pub created: u64,
    /// Entries destroyed (count reached zero)
    pub destroyed: u64,
    /// AddRef/Release calls that named an already destroyed handle
    pub dead_handle_uses: u64,
    /// AddRef calls refused because the count could not grow
    pub refused_add_refs: u64,
}

/// Outcome of [`Ledger::release`].
#[derive(Debug, PartialEq)]
pub enum Released<P> {
    /// The entry is still alive with the given count
    Alive(u64),
    /// The count reached zero; the payload must now be destroyed
    Destroyed(P),
    /// The handle was not live
    Dead,
}

struct Entry<P> {
    count: u64,
    payload: P,
}

/// Handle-keyed reference counts with single-fire destruction.
///
/// # Example
///
/// ```
/// use memory_manager::{Ledger, Released};
///
/// let mut ledger = Ledger::new();
/// let id = ledger.insert("payload");
/// assert_eq!(ledger.count(id), Some(1));
///
/// ledger.add_ref(id);
/// assert_eq!(ledger.release(id), Released::Alive(1));
/// assert_eq!(ledger.release(id), Released::Destroyed("payload"));
/// assert_eq!(ledger.release(id), Released::Dead);
/// ```
pub struct Ledger<P> {
    entries: HashMap<VarId, Entry<P>>,
    next_id: u64,
    stats: LedgerStats,
}

impl<P> Default for Ledger<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Ledger<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("live", &self.entries.len())
            .field("next_id", &self.next_id)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<P> Ledger<P> {
    /// Creates an empty ledger. Handle numbering starts at 1.
    pub fn new() -> Self {
        Ledger {
            entries: HashMap::new(),
            next_id: 1,
            stats: LedgerStats::default(),
        }
    }

    /// Adds a payload with a count of 1 and returns its fresh handle.
    pub fn insert(&mut self, payload: P) -> VarId {
        let id = VarId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Entry { count: 1, payload });
        self.stats.created += 1;
        tracing::trace!(target: "memory_manager::ledger", %id, "entry created");
        id
    }

    /// Increments the count of a live handle and returns the new count.
    ///
    /// Returns `None` for a dead handle, or if the count cannot grow. A
    /// refused AddRef leaves the count untouched.
    pub fn add_ref(&mut self, id: VarId) -> Option<u64> {
        match self.entries.get_mut(&id) {
            Some(entry) => match entry.count.checked_add(1) {
                Some(count) => {
                    entry.count = count;
                    Some(count)
                }
                None => {
                    self.stats.refused_add_refs += 1;
                    tracing::warn!(target: "memory_manager::ledger", %id, "AddRef refused at maximum count");
                    None
                }
            },
            None => {
                self.stats.dead_handle_uses += 1;
                tracing::warn!(target: "memory_manager::ledger", %id, "AddRef on dead handle");
                None
            }
        }
    }

    /// Decrements the count of a handle.
    ///
    /// The entry is removed before its payload is returned, so a second
    /// release of the same handle observes [`Released::Dead`] and the
    /// payload can only ever be handed out once.
    pub fn release(&mut self, id: VarId) -> Released<P> {
        let remaining = match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.count -= 1;
                entry.count
            }
            None => {
                self.stats.dead_handle_uses += 1;
                tracing::warn!(target: "memory_manager::ledger", %id, "Release on dead handle");
                return Released::Dead;
            }
        };

        if remaining > 0 {
            return Released::Alive(remaining);
        }

        match self.entries.remove(&id) {
            Some(entry) => {
                self.stats.destroyed += 1;
                tracing::trace!(target: "memory_manager::ledger", %id, "entry destroyed");
                Released::Destroyed(entry.payload)
            }
            None => Released::Dead,
        }
    }

    /// Borrows the payload of a live handle.
    pub fn get(&self, id: VarId) -> Option<&P> {
        self.entries.get(&id).map(|entry| &entry.payload)
    }

    /// Current count of a live handle.
    pub fn count(&self, id: VarId) -> Option<u64> {
        self.entries.get(&id).map(|entry| entry.count)
    }

    /// Whether the handle is live.
    pub fn contains(&self, id: VarId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current statistics.
    pub fn stats(&self) -> LedgerStats {
        self.stats
    }
}
