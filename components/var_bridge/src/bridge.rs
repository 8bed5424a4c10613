//! The bridge instance: ledger, heap and reference counting.
//!
//! A [`Bridge`] belongs to the one thread that owns its scripting engine
//! instance. It uses `Rc`/`RefCell` internally and is therefore neither
//! `Send` nor `Sync`. Ledger borrows are never held across a call into a
//! class or host object, so those callbacks may re-enter the bridge.

use std::cell::RefCell;
use std::rc::Rc;

use core_types::{BridgeError, BridgeResult, Value, VarId};
use memory_manager::{Heap, HeapStats, Ledger, LedgerStats, Released, VarArray};

use crate::config::BridgeConfig;
use crate::object::ObjectImpl;

/// What a ledger entry owns.
pub(crate) enum Payload {
    String(Rc<[u8]>),
    Object(ObjectImpl),
}

/// A dynamic value bridge bound to one scripting engine instance.
///
/// # Example
///
/// ```
/// use var_bridge::Bridge;
///
/// let bridge = Bridge::new();
/// let s = bridge.var_from_utf8(b"hello");
/// assert_eq!(bridge.ref_count(s), Some(1));
///
/// bridge.add_ref(s);
/// bridge.release(s);
/// bridge.release(s);
/// assert_eq!(bridge.ref_count(s), None);
/// ```
pub struct Bridge {
    config: BridgeConfig,
    ledger: RefCell<Ledger<Payload>>,
    heap: RefCell<Heap>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("live_vars", &self.live_vars())
            .field("heap", &self.heap_stats())
            .finish()
    }
}

impl Bridge {
    /// Creates a bridge with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Creates a bridge with the given configuration.
    pub fn with_config(config: BridgeConfig) -> Self {
        let heap = Heap::with_budget(config.heap_budget);
        Bridge {
            config,
            ledger: RefCell::new(Ledger::new()),
            heap: RefCell::new(heap),
        }
    }

    /// The configuration this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Adds a reference to `value`.
    ///
    /// Does nothing for kinds that are not reference-counted, so it is
    /// always safe to call regardless of kind.
    pub fn add_ref(&self, value: Value) {
        if let Some(id) = value.var_id() {
            self.ledger.borrow_mut().add_ref(id);
        }
    }

    /// Removes a reference from `value`, destroying its payload when the
    /// count reaches zero.
    ///
    /// Does nothing for kinds that are not reference-counted.
    pub fn release(&self, value: Value) {
        let Some(id) = value.var_id() else {
            return;
        };
        // the borrow ends before the payload is destroyed
        let released = self.ledger.borrow_mut().release(id);
        if let Released::Destroyed(payload) = released {
            self.destroy(id, payload);
        }
    }

    fn destroy(&self, id: VarId, payload: Payload) {
        match payload {
            Payload::String(bytes) => {
                self.heap.borrow_mut().deallocate(bytes.len());
            }
            Payload::Object(ObjectImpl::Host(object)) => {
                tracing::debug!(target: "var_bridge", %id, "destroying host object");
                for value in object.finalize() {
                    self.release(value);
                }
            }
            Payload::Object(ObjectImpl::Foreign { class, data }) => {
                tracing::debug!(target: "var_bridge", %id, class = class.name(), "destroying foreign object");
                class.deallocate(self, data);
            }
        }
    }

    /// Current count of a string or object value, `None` if the value is
    /// not reference-counted or its entry has been destroyed.
    pub fn ref_count(&self, value: Value) -> Option<u64> {
        value.var_id().and_then(|id| self.ledger.borrow().count(id))
    }

    /// Number of live string and object entries.
    pub fn live_vars(&self) -> usize {
        self.ledger.borrow().len()
    }

    /// Ledger statistics.
    pub fn ledger_stats(&self) -> LedgerStats {
        self.ledger.borrow().stats()
    }

    /// Heap statistics.
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.borrow().stats()
    }

    /// Frees a container returned by
    /// [`get_all_property_names`](Bridge::get_all_property_names).
    ///
    /// The values it held are not released.
    pub fn mem_free(&self, array: VarArray) {
        self.heap.borrow_mut().mem_free(array);
    }

    pub(crate) fn insert(&self, payload: Payload) -> VarId {
        self.ledger.borrow_mut().insert(payload)
    }

    pub(crate) fn heap(&self) -> &RefCell<Heap> {
        &self.heap
    }

    /// Bytes of a live string entry.
    pub(crate) fn string_bytes(&self, id: VarId) -> Option<Rc<[u8]>> {
        match self.ledger.borrow().get(id) {
            Some(Payload::String(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Resolves an object value to its implementation.
    ///
    /// The returned handle is a clone, so no ledger borrow outlives this call.
    pub(crate) fn object_impl(&self, value: Value, operation: &'static str) -> BridgeResult<ObjectImpl> {
        let Value::Object(id) = value else {
            return Err(BridgeError::NotAnObject {
                operation,
                got: value.kind(),
            });
        };
        match self.ledger.borrow().get(id) {
            Some(Payload::Object(object)) => Ok(object.clone()),
            _ => {
                tracing::warn!(target: "var_bridge", %id, operation, "object handle is dead");
                Err(BridgeError::DeadHandle(id))
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let live = self.ledger.get_mut().len();
        if live > 0 {
            tracing::debug!(target: "var_bridge", live, "bridge dropped with live entries");
        }
    }
}
