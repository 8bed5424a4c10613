//! Byte accounting for bridge allocations.
//!
//! This module implements the memory collaborator behind the bridge:
//! - Byte accounting for string payloads, with an optional budget
//! - `mem_alloc`/`mem_free` for the value arrays the bridge hands out
//! - Statistics for leak checks in tests

use std::ops::Deref;

use core_types::{BridgeError, BridgeResult, Value};

/// Heap statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes currently reserved
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached
    pub peak_bytes: usize,
    /// Arrays handed out by `mem_alloc` and not yet passed to `mem_free`
    pub live_arrays: usize,
    /// Successful reservations
    pub allocations: usize,
    /// Reservations refused because of the budget
    pub failed_allocations: usize,
}

/// A caller-owned array of values allocated through [`Heap::mem_alloc`].
///
/// The container is not reference-counted: whoever receives it owns it and
/// must hand it back with [`Heap::mem_free`]. The values inside are
/// independent references that must each be released through the bridge.
#[derive(Debug, PartialEq)]
pub struct VarArray {
    items: Box<[Value]>,
    bytes: usize,
}

impl VarArray {
    /// Number of values in the array.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array holds no values.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The values as a slice.
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl Deref for VarArray {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.items
    }
}

/// Allocation accountant with an optional byte budget.
///
/// # Example
///
/// ```
/// use core_types::Value;
/// use memory_manager::Heap;
///
/// let mut heap = Heap::with_budget(Some(1024));
/// let array = heap.mem_alloc(vec![Value::Int(1), Value::Int(2)]).unwrap();
/// assert_eq!(array.len(), 2);
/// assert_eq!(heap.stats().live_arrays, 1);
///
/// heap.mem_free(array);
/// assert_eq!(heap.stats().live_arrays, 0);
/// assert_eq!(heap.stats().live_bytes, 0);
/// ```
#[derive(Debug, Default)]
pub struct Heap {
    budget: Option<usize>,
    stats: HeapStats,
}

impl Heap {
    /// Creates a heap without a budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a heap that refuses reservations beyond `budget` live bytes.
    pub fn with_budget(budget: Option<usize>) -> Self {
        Heap {
            budget,
            stats: HeapStats::default(),
        }
    }

    /// The configured budget, if any.
    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    /// Reserves `bytes` for a payload described by `what`.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if the reservation would exceed the budget.
    pub fn allocate(&mut self, bytes: usize, what: &'static str) -> BridgeResult<()> {
        let new_live = self.stats.live_bytes.checked_add(bytes);
        let fits = match (new_live, self.budget) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(live), Some(budget)) => live <= budget,
        };

        if !fits {
            self.stats.failed_allocations += 1;
            tracing::warn!(
                target: "memory_manager",
                bytes,
                what,
                live = self.stats.live_bytes,
                budget = ?self.budget,
                "allocation refused"
            );
            return Err(BridgeError::AllocationFailure { what, bytes });
        }

        self.stats.live_bytes += bytes;
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.live_bytes);
        self.stats.allocations += 1;
        Ok(())
    }

    /// Reserves `bytes` without checking the budget.
    ///
    /// Used for diagnostics that must still be produced after an
    /// allocation failure.
    pub fn allocate_exempt(&mut self, bytes: usize) {
        self.stats.live_bytes = self.stats.live_bytes.saturating_add(bytes);
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.live_bytes);
        self.stats.allocations += 1;
    }

    /// Returns `bytes` previously reserved with [`Heap::allocate`].
    pub fn deallocate(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.stats.live_bytes, "heap accounting underflow");
        self.stats.live_bytes = self.stats.live_bytes.saturating_sub(bytes);
    }

    /// Moves `items` into a caller-owned array.
    ///
    /// An empty `items` still produces a valid, zero-length array.
    pub fn mem_alloc(&mut self, items: Vec<Value>) -> BridgeResult<VarArray> {
        let bytes = items.len() * std::mem::size_of::<Value>();
        self.allocate(bytes, "value array")?;
        self.stats.live_arrays += 1;
        Ok(VarArray {
            items: items.into_boxed_slice(),
            bytes,
        })
    }

    /// Frees an array returned by [`Heap::mem_alloc`].
    ///
    /// Only the container is freed; the values it held are untouched.
    pub fn mem_free(&mut self, array: VarArray) {
        self.deallocate(array.bytes);
        self.stats.live_arrays = self.stats.live_arrays.saturating_sub(1);
    }

    /// Current statistics.
    pub fn stats(&self) -> HeapStats {
        self.stats
    }
}
