//! Memory Manager - Reference-count ledger and allocation accounting
//!
//! This component provides:
//! - The reference-count ledger that owns string and object payloads
//! - Byte accounting with an optional budget
//! - Caller-owned value arrays (`mem_alloc` / `mem_free`)

pub mod heap;
pub mod ledger;

// Re-export main types
pub use heap::{Heap, HeapStats, VarArray};
pub use ledger::{Ledger, LedgerStats, Released};
