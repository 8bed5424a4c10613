//! Dynamic value bridge between a native component and a scripting host.
//!
//! This crate lets both sides exchange values, inspect and mutate each
//! other's objects, and invoke functions without knowing each other's
//! internal representation:
//! - String and object values are reference-counted through a ledger
//! - Property and call operations work alike on host-native and foreign objects
//! - Native components mint their own objects from a [`Class`] capability table
//! - Failures are reported as values through an optional exception slot
//!
//! # Example
//!
//! ```
//! use var_bridge::{Bridge, Value};
//!
//! let bridge = Bridge::new();
//! let object = bridge.new_object();
//! let x = bridge.var_from_utf8(b"x");
//!
//! bridge.set_property(object, x, Value::Int(5), None);
//! assert_eq!(bridge.get_property(object, x, None), Value::Int(5));
//!
//! bridge.remove_property(object, x, None);
//! assert!(!bridge.has_property(object, x, None));
//!
//! // a float is not a valid property name
//! let mut exception = Value::Undefined;
//! let result = bridge.get_property(object, Value::Double(1.5), Some(&mut exception));
//! assert_eq!(result, Value::Undefined);
//! assert!(exception.is_string());
//!
//! for value in [exception, x, object] {
//!     bridge.release(value);
//! }
//! assert_eq!(bridge.live_vars(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bridge;
pub mod class;
pub mod config;
pub mod exception;
pub mod host;
pub mod interface;
mod invocation;
mod object;
mod property;
mod string;

// Re-export main types for convenience
pub use bridge::Bridge;
pub use class::{Class, ClassRef, InstanceData};
pub use config::{BridgeConfig, ExceptionStyle};
pub use exception::{CallResult, ExceptionSlot, Raised};
pub use host::{HostObject, NativeConstructor, NativeFn, PlainObject};
pub use interface::{get_interface, VarInterface, PPB_VAR_INTERFACE, VAR_INTERFACE};

pub use core_types::{BridgeError, ErrorKind, PropertyKey, Value, ValueKind, VarId};
pub use memory_manager::{HeapStats, LedgerStats, VarArray};
