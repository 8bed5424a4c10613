//! Core bridge value types and error handling.
//!
//! This crate provides the foundational types shared by both sides of the
//! value bridge: the tagged value, its ledger handle, property keys, and the
//! bridge error kinds.
//!
//! # Overview
//!
//! - [`Value`] - Tagged value exchanged across the bridge
//! - [`VarId`] - Ledger handle carried by string and object values
//! - [`PropertyKey`] - Decoded property name
//! - [`BridgeError`] - Failure detected by the bridge
//! - [`ErrorKind`] - Conceptual failure category
//!
//! # Examples
//!
//! ```
//! use core_types::{BridgeError, ErrorKind, Value};
//!
//! let num = Value::Int(42);
//! assert_eq!(num.type_name(), "int");
//!
//! let error = BridgeError::PropertyNotFound("x".to_string());
//! assert_eq!(error.kind(), ErrorKind::PropertyNotFound);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod key;
mod value;

pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use key::PropertyKey;
pub use value::{Value, ValueKind, VarId};
