//! Bridge value representation.
//!
//! This module provides the `Value` enum exchanged between the native
//! component and the scripting host. Primitive values are stored inline,
//! while strings and objects are referenced by a ledger handle.

use std::fmt;

/// Opaque handle into the reference-count ledger.
///
/// Handles are allocated from a monotonically increasing counter and are
/// never reused, so a handle whose entry has been destroyed stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u64);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The discriminant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool,
    /// 32-bit integer
    Int,
    /// IEEE 754 double
    Double,
    /// Reference-counted UTF-8 string
    String,
    /// Reference-counted object
    Object,
}

impl ValueKind {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value passed across the bridge.
///
/// Copying a `Value` is always shallow: for `String` and `Object` the copy
/// shares the same ledger handle and does not touch its reference count.
/// Ownership of a reference is a protocol-level notion managed with
/// `AddRef`/`Release` on the bridge.
///
/// # Examples
///
/// ```
/// use core_types::{Value, ValueKind};
///
/// let n = Value::int(42);
/// assert_eq!(n.kind(), ValueKind::Int);
/// assert!(!n.is_ref_counted());
/// assert_eq!(n.as_int(), Some(42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Absence of a value; also the neutral return on failure
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// Handle to an immutable UTF-8 byte string
    String(VarId),
    /// Handle to a host-native or foreign object
    Object(VarId),
}

impl Value {
    /// `undefined`
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    /// `null`
    pub const fn null() -> Self {
        Value::Null
    }

    /// A boolean value
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// An integer value
    pub const fn int(n: i32) -> Self {
        Value::Int(n)
    }

    /// A double value
    pub const fn double(n: f64) -> Self {
        Value::Double(n)
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Name of the value's kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns the ledger handle for `String` and `Object` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{Value, VarId};
    ///
    /// assert_eq!(Value::Object(VarId(7)).var_id(), Some(VarId(7)));
    /// assert_eq!(Value::Null.var_id(), None);
    /// ```
    pub fn var_id(&self) -> Option<VarId> {
        match self {
            Value::String(id) | Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether this value carries a reference-counted payload.
    pub fn is_ref_counted(&self) -> bool {
        self.var_id().is_some()
    }

    /// Whether this value is `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Whether this value is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is a string handle.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Whether this value is an object handle.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if any.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The double payload, if any.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

/// Display for diagnostics. Heap payloads are shown by handle since the
/// contents live in the ledger.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(id) => write!(f, "[string {}]", id),
            Value::Object(id) => write!(f, "[object {}]", id),
        }
    }
}
