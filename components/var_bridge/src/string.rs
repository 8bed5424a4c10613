//! String values.
//!
//! Strings are immutable byte sequences addressed by explicit length. They
//! are stored as UTF-8 as supplied by the caller; the bridge does not
//! validate the encoding, except for strings used as property names.

use std::rc::Rc;

use core_types::{BridgeError, BridgeResult, PropertyKey, Value};

use crate::bridge::{Bridge, Payload};

impl Bridge {
    /// Creates a string value from UTF-8 bytes, with a count of 1 owned by
    /// the caller.
    ///
    /// An empty slice stands in for a null data pointer and produces a
    /// valid empty string. Returns `Undefined` if the string cannot be
    /// allocated.
    ///
    /// # Example
    ///
    /// ```
    /// use var_bridge::Bridge;
    ///
    /// let bridge = Bridge::new();
    /// let empty = bridge.var_from_utf8(&[]);
    /// assert!(empty.is_string());
    /// assert_eq!(bridge.var_to_utf8(empty).map(|b| b.len()), Some(0));
    /// bridge.release(empty);
    /// ```
    pub fn var_from_utf8(&self, data: &[u8]) -> Value {
        match self.try_make_string(data) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(target: "var_bridge", len = data.len(), %err, "VarFromUtf8 failed");
                Value::Undefined
            }
        }
    }

    /// Reads the bytes of a string value.
    ///
    /// Returns `None` (length 0) if `value` is not a string. An empty string
    /// yields `Some` with an empty slice, never `None`.
    ///
    /// Reading a string whose count has already reached zero is a caller
    /// contract violation; the bridge answers `None` and logs it.
    pub fn var_to_utf8(&self, value: Value) -> Option<Rc<[u8]>> {
        let Value::String(id) = value else {
            return None;
        };
        let bytes = self.string_bytes(id);
        if bytes.is_none() {
            tracing::warn!(target: "var_bridge", %id, "VarToUtf8 on dead string handle");
        }
        bytes
    }

    /// Reads a string value as Rust text, replacing invalid UTF-8.
    pub fn string_lossy(&self, value: Value) -> Option<String> {
        self.var_to_utf8(value)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub(crate) fn try_make_string(&self, data: &[u8]) -> BridgeResult<Value> {
        if data.len() > self.config().max_string_len {
            return Err(BridgeError::AllocationFailure {
                what: "string",
                bytes: data.len(),
            });
        }
        self.heap().borrow_mut().allocate(data.len(), "string")?;
        Ok(Value::String(self.insert(Payload::String(Rc::from(data)))))
    }

    /// Creates a string for an exception slot. Exempt from the heap budget
    /// so that an allocation failure can still be reported.
    pub(crate) fn diagnostic_string(&self, text: &str) -> Value {
        self.heap().borrow_mut().allocate_exempt(text.len());
        Value::String(self.insert(Payload::String(Rc::from(text.as_bytes()))))
    }

    /// Decodes a property name, which must be an integer or a string of
    /// valid UTF-8. A string spelling an integer names the same property
    /// as that integer.
    pub(crate) fn property_key(&self, name: Value) -> BridgeResult<PropertyKey> {
        match name {
            Value::Int(index) => Ok(PropertyKey::Index(index)),
            Value::String(id) => {
                let bytes = self.string_bytes(id).ok_or(BridgeError::DeadHandle(id))?;
                match std::str::from_utf8(&bytes) {
                    Ok(text) => Ok(PropertyKey::from(text)),
                    Err(_) => Err(BridgeError::InvalidArgumentKind {
                        what: "property name",
                        expected: "valid UTF-8",
                        got: name.kind(),
                    }),
                }
            }
            other => Err(BridgeError::InvalidArgumentKind {
                what: "property name",
                expected: "string or int",
                got: other.kind(),
            }),
        }
    }

    /// Encodes a property key as a value owned by the caller.
    pub(crate) fn key_value(&self, key: &PropertyKey) -> BridgeResult<Value> {
        match key {
            PropertyKey::Index(index) => Ok(Value::Int(*index)),
            PropertyKey::Name(name) => self.try_make_string(name.as_bytes()),
        }
    }
}
