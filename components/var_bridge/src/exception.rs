//! Exception channel.
//!
//! Failures never cross the bridge as panics or Rust errors. Internally every
//! operation returns [`CallResult`]; at the public boundary [`report`] turns
//! an `Err` into a diagnostic value written to the caller's optional slot and
//! hands back a neutral return value instead.

use core_types::{BridgeError, Value};

use crate::bridge::Bridge;
use crate::config::ExceptionStyle;
use crate::host::PlainObject;

/// Optional caller-owned output location for an exception value.
///
/// The bridge writes it only on failure. Whatever the slot held before is
/// overwritten without being released.
pub type ExceptionSlot<'a> = Option<&'a mut Value>;

/// An exception on its way to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Raised {
    /// Detected by the bridge; rendered according to the configured style
    Error(BridgeError),
    /// Produced by a callee; forwarded verbatim. The bridge owns one
    /// reference to it.
    Value(Value),
}

impl From<BridgeError> for Raised {
    fn from(err: BridgeError) -> Self {
        Raised::Error(err)
    }
}

/// Result type for operations that may raise.
pub type CallResult<T> = Result<T, Raised>;

/// Converts `result` into the bridge's return convention.
///
/// On `Ok` the slot is left untouched. On `Err` the exception is
/// materialised into the slot (or released if there is no slot) and
/// `neutral` is returned.
pub(crate) fn report<T>(
    bridge: &Bridge,
    operation: &'static str,
    result: CallResult<T>,
    exception: ExceptionSlot<'_>,
    neutral: T,
) -> T {
    match result {
        Ok(value) => value,
        Err(raised) => {
            tracing::debug!(target: "var_bridge", operation, ?raised, "operation failed");
            match exception {
                Some(slot) => *slot = materialize(bridge, raised),
                None => {
                    if let Raised::Value(value) = raised {
                        bridge.release(value);
                    }
                }
            }
            neutral
        }
    }
}

/// Produces the value written into an exception slot.
fn materialize(bridge: &Bridge, raised: Raised) -> Value {
    match raised {
        Raised::Value(value) => value,
        Raised::Error(err) => match bridge.config().exception_style {
            ExceptionStyle::String => bridge.diagnostic_string(&err.diagnostic()),
            ExceptionStyle::ErrorObject => error_object(bridge, &err),
        },
    }
}

/// Builds a host-native error object with `name` and `message` properties.
fn error_object(bridge: &Bridge, err: &BridgeError) -> Value {
    let object = PlainObject::new();
    object.insert("name", bridge.diagnostic_string(err.kind().error_name()));
    object.insert("message", bridge.diagnostic_string(&err.to_string()));
    bridge.create_host_object(std::rc::Rc::new(object))
}
