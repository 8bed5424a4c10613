//! Object dispatch.
//!
//! An object handle resolves, once per handle at creation time, to either a
//! host-native implementation or a foreign class with its instance data.

use std::rc::Rc;

use core_types::Value;

use crate::bridge::{Bridge, Payload};
use crate::class::{ClassRef, InstanceData};
use crate::host::HostObject;

/// The implementation behind an object handle.
#[derive(Clone)]
pub(crate) enum ObjectImpl {
    /// Behaviour provided by the scripting engine
    Host(Rc<dyn HostObject>),
    /// Behaviour provided by a native class
    Foreign {
        class: ClassRef,
        data: InstanceData,
    },
}

impl ObjectImpl {
    /// Name used in diagnostics.
    pub(crate) fn describe(&self) -> String {
        match self {
            ObjectImpl::Host(object) => object.class_name().to_string(),
            ObjectImpl::Foreign { class, .. } => class.name().to_string(),
        }
    }

    /// Whether the object can be invoked as a function.
    pub(crate) fn is_callable(&self) -> bool {
        match self {
            ObjectImpl::Host(object) => object.is_callable(),
            ObjectImpl::Foreign { class, data } => class.is_callable(&**data),
        }
    }
}

impl Bridge {
    /// Hands a host-native object to the bridge and returns a value owning
    /// one reference to it.
    ///
    /// When the count reaches zero the bridge calls
    /// [`HostObject::finalize`] and releases every value it returns.
    pub fn create_host_object(&self, object: Rc<dyn HostObject>) -> Value {
        let id = self.insert(Payload::Object(ObjectImpl::Host(object)));
        tracing::debug!(target: "var_bridge", %id, "host object created");
        Value::Object(id)
    }

    /// Whether `value` is an object that can be invoked as a function.
    pub fn is_callable(&self, value: Value) -> bool {
        self.object_impl(value, "IsCallable")
            .map(|object| object.is_callable())
            .unwrap_or(false)
    }
}
