//! Object factory for native classes.
//!
//! A native component describes one kind of object with a [`Class`]
//! capability table and mints instances with
//! [`Bridge::create_object`]. Every property or call operation on such an
//! instance is delegated to its class along with the instance data supplied
//! at creation.

use std::any::Any;
use std::rc::Rc;

use core_types::{BridgeError, Value};

use crate::bridge::{Bridge, Payload};
use crate::exception::CallResult;
use crate::object::ObjectImpl;

/// Opaque per-instance data owned by the creator of a foreign object.
pub type InstanceData = Rc<dyn Any>;

/// Shared handle to a class. Identity is the address of the allocation.
pub type ClassRef = Rc<dyn Class>;

/// Capability table for a kind of native object.
///
/// Names passed to the property callbacks have already been checked to be
/// strings or integers. Argument and name values are borrowed: add a
/// reference to retain one. Values returned through `Ok`, and exception
/// values returned through `Err(Raised::Value(..))`, transfer one reference
/// to the bridge.
///
/// Every method except [`get_property`](Class::get_property) has a default
/// that describes an object without that capability.
pub trait Class {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "object"
    }

    /// Whether the instance has the property. Methods count as properties.
    fn has_property(&self, _bridge: &Bridge, _data: &dyn Any, _name: Value) -> CallResult<bool> {
        Ok(false)
    }

    /// Whether the instance has a callable property with this name.
    fn has_method(&self, _bridge: &Bridge, _data: &dyn Any, _name: Value) -> CallResult<bool> {
        Ok(false)
    }

    /// Reads a property.
    fn get_property(&self, bridge: &Bridge, data: &dyn Any, name: Value) -> CallResult<Value>;

    /// Enumerable property names, each owned by the caller.
    fn get_all_property_names(&self, _bridge: &Bridge, _data: &dyn Any) -> CallResult<Vec<Value>> {
        Ok(Vec::new())
    }

    /// Writes a property.
    fn set_property(
        &self,
        _bridge: &Bridge,
        _data: &dyn Any,
        _name: Value,
        _value: Value,
    ) -> CallResult<()> {
        Err(BridgeError::Callee(format!("{} does not accept property writes", self.name())).into())
    }

    /// Deletes a property.
    fn remove_property(&self, _bridge: &Bridge, _data: &dyn Any, _name: Value) -> CallResult<()> {
        Err(BridgeError::Callee(format!("{} does not allow property removal", self.name())).into())
    }

    /// Invokes a method. `method_name` is `Null` for the instance's default
    /// method, otherwise a string.
    fn call(
        &self,
        _bridge: &Bridge,
        _data: &dyn Any,
        method_name: Value,
        _args: &[Value],
    ) -> CallResult<Value> {
        let target = if method_name.is_null() {
            self.name().to_string()
        } else {
            format!("method of {}", self.name())
        };
        Err(BridgeError::NotCallable(target).into())
    }

    /// Invokes the instance as a constructor.
    fn construct(&self, _bridge: &Bridge, _data: &dyn Any, _args: &[Value]) -> CallResult<Value> {
        Err(BridgeError::NotConstructible(self.name().to_string()).into())
    }

    /// Whether the instance has a default method, consulted when the
    /// instance is stored as a property of a host object.
    fn is_callable(&self, _data: &dyn Any) -> bool {
        false
    }

    /// Called exactly once, when the instance's count reaches zero. The
    /// bridge never touches `data` afterwards.
    fn deallocate(&self, _bridge: &Bridge, _data: InstanceData) {}
}

/// Identity comparison of two classes, ignoring vtable metadata.
pub(crate) fn same_class(a: &ClassRef, b: &ClassRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

impl Bridge {
    /// Creates a foreign object implemented by `class`, with a count of 1
    /// owned by the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use std::any::Any;
    /// use std::rc::Rc;
    /// use var_bridge::{Bridge, CallResult, Class, ClassRef, Value};
    ///
    /// struct Point;
    ///
    /// impl Class for Point {
    ///     fn get_property(&self, _: &Bridge, data: &dyn Any, _: Value) -> CallResult<Value> {
    ///         Ok(Value::Int(*data.downcast_ref::<i32>().unwrap()))
    ///     }
    /// }
    ///
    /// let bridge = Bridge::new();
    /// let class: ClassRef = Rc::new(Point);
    /// let point = bridge.create_object(class.clone(), Rc::new(3i32));
    ///
    /// let data = bridge.is_instance_of(point, &class).unwrap();
    /// assert_eq!(data.downcast_ref::<i32>(), Some(&3));
    /// bridge.release(point);
    /// ```
    pub fn create_object(&self, class: ClassRef, data: InstanceData) -> Value {
        let name = class.name().to_string();
        let id = self.insert(Payload::Object(ObjectImpl::Foreign { class, data }));
        tracing::debug!(target: "var_bridge", %id, class = %name, "foreign object created");
        Value::Object(id)
    }

    /// Returns the instance data if `value` is a foreign object created
    /// with exactly this class; `None` for every other value, including
    /// host-native objects and instances of other classes.
    pub fn is_instance_of(&self, value: Value, class: &ClassRef) -> Option<InstanceData> {
        if !value.is_object() {
            return None;
        }
        match self.object_impl(value, "IsInstanceOf").ok()? {
            ObjectImpl::Foreign { class: own, data } if same_class(&own, class) => Some(data),
            _ => None,
        }
    }
}
