//! Host-native objects.
//!
//! [`HostObject`] is the seam to the scripting engine: the bridge drives
//! property and call operations on engine objects through it without
//! knowing the engine's representation. [`PlainObject`] is a small
//! engine-side object with ordered properties, hidden properties and
//! optional call and construct behaviour.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use core_types::{BridgeError, PropertyKey, Value};

use crate::bridge::Bridge;
use crate::exception::CallResult;

/// Native behaviour of a callable host object: `(bridge, this, args)`.
pub type NativeFn = Box<dyn Fn(&Bridge, Value, &[Value]) -> CallResult<Value>>;

/// Native behaviour of a constructible host object: `(bridge, args)`.
pub type NativeConstructor = Box<dyn Fn(&Bridge, &[Value]) -> CallResult<Value>>;

/// An object implemented by the scripting engine.
///
/// Reference rules: values returned by [`lookup`](HostObject::lookup) are
/// borrowed from the object. [`define`](HostObject::define) receives one
/// reference that the object keeps; any value it replaces or that
/// [`delete`](HostObject::delete) removes is handed back with its
/// reference, and the bridge releases it.
pub trait HostObject {
    /// Name used in diagnostics.
    fn class_name(&self) -> &str {
        "Object"
    }

    /// Looks up a property, hidden or not.
    fn lookup(&self, key: &PropertyKey) -> Option<Value>;

    /// Creates or replaces a property.
    fn define(&self, key: PropertyKey, value: Value) -> CallResult<Option<Value>>;

    /// Removes a property. Removing a missing property is not an error.
    fn delete(&self, key: &PropertyKey) -> CallResult<Option<Value>>;

    /// Keys of enumerable properties, in enumeration order.
    fn enumerable_keys(&self) -> Vec<PropertyKey>;

    /// Whether the object can be invoked as a function.
    fn is_callable(&self) -> bool {
        false
    }

    /// Invokes the object as a function.
    fn call(&self, _bridge: &Bridge, _this: Value, _args: &[Value]) -> CallResult<Value> {
        Err(BridgeError::NotCallable(self.class_name().to_string()).into())
    }

    /// Invokes the object as a constructor.
    fn construct(&self, _bridge: &Bridge, _args: &[Value]) -> CallResult<Value> {
        Err(BridgeError::NotConstructible(self.class_name().to_string()).into())
    }

    /// Empties the object when its count reaches zero, handing back every
    /// value it held.
    fn finalize(&self) -> Vec<Value>;
}

#[derive(Debug)]
struct Slot {
    key: PropertyKey,
    value: Value,
    enumerable: bool,
}

/// A minimal engine object.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use var_bridge::{Bridge, PlainObject, Value};
///
/// let bridge = Bridge::new();
/// let object = PlainObject::new();
/// object.insert("visible", Value::Int(1));
/// object.insert_hidden("secret", Value::Int(2));
///
/// let value = bridge.create_host_object(Rc::new(object));
/// let (count, names) = bridge.get_all_property_names(value, None);
/// assert_eq!(count, 1);
///
/// let names = names.unwrap();
/// for name in names.iter() {
///     bridge.release(*name);
/// }
/// bridge.mem_free(names);
/// bridge.release(value);
/// ```
pub struct PlainObject {
    class_name: String,
    properties: RefCell<Vec<Slot>>,
    frozen: Cell<bool>,
    call: Option<NativeFn>,
    construct: Option<NativeConstructor>,
}

impl Default for PlainObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlainObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainObject")
            .field("class_name", &self.class_name)
            .field("properties", &self.properties)
            .field("frozen", &self.frozen.get())
            .field("call", &self.call.as_ref().map(|_| "<function>"))
            .field("construct", &self.construct.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl PlainObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::named("Object")
    }

    /// Creates an empty object with a diagnostic class name.
    pub fn named(class_name: impl Into<String>) -> Self {
        PlainObject {
            class_name: class_name.into(),
            properties: RefCell::new(Vec::new()),
            frozen: Cell::new(false),
            call: None,
            construct: None,
        }
    }

    /// Creates a function object.
    pub fn function(
        name: impl Into<String>,
        f: impl Fn(&Bridge, Value, &[Value]) -> CallResult<Value> + 'static,
    ) -> Self {
        Self::named(name).with_call(f)
    }

    /// Makes the object callable.
    pub fn with_call(
        mut self,
        f: impl Fn(&Bridge, Value, &[Value]) -> CallResult<Value> + 'static,
    ) -> Self {
        self.call = Some(Box::new(f));
        self
    }

    /// Makes the object constructible.
    pub fn with_construct(
        mut self,
        f: impl Fn(&Bridge, &[Value]) -> CallResult<Value> + 'static,
    ) -> Self {
        self.construct = Some(Box::new(f));
        self
    }

    /// Adds an enumerable property, taking over one reference to `value`.
    ///
    /// Returns the replaced value, whose reference passes to the caller.
    pub fn insert(&self, key: impl Into<PropertyKey>, value: Value) -> Option<Value> {
        self.put(key.into(), value, true)
    }

    /// Adds a property that is reachable by name but not enumerated.
    pub fn insert_hidden(&self, key: impl Into<PropertyKey>, value: Value) -> Option<Value> {
        self.put(key.into(), value, false)
    }

    /// Rejects further writes and removals.
    pub fn freeze(&self) {
        self.frozen.set(true);
    }

    /// Number of properties, hidden ones included.
    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }

    fn put(&self, key: PropertyKey, value: Value, enumerable: bool) -> Option<Value> {
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|slot| slot.key == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.value, value)),
            None => {
                properties.push(Slot {
                    key,
                    value,
                    enumerable,
                });
                None
            }
        }
    }

    fn check_writable(&self, key: &PropertyKey) -> CallResult<()> {
        if self.frozen.get() {
            return Err(BridgeError::Callee(format!(
                "Cannot modify property '{}' of frozen {}",
                key, self.class_name
            ))
            .into());
        }
        Ok(())
    }
}

impl HostObject for PlainObject {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn lookup(&self, key: &PropertyKey) -> Option<Value> {
        self.properties
            .borrow()
            .iter()
            .find(|slot| &slot.key == key)
            .map(|slot| slot.value)
    }

    fn define(&self, key: PropertyKey, value: Value) -> CallResult<Option<Value>> {
        self.check_writable(&key)?;
        Ok(self.put(key, value, true))
    }

    fn delete(&self, key: &PropertyKey) -> CallResult<Option<Value>> {
        self.check_writable(key)?;
        let mut properties = self.properties.borrow_mut();
        let removed = properties
            .iter()
            .position(|slot| &slot.key == key)
            .map(|index| properties.remove(index).value);
        Ok(removed)
    }

    fn enumerable_keys(&self) -> Vec<PropertyKey> {
        self.properties
            .borrow()
            .iter()
            .filter(|slot| slot.enumerable)
            .map(|slot| slot.key.clone())
            .collect()
    }

    fn is_callable(&self) -> bool {
        self.call.is_some()
    }

    fn call(&self, bridge: &Bridge, this: Value, args: &[Value]) -> CallResult<Value> {
        match &self.call {
            Some(f) => f(bridge, this, args),
            None => Err(BridgeError::NotCallable(self.class_name.clone()).into()),
        }
    }

    fn construct(&self, bridge: &Bridge, args: &[Value]) -> CallResult<Value> {
        match &self.construct {
            Some(f) => f(bridge, args),
            None => Err(BridgeError::NotConstructible(self.class_name.clone()).into()),
        }
    }

    fn finalize(&self) -> Vec<Value> {
        self.properties
            .borrow_mut()
            .drain(..)
            .map(|slot| slot.value)
            .collect()
    }
}

impl Bridge {
    /// Creates an empty host-native object.
    pub fn new_object(&self) -> Value {
        self.create_host_object(Rc::new(PlainObject::new()))
    }

    /// Creates a host-native function object.
    pub fn new_function(
        &self,
        name: &str,
        f: impl Fn(&Bridge, Value, &[Value]) -> CallResult<Value> + 'static,
    ) -> Value {
        self.create_host_object(Rc::new(PlainObject::function(name, f)))
    }
}
