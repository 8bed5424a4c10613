//! The `PPB_Var;1` function table.
//!
//! Native components that only see a table of entry points look it up by
//! name with [`get_interface`]. Each entry forwards to the [`Bridge`]
//! installed for the calling thread with [`install`]. With no bridge
//! installed every entry returns its neutral value and leaves the
//! exception slot untouched.

use std::cell::RefCell;
use std::rc::Rc;

use core_types::Value;
use memory_manager::VarArray;

use crate::bridge::Bridge;
use crate::class::{ClassRef, InstanceData};

/// Interface name under which [`VAR_INTERFACE`] is published.
pub const PPB_VAR_INTERFACE: &str = "PPB_Var;1";

/// Synchronous function table over the value bridge.
///
/// Argument arrays are slices, so an empty argument list needs no pointer.
/// String bytes come back as a shared slice whose length is the string
/// length.
#[derive(Clone, Copy)]
pub struct VarInterface {
    /// See [`Bridge::add_ref`]
    pub add_ref: fn(Value),
    /// See [`Bridge::release`]
    pub release: fn(Value),
    /// See [`Bridge::var_from_utf8`]
    pub var_from_utf8: fn(&[u8]) -> Value,
    /// See [`Bridge::var_to_utf8`]
    pub var_to_utf8: fn(Value) -> Option<Rc<[u8]>>,
    /// See [`Bridge::has_property`]
    pub has_property: fn(Value, Value, Option<&mut Value>) -> bool,
    /// See [`Bridge::has_method`]
    pub has_method: fn(Value, Value, Option<&mut Value>) -> bool,
    /// See [`Bridge::get_property`]
    pub get_property: fn(Value, Value, Option<&mut Value>) -> Value,
    /// See [`Bridge::get_all_property_names`]
    pub get_all_property_names: fn(Value, Option<&mut Value>) -> (u32, Option<VarArray>),
    /// See [`Bridge::set_property`]
    pub set_property: fn(Value, Value, Value, Option<&mut Value>),
    /// See [`Bridge::remove_property`]
    pub remove_property: fn(Value, Value, Option<&mut Value>),
    /// See [`Bridge::call`]
    pub call: fn(Value, Value, &[Value], Option<&mut Value>) -> Value,
    /// See [`Bridge::construct`]
    pub construct: fn(Value, &[Value], Option<&mut Value>) -> Value,
    /// See [`Bridge::is_instance_of`]
    pub is_instance_of: fn(Value, &ClassRef) -> Option<InstanceData>,
    /// See [`Bridge::create_object`]
    pub create_object: fn(ClassRef, InstanceData) -> Value,
}

impl std::fmt::Debug for VarInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarInterface").finish_non_exhaustive()
    }
}

/// The table returned for [`PPB_VAR_INTERFACE`].
pub static VAR_INTERFACE: VarInterface = VarInterface {
    add_ref: |var| with_bridge((), |b| b.add_ref(var)),
    release: |var| with_bridge((), |b| b.release(var)),
    var_from_utf8: |data| with_bridge(Value::Undefined, |b| b.var_from_utf8(data)),
    var_to_utf8: |var| with_bridge(None, |b| b.var_to_utf8(var)),
    has_property: |object, name, exception| {
        with_bridge(false, |b| b.has_property(object, name, exception))
    },
    has_method: |object, name, exception| {
        with_bridge(false, |b| b.has_method(object, name, exception))
    },
    get_property: |object, name, exception| {
        with_bridge(Value::Undefined, |b| b.get_property(object, name, exception))
    },
    get_all_property_names: |object, exception| {
        with_bridge((0, None), |b| b.get_all_property_names(object, exception))
    },
    set_property: |object, name, value, exception| {
        with_bridge((), |b| b.set_property(object, name, value, exception))
    },
    remove_property: |object, name, exception| {
        with_bridge((), |b| b.remove_property(object, name, exception))
    },
    call: |object, method_name, args, exception| {
        with_bridge(Value::Undefined, |b| b.call(object, method_name, args, exception))
    },
    construct: |object, args, exception| {
        with_bridge(Value::Undefined, |b| b.construct(object, args, exception))
    },
    is_instance_of: |var, class| with_bridge(None, |b| b.is_instance_of(var, class)),
    create_object: |class, data| with_bridge(Value::Undefined, |b| b.create_object(class, data)),
};

thread_local! {
    static CURRENT: RefCell<Option<Rc<Bridge>>> = const { RefCell::new(None) };
}

/// Looks up a function table by interface name.
///
/// # Example
///
/// ```
/// use var_bridge::interface::{get_interface, PPB_VAR_INTERFACE};
///
/// assert!(get_interface(PPB_VAR_INTERFACE).is_some());
/// assert!(get_interface("PPB_Var;0").is_none());
/// ```
pub fn get_interface(name: &str) -> Option<&'static VarInterface> {
    (name == PPB_VAR_INTERFACE).then_some(&VAR_INTERFACE)
}

/// Makes `bridge` the target of the function table on this thread,
/// returning the previously installed bridge.
pub fn install(bridge: Rc<Bridge>) -> Option<Rc<Bridge>> {
    CURRENT.with(|current| current.borrow_mut().replace(bridge))
}

/// Removes the bridge installed on this thread.
pub fn uninstall() -> Option<Rc<Bridge>> {
    CURRENT.with(|current| current.borrow_mut().take())
}

/// The bridge installed on this thread, if any.
pub fn current() -> Option<Rc<Bridge>> {
    CURRENT.with(|current| current.borrow().clone())
}

fn with_bridge<R>(neutral: R, f: impl FnOnce(&Bridge) -> R) -> R {
    // cloned out so that callbacks may install or uninstall
    match current() {
        Some(bridge) => f(&bridge),
        None => {
            tracing::warn!(target: "var_bridge", "no bridge installed on this thread");
            neutral
        }
    }
}
