//! Unit tests for the value bridge

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use var_bridge::{
    Bridge, BridgeConfig, BridgeError, CallResult, Class, ClassRef, PlainObject, Raised, Value,
};

// ============================================================================
// Test class
// ============================================================================

/// A foreign class with a default method that differs from its `f` method,
/// one hidden property slot, and a destructor counter.
struct Widget {
    destroyed: Rc<Cell<u32>>,
}

#[derive(Default)]
struct WidgetData {
    // (name, value, enumerable)
    props: RefCell<Vec<(String, Value, bool)>>,
}

impl WidgetData {
    fn with_hidden(name: &str, value: Value) -> Self {
        let data = WidgetData::default();
        data.props.borrow_mut().push((name.to_string(), value, false));
        data
    }
}

fn widget_data(data: &dyn Any) -> &WidgetData {
    data.downcast_ref::<WidgetData>().expect("widget instance data")
}

fn name_text(bridge: &Bridge, name: Value) -> String {
    match name {
        Value::Int(n) => n.to_string(),
        other => bridge.string_lossy(other).unwrap_or_default(),
    }
}

fn new_widget_class() -> (ClassRef, Rc<Cell<u32>>) {
    let destroyed = Rc::new(Cell::new(0));
    let class: ClassRef = Rc::new(Widget {
        destroyed: destroyed.clone(),
    });
    (class, destroyed)
}

impl Class for Widget {
    fn name(&self) -> &str {
        "Widget"
    }

    fn has_property(&self, bridge: &Bridge, data: &dyn Any, name: Value) -> CallResult<bool> {
        let key = name_text(bridge, name);
        Ok(key == "f" || widget_data(data).props.borrow().iter().any(|p| p.0 == key))
    }

    fn has_method(&self, bridge: &Bridge, _data: &dyn Any, name: Value) -> CallResult<bool> {
        Ok(name_text(bridge, name) == "f")
    }

    fn get_property(&self, bridge: &Bridge, data: &dyn Any, name: Value) -> CallResult<Value> {
        let key = name_text(bridge, name);
        let props = widget_data(data).props.borrow();
        match props.iter().find(|p| p.0 == key) {
            Some((_, value, _)) => {
                bridge.add_ref(*value);
                Ok(*value)
            }
            None => Err(BridgeError::PropertyNotFound(key).into()),
        }
    }

    fn get_all_property_names(&self, bridge: &Bridge, data: &dyn Any) -> CallResult<Vec<Value>> {
        let props = widget_data(data).props.borrow();
        Ok(props
            .iter()
            .filter(|p| p.2)
            .map(|p| bridge.var_from_utf8(p.0.as_bytes()))
            .collect())
    }

    fn set_property(
        &self,
        bridge: &Bridge,
        data: &dyn Any,
        name: Value,
        value: Value,
    ) -> CallResult<()> {
        let key = name_text(bridge, name);
        bridge.add_ref(value);
        let old = {
            let mut props = widget_data(data).props.borrow_mut();
            match props.iter_mut().find(|p| p.0 == key) {
                Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
                None => {
                    props.push((key, value, true));
                    None
                }
            }
        };
        if let Some(old) = old {
            bridge.release(old);
        }
        Ok(())
    }

    fn remove_property(&self, bridge: &Bridge, data: &dyn Any, name: Value) -> CallResult<()> {
        let key = name_text(bridge, name);
        let removed = {
            let mut props = widget_data(data).props.borrow_mut();
            let index = props.iter().position(|p| p.0 == key);
            index.map(|i| props.remove(i).1)
        };
        if let Some(value) = removed {
            bridge.release(value);
        }
        Ok(())
    }

    fn call(
        &self,
        bridge: &Bridge,
        _data: &dyn Any,
        method_name: Value,
        args: &[Value],
    ) -> CallResult<Value> {
        if method_name.is_null() {
            return Ok(bridge.var_from_utf8(b"self"));
        }
        match name_text(bridge, method_name).as_str() {
            "f" => Ok(bridge.var_from_utf8(b"f")),
            "argc" => Ok(Value::Int(args.len() as i32)),
            "fail" => Err(Raised::Value(bridge.var_from_utf8(b"widget failure"))),
            other => Err(BridgeError::NotCallable(format!("'{}'", other)).into()),
        }
    }

    fn construct(&self, bridge: &Bridge, _data: &dyn Any, args: &[Value]) -> CallResult<Value> {
        let object = PlainObject::named("WidgetInstance");
        object.insert("argc", Value::Int(args.len() as i32));
        Ok(bridge.create_host_object(Rc::new(object)))
    }

    fn is_callable(&self, _data: &dyn Any) -> bool {
        true
    }

    fn deallocate(&self, bridge: &Bridge, data: var_bridge::InstanceData) {
        self.destroyed.set(self.destroyed.get() + 1);
        if let Some(widget) = data.downcast_ref::<WidgetData>() {
            for (_, value, _) in widget.props.borrow_mut().drain(..) {
                bridge.release(value);
            }
        }
    }
}

/// A class implementing only the required callback.
struct Opaque;

impl Class for Opaque {
    fn get_property(&self, _bridge: &Bridge, _data: &dyn Any, _name: Value) -> CallResult<Value> {
        Ok(Value::Null)
    }
}

fn release_all(bridge: &Bridge, values: &[Value]) {
    for value in values {
        bridge.release(*value);
    }
}

// ============================================================================
// Value model
// ============================================================================

#[test]
fn test_empty_string_is_not_absent() {
    let bridge = Bridge::new();
    let empty = bridge.var_from_utf8(&[]);
    assert!(empty.is_string());
    let bytes = bridge.var_to_utf8(empty);
    assert!(bytes.is_some());
    assert_eq!(bytes.unwrap().len(), 0);
    bridge.release(empty);
}

#[test]
fn test_add_ref_release_noop_for_primitives() {
    let bridge = Bridge::new();
    for value in [
        Value::Undefined,
        Value::Null,
        Value::Bool(true),
        Value::Int(1),
        Value::Double(2.0),
    ] {
        bridge.add_ref(value);
        bridge.release(value);
        bridge.release(value);
        assert_eq!(bridge.ref_count(value), None);
    }
    assert_eq!(bridge.ledger_stats().dead_handle_uses, 0);
}

#[test]
fn test_release_after_destroy_is_detected() {
    let bridge = Bridge::new();
    let s = bridge.var_from_utf8(b"x");
    bridge.release(s);
    bridge.release(s);
    assert_eq!(bridge.ledger_stats().dead_handle_uses, 1);
    assert_eq!(bridge.ledger_stats().destroyed, 1);
}

proptest! {
    #[test]
    fn prop_string_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let bridge = Bridge::new();
        let value = bridge.var_from_utf8(&bytes);
        let read = bridge.var_to_utf8(value);
        prop_assert!(read.is_some());
        let read = read.unwrap();
        prop_assert_eq!(read.len(), bytes.len());
        prop_assert_eq!(&read[..], &bytes[..]);
        bridge.release(value);
        prop_assert_eq!(bridge.live_vars(), 0);
    }

    #[test]
    fn prop_balanced_refs_keep_count(n in 0usize..50) {
        let bridge = Bridge::new();
        let (class, destroyed) = new_widget_class();
        let object = bridge.create_object(class, Rc::new(WidgetData::default()));
        for _ in 0..n {
            bridge.add_ref(object);
        }
        for _ in 0..n {
            bridge.release(object);
        }
        prop_assert_eq!(bridge.ref_count(object), Some(1));
        prop_assert_eq!(destroyed.get(), 0);
        bridge.release(object);
        prop_assert_eq!(destroyed.get(), 1);
    }
}

// ============================================================================
// Object factory
// ============================================================================

#[test]
fn test_destructor_fires_once_on_last_release() {
    let bridge = Bridge::new();
    let (class, destroyed) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    assert_eq!(bridge.ref_count(object), Some(1));

    bridge.add_ref(object);
    bridge.release(object);
    assert_eq!(destroyed.get(), 0);

    bridge.release(object);
    assert_eq!(destroyed.get(), 1);

    bridge.release(object);
    assert_eq!(destroyed.get(), 1);
}

#[test]
fn test_is_instance_of_identity() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let (other_class, _) = new_widget_class();
    let data: Rc<dyn Any> = Rc::new(WidgetData::default());
    let object = bridge.create_object(class.clone(), data.clone());

    let found = bridge.is_instance_of(object, &class).expect("instance of its class");
    assert!(std::ptr::eq(
        Rc::as_ptr(&found) as *const (),
        Rc::as_ptr(&data) as *const ()
    ));

    // same type, different class identity
    assert!(bridge.is_instance_of(object, &other_class).is_none());

    let s = bridge.var_from_utf8(b"widget");
    assert!(bridge.is_instance_of(Value::Bool(true), &class).is_none());
    assert!(bridge.is_instance_of(s, &class).is_none());

    let host = bridge.new_object();
    assert!(bridge.is_instance_of(host, &class).is_none());

    release_all(&bridge, &[s, host, object]);
}

#[test]
fn test_is_instance_of_dead_object() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class.clone(), Rc::new(WidgetData::default()));
    bridge.release(object);
    assert!(bridge.is_instance_of(object, &class).is_none());
}

#[test]
fn test_deallocate_releases_held_values() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let name = bridge.var_from_utf8(b"label");
    let label = bridge.var_from_utf8(b"text");

    bridge.set_property(object, name, label, None);
    release_all(&bridge, &[label, name, object]);
    assert_eq!(bridge.live_vars(), 0);
    assert_eq!(bridge.heap_stats().live_bytes, 0);
}

// ============================================================================
// Property bridge on foreign objects
// ============================================================================

#[test]
fn test_foreign_set_get_remove() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let x = bridge.var_from_utf8(b"x");

    bridge.set_property(object, x, Value::Int(5), None);
    assert_eq!(bridge.get_property(object, x, None), Value::Int(5));

    bridge.remove_property(object, x, None);
    assert!(!bridge.has_property(object, x, None));

    release_all(&bridge, &[x, object]);
}

#[test]
fn test_foreign_missing_property_sets_exception() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let missing = bridge.var_from_utf8(b"missing");

    let mut exception = Value::Undefined;
    assert_eq!(
        bridge.get_property(object, missing, Some(&mut exception)),
        Value::Undefined
    );
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("ReferenceError: property 'missing' is not defined")
    );

    release_all(&bridge, &[exception, missing, object]);
}

#[test]
fn test_name_kind_enforced_before_delegation() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));

    let mut exception = Value::Undefined;
    assert_eq!(
        bridge.get_property(object, Value::Double(1.5), Some(&mut exception)),
        Value::Undefined
    );
    assert!(exception.is_string());
    bridge.release(exception);

    for name in [Value::Null, Value::Undefined, Value::Bool(false), object] {
        let mut exception = Value::Undefined;
        assert!(!bridge.has_property(object, name, Some(&mut exception)));
        assert!(exception.is_string(), "{:?} should be rejected", name);
        bridge.release(exception);

        let mut exception = Value::Undefined;
        bridge.set_property(object, name, Value::Int(1), Some(&mut exception));
        assert!(exception.is_string());
        bridge.release(exception);

        let mut exception = Value::Undefined;
        bridge.remove_property(object, name, Some(&mut exception));
        assert!(exception.is_string());
        bridge.release(exception);
    }

    bridge.release(object);
    assert_eq!(bridge.live_vars(), 0);
}

#[test]
fn test_foreign_has_method() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let f = bridge.var_from_utf8(b"f");
    let x = bridge.var_from_utf8(b"x");
    bridge.set_property(object, x, Value::Int(1), None);

    assert!(bridge.has_method(object, f, None));
    assert!(bridge.has_property(object, x, None));
    assert!(!bridge.has_method(object, x, None));

    release_all(&bridge, &[f, x, object]);
}

#[test]
fn test_enumeration_excludes_hidden() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(
        class,
        Rc::new(WidgetData::with_hidden("hidden", Value::Int(7))),
    );
    let visible = bridge.var_from_utf8(b"visible");
    let hidden = bridge.var_from_utf8(b"hidden");
    bridge.set_property(object, visible, Value::Int(1), None);

    let (count, names) = bridge.get_all_property_names(object, None);
    assert_eq!(count, 1);
    let names = names.expect("array on success");
    assert_eq!(bridge.string_lossy(names[0]).as_deref(), Some("visible"));

    assert!(bridge.has_property(object, hidden, None));
    assert_eq!(bridge.get_property(object, hidden, None), Value::Int(7));

    release_all(&bridge, &names);
    bridge.mem_free(names);
    release_all(&bridge, &[visible, hidden, object]);
    assert_eq!(bridge.live_vars(), 0);
    assert_eq!(bridge.heap_stats().live_arrays, 0);
}

#[test]
fn test_zero_properties_yield_empty_array() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let foreign = bridge.create_object(class, Rc::new(WidgetData::default()));
    let host = bridge.new_object();

    for object in [foreign, host] {
        let mut exception = Value::Undefined;
        let (count, names) = bridge.get_all_property_names(object, Some(&mut exception));
        assert_eq!(count, 0);
        assert_eq!(exception, Value::Undefined);
        let names = names.expect("empty success still returns an array");
        assert!(names.is_empty());
        bridge.mem_free(names);
    }

    release_all(&bridge, &[foreign, host]);
}

#[test]
fn test_enumeration_failure_returns_no_array() {
    let bridge = Bridge::new();
    let mut exception = Value::Undefined;
    let (count, names) = bridge.get_all_property_names(Value::Int(4), Some(&mut exception));
    assert_eq!(count, 0);
    assert!(names.is_none());
    assert!(exception.is_string());
    bridge.release(exception);
}

#[test]
fn test_enumeration_over_budget_releases_names() {
    let bridge = Bridge::with_config(BridgeConfig::default().with_heap_budget(40));
    let object = bridge.new_object();
    for i in 0..3 {
        let name = bridge.var_from_utf8(format!("p{}", i).as_bytes());
        bridge.set_property(object, name, Value::Int(i), None);
        bridge.release(name);
    }
    let before = bridge.live_vars();

    // three names fit, the array of three values does not
    let mut exception = Value::Undefined;
    let (count, names) = bridge.get_all_property_names(object, Some(&mut exception));
    assert_eq!(count, 0);
    assert!(names.is_none());
    assert!(bridge
        .string_lossy(exception)
        .unwrap()
        .starts_with("RangeError: cannot allocate"));

    bridge.release(exception);
    assert_eq!(bridge.live_vars(), before);
    bridge.release(object);
}

#[test]
fn test_default_class_callbacks() {
    let bridge = Bridge::new();
    let class: ClassRef = Rc::new(Opaque);
    let object = bridge.create_object(class, Rc::new(()));

    assert!(!bridge.has_property(object, Value::Int(0), None));
    assert!(!bridge.has_method(object, Value::Int(0), None));
    assert_eq!(bridge.get_property(object, Value::Int(0), None), Value::Null);

    let mut exception = Value::Undefined;
    bridge.set_property(object, Value::Int(0), Value::Int(1), Some(&mut exception));
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("Error: object does not accept property writes")
    );
    bridge.release(exception);

    let mut exception = Value::Undefined;
    assert_eq!(
        bridge.call(object, Value::Null, &[], Some(&mut exception)),
        Value::Undefined
    );
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("TypeError: object is not a function")
    );
    bridge.release(exception);

    let mut exception = Value::Undefined;
    bridge.construct(object, &[], Some(&mut exception));
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("TypeError: object is not a constructor")
    );
    bridge.release(exception);

    bridge.release(object);
}

// ============================================================================
// Invocation bridge on foreign objects
// ============================================================================

#[test]
fn test_default_method_differs_from_named_method() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let f = bridge.var_from_utf8(b"f");

    let from_self = bridge.call(object, Value::Null, &[], None);
    let from_f = bridge.call(object, f, &[], None);
    assert_eq!(bridge.string_lossy(from_self).as_deref(), Some("self"));
    assert_eq!(bridge.string_lossy(from_f).as_deref(), Some("f"));

    release_all(&bridge, &[from_self, from_f, f, object]);
    assert_eq!(bridge.live_vars(), 0);
}

#[test]
fn test_foreign_call_passes_arguments() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let argc = bridge.var_from_utf8(b"argc");

    assert_eq!(bridge.call(object, argc, &[], None), Value::Int(0));
    assert_eq!(
        bridge.call(object, argc, &[Value::Null, Value::Int(1), Value::Bool(true)], None),
        Value::Int(3)
    );

    release_all(&bridge, &[argc, object]);
}

#[test]
fn test_foreign_callee_exception_forwarded() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class, Rc::new(WidgetData::default()));
    let fail = bridge.var_from_utf8(b"fail");

    let mut exception = Value::Undefined;
    assert_eq!(
        bridge.call(object, fail, &[], Some(&mut exception)),
        Value::Undefined
    );
    assert_eq!(bridge.string_lossy(exception).as_deref(), Some("widget failure"));
    bridge.release(exception);

    // without a slot the raised value is released
    bridge.call(object, fail, &[], None);

    release_all(&bridge, &[fail, object]);
    assert_eq!(bridge.live_vars(), 0);
}

#[test]
fn test_foreign_construct() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let object = bridge.create_object(class.clone(), Rc::new(WidgetData::default()));
    let argc = bridge.var_from_utf8(b"argc");

    let instance = bridge.construct(object, &[Value::Int(1), Value::Int(2)], None);
    assert!(instance.is_object());
    assert!(bridge.is_instance_of(instance, &class).is_none());
    assert_eq!(bridge.get_property(instance, argc, None), Value::Int(2));

    release_all(&bridge, &[instance, argc, object]);
    assert_eq!(bridge.live_vars(), 0);
}

#[test]
fn test_host_method_backed_by_foreign_object() {
    let bridge = Bridge::new();
    let (class, _) = new_widget_class();
    let widget = bridge.create_object(class, Rc::new(WidgetData::default()));
    let host = bridge.new_object();
    let name = bridge.var_from_utf8(b"run");

    bridge.set_property(host, name, widget, None);
    assert!(bridge.has_method(host, name, None));

    // a foreign method is invoked through its default method
    let result = bridge.call(host, name, &[], None);
    assert_eq!(bridge.string_lossy(result).as_deref(), Some("self"));

    release_all(&bridge, &[result, name, widget, host]);
    assert_eq!(bridge.live_vars(), 0);
}

// ============================================================================
// Property names
// ============================================================================

#[test]
fn test_non_utf8_names_rejected() {
    let bridge = Bridge::new();
    let object = bridge.new_object();
    let ff = bridge.var_from_utf8(b"\xff");
    let fe = bridge.var_from_utf8(b"\xfe");

    let mut exception = Value::Undefined;
    bridge.set_property(object, ff, Value::Int(1), Some(&mut exception));
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("TypeError: property name must be valid UTF-8, got string")
    );
    bridge.release(exception);

    let mut exception = Value::Undefined;
    assert!(!bridge.has_property(object, fe, Some(&mut exception)));
    assert!(exception.is_string());
    bridge.release(exception);

    let (count, names) = bridge.get_all_property_names(object, None);
    assert_eq!(count, 0);
    bridge.mem_free(names.expect("empty array"));

    release_all(&bridge, &[fe, ff, object]);
    assert_eq!(bridge.live_vars(), 0);
}

#[test]
fn test_enumerated_names_keep_exact_bytes() {
    let bridge = Bridge::new();
    let object = bridge.new_object();
    let bytes = "grüße".as_bytes();
    let name = bridge.var_from_utf8(bytes);
    bridge.set_property(object, name, Value::Int(1), None);

    let (count, names) = bridge.get_all_property_names(object, None);
    assert_eq!(count, 1);
    let names = names.expect("names");
    assert_eq!(bridge.var_to_utf8(names[0]).as_deref(), Some(bytes));

    release_all(&bridge, &names);
    bridge.mem_free(names);
    release_all(&bridge, &[name, object]);
}

#[test]
fn test_integer_and_integer_string_name_same_property() {
    let bridge = Bridge::new();
    let object = bridge.new_object();
    let zero = bridge.var_from_utf8(b"0");
    let minus_one = bridge.var_from_utf8(b"-1");
    let padded = bridge.var_from_utf8(b"01");

    bridge.set_property(object, Value::Int(0), Value::Int(7), None);
    assert_eq!(bridge.get_property(object, zero, None), Value::Int(7));

    bridge.set_property(object, minus_one, Value::Bool(true), None);
    assert!(bridge.has_property(object, Value::Int(-1), None));

    assert!(!bridge.has_property(object, padded, None));
    bridge.set_property(object, padded, Value::Null, None);
    assert_eq!(bridge.get_property(object, Value::Int(1), None), Value::Undefined);

    let (count, names) = bridge.get_all_property_names(object, None);
    assert_eq!(count, 3);
    let names = names.expect("names");
    assert_eq!(names[0], Value::Int(0));
    assert_eq!(names[1], Value::Int(-1));
    assert_eq!(bridge.string_lossy(names[2]).as_deref(), Some("01"));

    release_all(&bridge, &names);
    bridge.mem_free(names);
    release_all(&bridge, &[zero, minus_one, padded, object]);
    assert_eq!(bridge.live_vars(), 0);
}

/// A class that enumerates a name of the wrong kind after a valid one.
struct BadNames;

impl Class for BadNames {
    fn get_property(&self, _bridge: &Bridge, _data: &dyn Any, _name: Value) -> CallResult<Value> {
        Ok(Value::Undefined)
    }

    fn get_all_property_names(&self, bridge: &Bridge, _data: &dyn Any) -> CallResult<Vec<Value>> {
        Ok(vec![bridge.var_from_utf8(b"ok"), Value::Bool(true)])
    }
}

#[test]
fn test_foreign_enumeration_checks_name_kinds() {
    let bridge = Bridge::new();
    let class: ClassRef = Rc::new(BadNames);
    let object = bridge.create_object(class, Rc::new(()));

    let mut exception = Value::Undefined;
    let (count, names) = bridge.get_all_property_names(object, Some(&mut exception));
    assert_eq!(count, 0);
    assert!(names.is_none());
    assert_eq!(
        bridge.string_lossy(exception).as_deref(),
        Some("TypeError: enumerated property name must be string or int, got bool")
    );
    bridge.release(exception);

    // the valid name produced before the bad one was released
    assert_eq!(bridge.live_vars(), 1);
    assert_eq!(bridge.heap_stats().live_arrays, 0);
    bridge.release(object);
    assert_eq!(bridge.live_vars(), 0);
}
