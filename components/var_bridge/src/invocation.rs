//! Invocation bridge.
//!
//! `Call` with a `Null` method name invokes the object's own default
//! method. `Call` with a string resolves that property and invokes it with
//! the object as receiver. These are different operations even when the
//! two happen to behave alike. Integer method names are rejected.

use core_types::{BridgeError, Value};

use crate::bridge::Bridge;
use crate::exception::{report, CallResult, ExceptionSlot};
use crate::object::ObjectImpl;

impl Bridge {
    /// Invokes `method_name` on `object`, or `object` itself when
    /// `method_name` is `Null`.
    ///
    /// Arguments are borrowed. The result carries a reference owned by the
    /// caller. On failure returns `Undefined` and sets the exception; an
    /// exception raised by the callee is forwarded unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use var_bridge::{Bridge, Value};
    ///
    /// let bridge = Bridge::new();
    /// let add = bridge.new_function("add", |_, _, args| {
    ///     let sum = args.iter().filter_map(|v| v.as_int()).sum();
    ///     Ok(Value::Int(sum))
    /// });
    ///
    /// let result = bridge.call(add, Value::Null, &[Value::Int(2), Value::Int(3)], None);
    /// assert_eq!(result, Value::Int(5));
    /// bridge.release(add);
    /// ```
    pub fn call(
        &self,
        object: Value,
        method_name: Value,
        args: &[Value],
        exception: ExceptionSlot<'_>,
    ) -> Value {
        let result = self.try_call(object, method_name, args);
        report(self, "Call", result, exception, Value::Undefined)
    }

    /// Invokes `object` as a constructor, like `new object(...args)`.
    pub fn construct(&self, object: Value, args: &[Value], exception: ExceptionSlot<'_>) -> Value {
        let result = self.try_construct(object, args);
        report(self, "Construct", result, exception, Value::Undefined)
    }

    fn try_call(&self, object: Value, method_name: Value, args: &[Value]) -> CallResult<Value> {
        let target = self.object_impl(object, "Call")?;
        if !matches!(method_name, Value::Null | Value::String(_)) {
            return Err(BridgeError::InvalidArgumentKind {
                what: "method name",
                expected: "string or null",
                got: method_name.kind(),
            }
            .into());
        }
        tracing::trace!(
            target: "var_bridge",
            %object,
            %method_name,
            callee = %target.describe(),
            argc = args.len(),
            "Call"
        );

        match target {
            ObjectImpl::Foreign { class, data } => class.call(self, &*data, method_name, args),
            ObjectImpl::Host(host) if method_name.is_null() => host.call(self, object, args),
            ObjectImpl::Host(host) => {
                let key = self.property_key(method_name)?;
                let method = host
                    .lookup(&key)
                    .ok_or_else(|| BridgeError::PropertyNotFound(key.to_string()))?;
                let function = match method {
                    Value::Object(_) => self.object_impl(method, "Call")?,
                    _ => return Err(BridgeError::NotCallable(format!("'{}'", key)).into()),
                };
                // the receiver may drop its only reference to the method
                // while it runs
                self.add_ref(method);
                let result = invoke(self, &function, object, args);
                self.release(method);
                result
            }
        }
    }

    fn try_construct(&self, object: Value, args: &[Value]) -> CallResult<Value> {
        let target = self.object_impl(object, "Construct")?;
        tracing::trace!(target: "var_bridge", %object, callee = %target.describe(), argc = args.len(), "Construct");
        match target {
            ObjectImpl::Host(host) => host.construct(self, args),
            ObjectImpl::Foreign { class, data } => class.construct(self, &*data, args),
        }
    }
}

/// Runs a resolved method's default behaviour with `this` as receiver.
fn invoke(bridge: &Bridge, function: &ObjectImpl, this: Value, args: &[Value]) -> CallResult<Value> {
    match function {
        ObjectImpl::Host(host) => host.call(bridge, this, args),
        ObjectImpl::Foreign { class, data } => class.call(bridge, &**data, Value::Null, args),
    }
}
