//! Property bridge.
//!
//! Uniform has/get/set/remove/enumerate over host-native and foreign
//! objects. Names must be strings or integers; any other kind is reported
//! through the exception slot.

use core_types::{BridgeError, PropertyKey, Value};
use memory_manager::VarArray;

use crate::bridge::Bridge;
use crate::exception::{report, CallResult, ExceptionSlot, Raised};
use crate::object::ObjectImpl;

impl Bridge {
    /// Whether `object` has the property `name`. Methods count as
    /// properties.
    ///
    /// Returns `false` and sets the exception if `object` is not an object
    /// or `name` is neither a string nor an integer.
    pub fn has_property(&self, object: Value, name: Value, exception: ExceptionSlot<'_>) -> bool {
        let result = self.try_has_property(object, name);
        report(self, "HasProperty", result, exception, false)
    }

    /// Like [`has_property`](Bridge::has_property), but the property must
    /// also be callable.
    pub fn has_method(&self, object: Value, name: Value, exception: ExceptionSlot<'_>) -> bool {
        let result = self.try_has_method(object, name);
        report(self, "HasMethod", result, exception, false)
    }

    /// Reads the property `name` of `object`. The returned value carries a
    /// reference owned by the caller.
    ///
    /// A missing property, like an invalid object or name, returns
    /// `Undefined` and sets the exception.
    pub fn get_property(&self, object: Value, name: Value, exception: ExceptionSlot<'_>) -> Value {
        let result = self.try_get_property(object, name);
        report(self, "GetProperty", result, exception, Value::Undefined)
    }

    /// Writes `value` to the property `name` of `object`.
    ///
    /// `value` is borrowed; the object keeps its own reference. On failure
    /// the object is left unchanged.
    pub fn set_property(
        &self,
        object: Value,
        name: Value,
        value: Value,
        exception: ExceptionSlot<'_>,
    ) {
        let result = self.try_set_property(object, name, value);
        report(self, "SetProperty", result, exception, ())
    }

    /// Removes the property `name` from `object`.
    pub fn remove_property(&self, object: Value, name: Value, exception: ExceptionSlot<'_>) {
        let result = self.try_remove_property(object, name);
        report(self, "RemoveProperty", result, exception, ())
    }

    /// Returns the enumerable property names of `object`.
    ///
    /// Hidden properties are left out even though they remain reachable
    /// through the other operations. Each name in the array is owned by the
    /// caller and must be released; the array itself must be handed back
    /// with [`mem_free`](Bridge::mem_free).
    ///
    /// On success the array is always present, zero-length when there is
    /// nothing to enumerate. On failure the result is `(0, None)` and the
    /// exception is set.
    pub fn get_all_property_names(
        &self,
        object: Value,
        exception: ExceptionSlot<'_>,
    ) -> (u32, Option<VarArray>) {
        let result = self
            .try_get_all_property_names(object)
            .map(|(count, names)| (count, Some(names)));
        report(self, "GetAllPropertyNames", result, exception, (0, None))
    }

    fn check_name(&self, name: Value) -> CallResult<PropertyKey> {
        Ok(self.property_key(name)?)
    }

    fn try_has_property(&self, object: Value, name: Value) -> CallResult<bool> {
        let target = self.object_impl(object, "HasProperty")?;
        let key = self.check_name(name)?;
        tracing::trace!(target: "var_bridge", %object, %key, "HasProperty");
        match target {
            ObjectImpl::Host(host) => Ok(host.lookup(&key).is_some()),
            ObjectImpl::Foreign { class, data } => class.has_property(self, &*data, name),
        }
    }

    fn try_has_method(&self, object: Value, name: Value) -> CallResult<bool> {
        let target = self.object_impl(object, "HasMethod")?;
        let key = self.check_name(name)?;
        tracing::trace!(target: "var_bridge", %object, %key, "HasMethod");
        match target {
            ObjectImpl::Host(host) => Ok(match host.lookup(&key) {
                Some(property) => self.is_callable(property),
                None => false,
            }),
            ObjectImpl::Foreign { class, data } => class.has_method(self, &*data, name),
        }
    }

    fn try_get_property(&self, object: Value, name: Value) -> CallResult<Value> {
        let target = self.object_impl(object, "GetProperty")?;
        let key = self.check_name(name)?;
        tracing::trace!(target: "var_bridge", %object, %key, "GetProperty");
        match target {
            ObjectImpl::Host(host) => match host.lookup(&key) {
                Some(value) => {
                    self.add_ref(value);
                    Ok(value)
                }
                None => Err(BridgeError::PropertyNotFound(key.to_string()).into()),
            },
            ObjectImpl::Foreign { class, data } => class.get_property(self, &*data, name),
        }
    }

    fn try_set_property(&self, object: Value, name: Value, value: Value) -> CallResult<()> {
        let target = self.object_impl(object, "SetProperty")?;
        let key = self.check_name(name)?;
        tracing::trace!(target: "var_bridge", %object, %key, "SetProperty");
        match target {
            ObjectImpl::Host(host) => {
                self.add_ref(value);
                match host.define(key, value) {
                    Ok(replaced) => {
                        if let Some(old) = replaced {
                            self.release(old);
                        }
                        Ok(())
                    }
                    Err(raised) => {
                        self.release(value);
                        Err(raised)
                    }
                }
            }
            ObjectImpl::Foreign { class, data } => class.set_property(self, &*data, name, value),
        }
    }

    fn try_remove_property(&self, object: Value, name: Value) -> CallResult<()> {
        let target = self.object_impl(object, "RemoveProperty")?;
        let key = self.check_name(name)?;
        tracing::trace!(target: "var_bridge", %object, %key, "RemoveProperty");
        match target {
            ObjectImpl::Host(host) => {
                if let Some(removed) = host.delete(&key)? {
                    self.release(removed);
                }
                Ok(())
            }
            ObjectImpl::Foreign { class, data } => class.remove_property(self, &*data, name),
        }
    }

    fn try_get_all_property_names(&self, object: Value) -> CallResult<(u32, VarArray)> {
        let target = self.object_impl(object, "GetAllPropertyNames")?;
        tracing::trace!(target: "var_bridge", %object, "GetAllPropertyNames");
        let names = match target {
            ObjectImpl::Host(host) => self.key_values(&host.enumerable_keys())?,
            ObjectImpl::Foreign { class, data } => class.get_all_property_names(self, &*data)?,
        };

        // foreign classes hand back arbitrary values
        if let Some(bad) = names
            .iter()
            .find(|name| !matches!(name, Value::String(_) | Value::Int(_)))
        {
            let got = bad.kind();
            self.release_all(names);
            return Err(BridgeError::InvalidArgumentKind {
                what: "enumerated property name",
                expected: "string or int",
                got,
            }
            .into());
        }

        let Ok(count) = u32::try_from(names.len()) else {
            let bytes = names.len().saturating_mul(std::mem::size_of::<Value>());
            self.release_all(names);
            return Err(BridgeError::AllocationFailure {
                what: "property name array",
                bytes,
            }
            .into());
        };

        let allocated = self.heap().borrow_mut().mem_alloc(names.clone());
        match allocated {
            Ok(array) => Ok((count, array)),
            Err(err) => {
                self.release_all(names);
                Err(Raised::from(err))
            }
        }
    }

    fn release_all(&self, values: Vec<Value>) {
        for value in values {
            self.release(value);
        }
    }

    /// Encodes keys as owned values, releasing the partial result if an
    /// allocation fails midway.
    fn key_values(&self, keys: &[PropertyKey]) -> CallResult<Vec<Value>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            match self.key_value(key) {
                Ok(value) => values.push(value),
                Err(err) => {
                    self.release_all(values);
                    return Err(err.into());
                }
            }
        }
        Ok(values)
    }
}
