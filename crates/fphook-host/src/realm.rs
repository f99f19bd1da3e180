//! The realm: global object, intrinsics and the checked object operations
//!
//! All operations mirror what page script can do to an object graph:
//! property reads walk the prototype chain and run getters against the
//! original receiver, assignment honours writability and setters, and
//! `define_property` refuses to touch non-configurable slots.

use crate::class::{ClassBuilder, FunctionBuilder};
use crate::error::{HostError, HostResult};
use crate::object::{ObjectRef, PropertyDescriptor, PropertyKind};
use crate::value::Value;
use std::cell::{Cell, RefCell};

/// Frames deeper than this are not recorded in captured stacks.
const MAX_RECORDED_FRAMES: usize = 64;

pub struct Realm {
    global: ObjectRef,
    object_prototype: ObjectRef,
    function_prototype: ObjectRef,
    frames: RefCell<Vec<String>>,
    stack_capture: Cell<bool>,
}

/// Pops the frame pushed for a call, on every exit path.
struct FrameGuard<'a> {
    frames: &'a RefCell<Vec<String>>,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.frames.borrow_mut().pop();
    }
}

impl Realm {
    /// Create a realm with `Object.prototype`, `Function.prototype` and a
    /// global object reachable as `window` and `globalThis`.
    pub fn new() -> Self {
        let object_prototype = ObjectRef::new(None);
        let function_prototype = ObjectRef::new(Some(object_prototype.clone()));
        let global = ObjectRef::new(Some(object_prototype.clone()));

        let realm = Self {
            global: global.clone(),
            object_prototype,
            function_prototype: function_prototype.clone(),
            frames: RefCell::new(Vec::new()),
            stack_capture: Cell::new(true),
        };

        let to_string = realm
            .function("toString")
            .call(|_realm, this, _args| {
                let source = this
                    .as_object()
                    .and_then(ObjectRef::source)
                    .ok_or_else(|| {
                        HostError::type_error(
                            "Function.prototype.toString requires that 'this' be a Function",
                        )
                    })?;
                Ok(Value::from(source.to_string()))
            })
            .build();
        function_prototype.insert_property("toString", PropertyDescriptor::method(to_string));

        // `window` is unforgeable in browsers
        global.insert_property(
            "window",
            PropertyDescriptor::data(&global).read_only().non_configurable(),
        );
        global.insert_property("globalThis", PropertyDescriptor::method(&global));

        realm
    }

    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    pub fn global_value(&self) -> Value {
        Value::from(&self.global)
    }

    pub fn object_prototype(&self) -> &ObjectRef {
        &self.object_prototype
    }

    pub fn function_prototype(&self) -> &ObjectRef {
        &self.function_prototype
    }

    /// A fresh ordinary object inheriting from `Object.prototype`.
    pub fn new_object(&self) -> ObjectRef {
        ObjectRef::new(Some(self.object_prototype.clone()))
    }

    /// Start building a function object.
    pub fn function(&self, name: &str) -> FunctionBuilder<'_> {
        FunctionBuilder::new(self, name)
    }

    /// Shorthand for a plain callable native function.
    pub fn new_function<F>(&self, name: &str, f: F) -> ObjectRef
    where
        F: Fn(&Realm, &Value, &[Value]) -> HostResult<Value> + 'static,
    {
        self.function(name).call(f).build()
    }

    /// Start building a class: constructor plus shared-behavior object.
    pub fn class(&self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name)
    }

    // ------------------------------------------------------------------
    // Property operations
    // ------------------------------------------------------------------

    /// `target[key]`: walks the prototype chain, running getters against
    /// `target` as receiver.
    pub fn get(&self, target: &Value, key: &str) -> HostResult<Value> {
        let receiver = match target {
            Value::Object(obj) => obj,
            Value::Undefined | Value::Null => {
                return Err(HostError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    target, key
                )))
            }
            // primitives have no modelled wrapper objects
            _ => return Ok(Value::Undefined),
        };

        let mut current = Some(receiver.clone());
        while let Some(obj) = current {
            if let Some(desc) = obj.get_own_property(key) {
                return match desc.kind {
                    PropertyKind::Data { value, .. } => Ok(value),
                    PropertyKind::Accessor { get: Some(getter), .. } => {
                        self.call(&Value::from(getter), target, &[])
                    }
                    PropertyKind::Accessor { get: None, .. } => Ok(Value::Undefined),
                };
            }
            current = obj.prototype();
        }
        Ok(Value::Undefined)
    }

    /// `target[key] = value`. Returns `false` when the host silently refuses
    /// the write (read-only slot, missing setter, non-extensible target).
    pub fn set(&self, target: &ObjectRef, key: &str, value: Value) -> HostResult<bool> {
        let mut current = Some(target.clone());
        while let Some(obj) = current {
            if let Some(desc) = obj.get_own_property(key) {
                match desc.kind {
                    PropertyKind::Data { writable: false, .. } => return Ok(false),
                    PropertyKind::Data { .. } if obj.ptr_eq(target) => {
                        return Ok(target.set_own_data_value(key, value));
                    }
                    // inherited writable data: shadow it below
                    PropertyKind::Data { .. } => break,
                    PropertyKind::Accessor { set: Some(setter), .. } => {
                        self.call(&Value::from(setter), &Value::from(target), &[value])?;
                        return Ok(true);
                    }
                    PropertyKind::Accessor { set: None, .. } => return Ok(false),
                }
            }
            current = obj.prototype();
        }

        if !target.is_extensible() {
            return Ok(false);
        }
        target.insert_property(key, PropertyDescriptor::data(value));
        Ok(true)
    }

    /// `Object.defineProperty(target, key, desc)`.
    pub fn define_property(
        &self,
        target: &ObjectRef,
        key: &str,
        desc: PropertyDescriptor,
    ) -> HostResult<()> {
        match target.get_own_property(key) {
            Some(existing) if !existing.configurable => {
                if Self::compatible_with_locked(&existing, &desc) {
                    target.insert_property(key, desc);
                    Ok(())
                } else {
                    Err(HostError::type_error(format!("Cannot redefine property: {}", key)))
                }
            }
            Some(_) => {
                target.insert_property(key, desc);
                Ok(())
            }
            None if !target.is_extensible() => Err(HostError::type_error(format!(
                "Cannot define property {}, object is not extensible",
                key
            ))),
            None => {
                target.insert_property(key, desc);
                Ok(())
            }
        }
    }

    /// A non-configurable slot may only have its value rewritten, and only
    /// while it stays a writable data property with the same attributes.
    fn compatible_with_locked(existing: &PropertyDescriptor, desc: &PropertyDescriptor) -> bool {
        matches!(
            (&existing.kind, &desc.kind),
            (
                PropertyKind::Data { writable: true, .. },
                PropertyKind::Data { writable: true, .. }
            )
        ) && !desc.configurable
            && existing.enumerable == desc.enumerable
    }

    pub fn get_own_property(&self, target: &ObjectRef, key: &str) -> Option<PropertyDescriptor> {
        target.get_own_property(key)
    }

    pub fn get_prototype_of(&self, target: &ObjectRef) -> Option<ObjectRef> {
        target.prototype()
    }

    /// Resolve a dotted path such as `navigator.geolocation` from the global
    /// object. A missing link yields `undefined` rather than a fault.
    pub fn resolve_path(&self, path: &str) -> HostResult<Value> {
        let mut current = self.global_value();
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            if current.is_nullish() {
                return Ok(Value::Undefined);
            }
            current = self.get(&current, segment)?;
        }
        Ok(current)
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    /// `func.call(this, ...args)`
    pub fn call(&self, func: &Value, this: &Value, args: &[Value]) -> HostResult<Value> {
        let callable = func
            .as_object()
            .and_then(ObjectRef::callable)
            .ok_or_else(|| HostError::NotCallable(func.type_of().to_string()))?;
        let call = callable.call.ok_or_else(|| {
            HostError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                callable.name
            ))
        })?;

        let _frame = self.push_frame(&callable.name);
        call(self, this, args)
    }

    /// `new func(...args)` with `func` as new target.
    pub fn construct(&self, func: &Value, args: &[Value]) -> HostResult<Value> {
        let target = func
            .as_object()
            .ok_or_else(|| HostError::NotConstructor(func.type_of().to_string()))?;
        self.construct_with_target(target, args, target)
    }

    /// `Reflect.construct(func, args, new_target)`
    pub fn construct_with_target(
        &self,
        func: &ObjectRef,
        args: &[Value],
        new_target: &ObjectRef,
    ) -> HostResult<Value> {
        let callable = func
            .callable()
            .ok_or_else(|| HostError::NotConstructor("object".to_string()))?;
        let construct = callable
            .construct
            .ok_or_else(|| HostError::NotConstructor(callable.name.clone()))?;

        let _frame = self.push_frame(&format!("new {}", callable.name));
        construct(self, args, new_target)
    }

    /// `value instanceof ctor`
    pub fn instance_of(&self, value: &Value, ctor: &Value) -> HostResult<bool> {
        if !ctor.is_callable() {
            return Err(HostError::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        let Some(obj) = value.as_object() else {
            return Ok(false);
        };
        let Some(prototype) = self.get(ctor, "prototype")?.as_object().cloned() else {
            return Err(HostError::type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };

        let mut current = obj.prototype();
        while let Some(link) = current {
            if link.ptr_eq(&prototype) {
                return Ok(true);
            }
            current = link.prototype();
        }
        Ok(false)
    }

    /// `String(func)`, going through whatever `toString` the page sees.
    pub fn function_to_string(&self, func: &ObjectRef) -> HostResult<String> {
        let receiver = Value::from(func);
        let to_string = self.get(&receiver, "toString")?;
        Ok(self.call(&to_string, &receiver, &[])?.to_string())
    }

    // ------------------------------------------------------------------
    // Stack traces
    // ------------------------------------------------------------------

    fn push_frame(&self, name: &str) -> FrameGuard<'_> {
        let mut frames = self.frames.borrow_mut();
        let label = if name.is_empty() { "<anonymous>" } else { name };
        frames.push(label.to_string());
        FrameGuard { frames: &self.frames }
    }

    /// Enable or disable stack capture (hosts without `Error.stack`).
    pub fn set_stack_capture(&self, enabled: bool) {
        self.stack_capture.set(enabled);
    }

    /// Render the current call stack the way `new Error().stack` does,
    /// innermost frame first. `None` when capture is unsupported.
    pub fn capture_stack(&self) -> Option<String> {
        if !self.stack_capture.get() {
            return None;
        }
        let frames = self.frames.borrow();
        let mut out = String::from("Error");
        for name in frames.iter().rev().take(MAX_RECORDED_FRAMES) {
            out.push_str("\n    at ");
            out.push_str(name);
        }
        Some(out)
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
