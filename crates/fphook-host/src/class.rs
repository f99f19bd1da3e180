//! Builders for function objects and classes
//!
//! # Example
//!
//! ```ignore
//! let canvas = realm
//!     .class("HTMLCanvasElement")
//!     .extends(&html_element)
//!     .constructor(|_realm, _this, _args| Ok(()))
//!     .method("toDataURL", |_realm, _this, _args| Ok("data:image/png;base64,".into()))
//!     .getter("width", |_realm, _this| Ok(300.into()))
//!     .install();
//! ```

use crate::error::{HostError, HostResult};
use crate::object::{Callable, ConstructFn, NativeFn, ObjectRef, PropertyDescriptor};
use crate::realm::Realm;
use crate::value::Value;
use std::rc::Rc;

/// Instance initializer run by ordinary construction: `(realm, this, args)`.
pub type InitFn = Rc<dyn Fn(&Realm, &ObjectRef, &[Value]) -> HostResult<()>>;

pub struct FunctionBuilder<'r> {
    realm: &'r Realm,
    name: String,
    call: Option<NativeFn>,
    construct: Option<ConstructFn>,
    source: Option<Rc<str>>,
    link: Option<ObjectRef>,
}

impl<'r> FunctionBuilder<'r> {
    pub(crate) fn new(realm: &'r Realm, name: &str) -> Self {
        Self {
            realm,
            name: name.to_string(),
            call: None,
            construct: None,
            source: None,
            link: None,
        }
    }

    /// Behaviour when called.
    pub fn call<F>(mut self, f: F) -> Self
    where
        F: Fn(&Realm, &Value, &[Value]) -> HostResult<Value> + 'static,
    {
        self.call = Some(Rc::new(f));
        self
    }

    /// Behaviour under `new`.
    pub fn construct<F>(mut self, f: F) -> Self
    where
        F: Fn(&Realm, &[Value], &ObjectRef) -> HostResult<Value> + 'static,
    {
        self.construct = Some(Rc::new(f));
        self
    }

    /// Override the text `Function.prototype.toString` reports.
    pub fn source(mut self, source: Rc<str>) -> Self {
        self.source = Some(source);
        self
    }

    /// Use `link` as the function's `[[Prototype]]` instead of
    /// `Function.prototype`. Static lookups then fall through to it.
    pub fn inherit_from(mut self, link: ObjectRef) -> Self {
        self.link = Some(link);
        self
    }

    pub fn build(self) -> ObjectRef {
        let source = self
            .source
            .unwrap_or_else(|| Callable::native_source(&self.name));
        let link = self
            .link
            .unwrap_or_else(|| self.realm.function_prototype().clone());

        let func = ObjectRef::with_callable(
            Some(link),
            Some(Callable {
                name: self.name.clone(),
                call: self.call,
                construct: self.construct,
                source,
            }),
        );
        func.insert_property(
            "name",
            PropertyDescriptor::data(self.name).read_only().hidden(),
        );
        func
    }
}

pub struct ClassBuilder<'r> {
    realm: &'r Realm,
    name: String,
    parent: Option<ObjectRef>,
    prototype: ObjectRef,
    statics: Vec<(String, PropertyDescriptor)>,
    init: Option<InitFn>,
    call: Option<NativeFn>,
}

impl<'r> ClassBuilder<'r> {
    pub(crate) fn new(realm: &'r Realm, name: &str) -> Self {
        Self {
            realm,
            name: name.to_string(),
            parent: None,
            prototype: realm.new_object(),
            statics: Vec::new(),
            init: None,
            call: None,
        }
    }

    /// Inherit both the shared-behavior object and static members of
    /// `parent`.
    pub fn extends(self, parent: &ObjectRef) -> Self {
        if let Some(parent_proto) = parent
            .get_own_property("prototype")
            .and_then(|desc| match desc.kind {
                crate::object::PropertyKind::Data { value: Value::Object(obj), .. } => Some(obj),
                _ => None,
            })
        {
            self.prototype.set_prototype(Some(parent_proto));
        }
        Self {
            parent: Some(parent.clone()),
            ..self
        }
    }

    /// Make the class constructible; `init` runs against the fresh instance.
    /// Without it, `new` throws "Illegal constructor" like browser interfaces.
    pub fn constructor<F>(mut self, init: F) -> Self
    where
        F: Fn(&Realm, &ObjectRef, &[Value]) -> HostResult<()> + 'static,
    {
        self.init = Some(Rc::new(init));
        self
    }

    /// Behaviour when the constructor is called without `new`.
    pub fn callable<F>(mut self, f: F) -> Self
    where
        F: Fn(&Realm, &Value, &[Value]) -> HostResult<Value> + 'static,
    {
        self.call = Some(Rc::new(f));
        self
    }

    pub fn method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&Realm, &Value, &[Value]) -> HostResult<Value> + 'static,
    {
        let func = self.realm.new_function(name, f);
        self.prototype
            .insert_property(name, PropertyDescriptor::method(func));
        self
    }

    pub fn getter<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&Realm, &Value) -> HostResult<Value> + 'static,
    {
        let getter = self
            .realm
            .new_function(&format!("get {}", name), move |realm, this, _args| f(realm, this));
        self.prototype
            .insert_property(name, PropertyDescriptor::accessor(Some(getter), None));
        self
    }

    /// Data slot on the shared-behavior object.
    pub fn data(self, name: &str, value: impl Into<Value>) -> Self {
        self.prototype
            .insert_property(name, PropertyDescriptor::method(value));
        self
    }

    pub fn static_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Realm, &Value, &[Value]) -> HostResult<Value> + 'static,
    {
        let func = self.realm.new_function(name, f);
        self.statics
            .push((name.to_string(), PropertyDescriptor::method(func)));
        self
    }

    pub fn build(self) -> ObjectRef {
        let realm = self.realm;
        let class_name = self.name.clone();

        let construct: ConstructFn = match self.init {
            Some(init) => Rc::new(
                move |realm: &Realm, args: &[Value], new_target: &ObjectRef| -> HostResult<Value> {
                    let instance = realm.new_instance(new_target)?;
                    init(realm, &instance, args)?;
                    Ok(Value::from(instance))
                },
            ),
            None => Rc::new(
                |_realm: &Realm, _args: &[Value], _new_target: &ObjectRef| -> HostResult<Value> {
                    Err(HostError::type_error("Illegal constructor"))
                },
            ),
        };

        let mut builder = realm.function(&class_name);
        builder.construct = Some(construct);
        builder.call = self.call;
        if let Some(parent) = self.parent {
            builder = builder.inherit_from(parent);
        }
        let ctor = builder.build();

        ctor.insert_property(
            "prototype",
            PropertyDescriptor::data(&self.prototype)
                .read_only()
                .hidden()
                .non_configurable(),
        );
        self.prototype
            .insert_property("constructor", PropertyDescriptor::method(&ctor));
        for (name, desc) in self.statics {
            ctor.insert_property(name, desc);
        }
        ctor
    }

    /// Build and bind the constructor as a global, the way interface objects
    /// are exposed: writable, configurable, not enumerable.
    pub fn install(self) -> ObjectRef {
        let realm = self.realm;
        let name = self.name.clone();
        let ctor = self.build();
        realm
            .global()
            .insert_property(name, PropertyDescriptor::method(&ctor));
        ctor
    }
}

impl Realm {
    /// A bare instance of `ctor` without running any initializer, for
    /// singletons such as `navigator` whose constructor is illegal.
    pub fn new_instance(&self, ctor: &ObjectRef) -> HostResult<ObjectRef> {
        let prototype = self
            .get(&Value::from(ctor), "prototype")?
            .as_object()
            .cloned()
            .unwrap_or_else(|| self.object_prototype().clone());
        Ok(ObjectRef::new(Some(prototype)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructed_instances_inherit_methods_and_pass_instance_of() {
        let realm = Realm::new();
        let base = realm
            .class("Element")
            .method("tag", |_realm, _this, _args| Ok(Value::from("element")))
            .install();
        let canvas = realm
            .class("HTMLCanvasElement")
            .extends(&base)
            .constructor(|realm, this, args| {
                let width = args.first().cloned().unwrap_or(Value::from(300));
                realm.set(this, "width", width).map(|_| ())
            })
            .install();

        let instance = realm.construct(&Value::from(&canvas), &[Value::from(64)]).unwrap();
        assert!(realm.instance_of(&instance, &Value::from(&canvas)).unwrap());
        assert!(realm.instance_of(&instance, &Value::from(&base)).unwrap());
        assert_eq!(realm.get(&instance, "width").unwrap(), Value::from(64));

        let tag = realm.get(&instance, "tag").unwrap();
        assert_eq!(realm.call(&tag, &instance, &[]).unwrap(), Value::from("element"));
    }

    #[test]
    fn classes_without_initializer_are_illegal_to_construct() {
        let realm = Realm::new();
        let navigator = realm.class("Navigator").install();
        let err = realm.construct(&Value::from(&navigator), &[]).unwrap_err();
        assert_eq!(err, HostError::type_error("Illegal constructor"));

        let instance = realm.new_instance(&navigator).unwrap();
        assert!(realm
            .instance_of(&Value::from(instance), &Value::from(&navigator))
            .unwrap());
    }

    #[test]
    fn calling_a_class_without_new_throws() {
        let realm = Realm::new();
        let ctor = realm.class("ResizeObserver").constructor(|_, _, _| Ok(())).build();
        assert!(realm.call(&Value::from(&ctor), &Value::Undefined, &[]).is_err());
    }

    #[test]
    fn statics_and_getters_are_placed_on_the_right_objects() {
        let realm = Realm::new();
        let date = realm
            .class("Date")
            .static_method("now", |_realm, _this, _args| Ok(Value::from(1_000.0)))
            .getter("year", |_realm, _this| Ok(Value::from(2024)))
            .install();

        assert!(date.get_own_property("now").is_some());
        let proto = realm.get(&Value::from(&date), "prototype").unwrap();
        let desc = proto.as_object().unwrap().get_own_property("year").unwrap();
        assert!(desc.is_accessor());
        assert_eq!(realm.function_to_string(desc.getter().unwrap()).unwrap(),
            "function get year() { [native code] }");
    }
}
