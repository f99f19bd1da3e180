//! Objects, property descriptors and callables
//!
//! An object is a shared, interior-mutable node: an ordered own-property map,
//! an optional prototype link, an extensible flag and, for functions, a
//! callable slot. Handles are cheap to clone and compare by identity.

use crate::error::HostResult;
use crate::realm::Realm;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Behaviour of a function when called: `(realm, this, args)`.
pub type NativeFn = Rc<dyn Fn(&Realm, &Value, &[Value]) -> HostResult<Value>>;

/// Behaviour of a function under `new`: `(realm, args, new_target)`.
pub type ConstructFn = Rc<dyn Fn(&Realm, &[Value], &ObjectRef) -> HostResult<Value>>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an object for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The callable slot of a function object.
#[derive(Clone)]
pub struct Callable {
    pub name: String,
    /// `None` means calling without `new` throws (class constructors).
    pub call: Option<NativeFn>,
    /// `None` means the function is not a constructor.
    pub construct: Option<ConstructFn>,
    /// Text returned by `Function.prototype.toString`.
    pub source: Rc<str>,
}

impl Callable {
    pub fn native_source(name: &str) -> Rc<str> {
        Rc::from(format!("function {}() {{ [native code] }}", name))
    }
}

#[derive(Debug, Clone)]
pub enum PropertyKind {
    Data { value: Value, writable: bool },
    Accessor { get: Option<ObjectRef>, set: Option<ObjectRef> },
}

/// A full property descriptor.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub kind: PropertyKind,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Plain assignment-style data property: writable, enumerable, configurable.
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            kind: PropertyKind::Data { value: value.into(), writable: true },
            enumerable: true,
            configurable: true,
        }
    }

    /// Method slot on a shared-behavior object: writable, configurable, hidden.
    pub fn method(value: impl Into<Value>) -> Self {
        Self {
            kind: PropertyKind::Data { value: value.into(), writable: true },
            enumerable: false,
            configurable: true,
        }
    }

    /// Accessor attribute: enumerable and configurable.
    pub fn accessor(get: Option<ObjectRef>, set: Option<ObjectRef>) -> Self {
        Self {
            kind: PropertyKind::Accessor { get, set },
            enumerable: true,
            configurable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        if let PropertyKind::Data { writable, .. } = &mut self.kind {
            *writable = false;
        }
        self
    }

    pub fn non_configurable(mut self) -> Self {
        self.configurable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.enumerable = false;
        self
    }

    pub fn getter(&self) -> Option<&ObjectRef> {
        match &self.kind {
            PropertyKind::Accessor { get, .. } => get.as_ref(),
            PropertyKind::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<&ObjectRef> {
        match &self.kind {
            PropertyKind::Accessor { set, .. } => set.as_ref(),
            PropertyKind::Data { .. } => None,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, PropertyKind::Accessor { .. })
    }
}

pub(crate) struct ObjectData {
    id: ObjectId,
    properties: IndexMap<String, PropertyDescriptor>,
    prototype: Option<ObjectRef>,
    extensible: bool,
    callable: Option<Callable>,
}

/// Shared handle to a page object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

/// Non-owning handle; does not keep the object alive.
#[derive(Clone)]
pub struct WeakObjectRef(Weak<RefCell<ObjectData>>);

impl ObjectRef {
    /// Create an ordinary object with the given prototype.
    pub fn new(prototype: Option<ObjectRef>) -> Self {
        Self::with_callable(prototype, None)
    }

    pub(crate) fn with_callable(prototype: Option<ObjectRef>, callable: Option<Callable>) -> Self {
        ObjectRef(Rc::new(RefCell::new(ObjectData {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            properties: IndexMap::new(),
            prototype,
            extensible: true,
            callable,
        })))
    }

    pub fn id(&self) -> ObjectId {
        self.0.borrow().id
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Rc::downgrade(&self.0))
    }

    pub fn is_callable(&self) -> bool {
        self.0.borrow().callable.is_some()
    }

    pub fn is_constructor(&self) -> bool {
        self.0
            .borrow()
            .callable
            .as_ref()
            .is_some_and(|c| c.construct.is_some())
    }

    /// Snapshot of the callable slot. Cloned so no borrow is held while the
    /// function runs and re-enters this object.
    pub fn callable(&self) -> Option<Callable> {
        self.0.borrow().callable.clone()
    }

    pub fn callable_name(&self) -> String {
        self.0
            .borrow()
            .callable
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    pub fn source(&self) -> Option<Rc<str>> {
        self.0.borrow().callable.as_ref().map(|c| c.source.clone())
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.0.borrow().prototype.clone()
    }

    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        self.0.borrow_mut().prototype = prototype;
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    /// Freeze every own property and stop new ones from being added.
    pub fn freeze(&self) {
        let mut data = self.0.borrow_mut();
        data.extensible = false;
        for desc in data.properties.values_mut() {
            desc.configurable = false;
            if let PropertyKind::Data { writable, .. } = &mut desc.kind {
                *writable = false;
            }
        }
    }

    pub fn get_own_property(&self, key: &str) -> Option<PropertyDescriptor> {
        self.0.borrow().properties.get(key).cloned()
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    pub fn own_keys(&self) -> Vec<String> {
        self.0.borrow().properties.keys().cloned().collect()
    }

    /// Write a descriptor without any validation. Realm operations are the
    /// checked path; this is for building objects.
    pub fn insert_property(&self, key: impl Into<String>, desc: PropertyDescriptor) {
        self.0.borrow_mut().properties.insert(key.into(), desc);
    }

    pub(crate) fn set_own_data_value(&self, key: &str, value: Value) -> bool {
        let mut data = self.0.borrow_mut();
        match data.properties.get_mut(key) {
            Some(PropertyDescriptor {
                kind: PropertyKind::Data { value: slot, writable: true },
                ..
            }) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }
}

impl WeakObjectRef {
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_borrow: Debug may run while the object is mutably borrowed
        match self.0.try_borrow() {
            Ok(data) => match &data.callable {
                Some(c) => write!(f, "ObjectRef({} fn {})", data.id, c.name),
                None => write!(f, "ObjectRef({})", data.id),
            },
            Err(_) => write!(f, "ObjectRef(<borrowed>)"),
        }
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "Weak({:?})", obj),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}
