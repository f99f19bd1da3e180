//! fphook-host: the page object model fphook instruments
//!
//! A single-threaded, JS-shaped object graph: values, objects with ordered
//! own properties and prototype links, data and accessor descriptors, native
//! functions and constructors, and a realm that owns the global object.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Realm                                    │
//! │   global ── window / globalThis          │
//! │   get / set / define_property            │
//! │   call / construct / instance_of         │
//! │   capture_stack                          │
//! ├──────────────────────────────────────────┤
//! │ ObjectRef ── properties, [[Prototype]],  │
//! │              callable slot               │
//! └──────────────────────────────────────────┘
//! ```

pub mod class;
pub mod error;
pub mod object;
pub mod realm;
pub mod value;

pub use class::{ClassBuilder, FunctionBuilder, InitFn};
pub use error::{HostError, HostResult};
pub use object::{
    Callable, ConstructFn, NativeFn, ObjectId, ObjectRef, PropertyDescriptor, PropertyKind,
    WeakObjectRef,
};
pub use realm::Realm;
pub use value::Value;
