//! Identity registry
//!
//! Remembers every function value the engine has wrapped, and every wrapper
//! it produced, by reference identity. A registered function is never wrapped
//! again, which is what makes repeated or overlapping hook passes no-ops.
//! Entries are weak: the registry never keeps a page object alive.

use fphook_host::{ObjectId, ObjectRef, Value, WeakObjectRef};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: RefCell<HashMap<ObjectId, WeakObjectRef>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, obj: &ObjectRef) {
        self.entries.borrow_mut().insert(obj.id(), obj.downgrade());
    }

    pub fn contains(&self, obj: &ObjectRef) -> bool {
        self.entries
            .borrow()
            .get(&obj.id())
            .and_then(WeakObjectRef::upgrade)
            .is_some_and(|known| known.ptr_eq(obj))
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        value.as_object().is_some_and(|obj| self.contains(obj))
    }

    /// Live registered objects.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
