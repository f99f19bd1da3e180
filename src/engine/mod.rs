//! Interception engine
//!
//! Three primitives, each idempotent and each run under the guard:
//!
//! - [`Engine::hook_method`] wraps a function on a shared-behavior object.
//! - [`Engine::hook_getter`] wraps the nearest read accessor of a property.
//! - [`Engine::hook_constructor`] replaces a global constructor binding with a
//!   forwarding constructor that reports every `new`.
//!
//! A wrapper always reports first, then forwards to the original with the
//! original receiver and arguments, and returns the original's result or
//! fault unchanged.

mod accessor;
mod callback;
mod constructor;
mod method;

use crate::error::HookError;
use crate::guard::Guard;
use crate::registry::IdentityRegistry;
use crate::reporter::Reporter;
use crate::settings::Settings;
use fphook_host::{ObjectRef, Realm, Value};
use std::fmt;
use std::rc::Rc;

/// Continuation run with the result of a hooked method call.
pub type OnReturn = Rc<dyn Fn(&Realm, &Engine, &Value)>;

/// Per-hook options.
#[derive(Clone, Default)]
pub struct HookOptions {
    /// Position of a callback argument to wrap so its invocations are
    /// reported too.
    pub arg_index_to_wrap: Option<usize>,
    /// Runs after the original returns, under the guard.
    pub on_return: Option<OnReturn>,
    /// Hook the member on the target itself instead of its `prototype`,
    /// for static members of a class such as `Date.now`.
    pub static_member: bool,
}

impl HookOptions {
    pub fn wrap_arg(mut self, index: usize) -> Self {
        self.arg_index_to_wrap = Some(index);
        self
    }

    pub fn static_member(mut self) -> Self {
        self.static_member = true;
        self
    }

    pub fn on_return<F>(mut self, f: F) -> Self
    where
        F: Fn(&Realm, &Engine, &Value) + 'static,
    {
        self.on_return = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("arg_index_to_wrap", &self.arg_index_to_wrap)
            .field("on_return", &self.on_return.is_some())
            .field("static_member", &self.static_member)
            .finish()
    }
}

/// What a hook request did. Faults never escape as errors; they show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookOutcome {
    /// A wrapper is now in place.
    Installed,
    /// The member is already a wrapper, or an original that was wrapped.
    AlreadyHooked,
    /// The target or member does not exist.
    Missing,
    /// The member exists but is not a function (or has no getter).
    NotCallable,
    /// The host refused the replacement.
    Rejected,
    /// The hook attempt faulted and was absorbed.
    Faulted,
}

impl HookOutcome {
    pub fn is_installed(self) -> bool {
        self == HookOutcome::Installed
    }
}

struct EngineState {
    registry: IdentityRegistry,
    reporter: Reporter,
    guard: Guard,
}

/// The engine instance for one page. Cheap to clone; clones share the
/// registry and dedup state.
#[derive(Clone)]
pub struct Engine {
    state: Rc<EngineState>,
}

impl Engine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: Rc::new(EngineState {
                registry: IdentityRegistry::new(),
                reporter: Reporter::new(settings),
                guard: Guard::new(!settings.silent_errors),
            }),
        }
    }

    /// Wrap `method_name` on `target`'s shared-behavior object (its
    /// `prototype` when it has one, else `target` itself; always `target`
    /// with `HookOptions::static_member`).
    pub fn hook_method(
        &self,
        realm: &Realm,
        target: &Value,
        method_name: &str,
        api: &str,
        options: &HookOptions,
    ) -> HookOutcome {
        self.state.guard.run("hook_method", HookOutcome::Faulted, || {
            method::install(self, realm, target, method_name, api, options)
        })
    }

    /// Wrap the getter of the nearest accessor for `prop_name`.
    pub fn hook_getter(
        &self,
        realm: &Realm,
        target: &Value,
        prop_name: &str,
        api: &str,
    ) -> HookOutcome {
        self.state.guard.run("hook_getter", HookOutcome::Faulted, || {
            accessor::install(self, realm, target, prop_name, api)
        })
    }

    /// Replace the global constructor `class_name` with a reporting
    /// forwarder.
    pub fn hook_constructor(
        &self,
        realm: &Realm,
        class_name: &str,
        api: &str,
        options: &HookOptions,
    ) -> HookOutcome {
        self.state.guard.run("hook_constructor", HookOutcome::Faulted, || {
            constructor::install(self, realm, class_name, api, options)
        })
    }

    /// Whether `value` is a wrapper this engine produced or an original it
    /// wrapped.
    pub fn is_hooked(&self, value: &Value) -> bool {
        self.state.registry.contains_value(value)
    }

    pub fn reporter(&self) -> &Reporter {
        &self.state.reporter
    }

    pub fn guard(&self) -> Guard {
        self.state.guard
    }

    pub(crate) fn registry(&self) -> &IdentityRegistry {
        &self.state.registry
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("hooked", &self.state.registry.len())
            .field("reporter", &self.state.reporter)
            .finish()
    }
}

/// `target.prototype || target`, the object whose members are shared by
/// every instance.
fn shared_behavior_object(realm: &Realm, target: &Value) -> Result<Option<ObjectRef>, HookError> {
    let Some(obj) = target.as_object() else {
        return Ok(None);
    };
    let prototype = realm.get(target, "prototype")?;
    match prototype {
        Value::Object(proto) => Ok(Some(proto)),
        _ => Ok(Some(obj.clone())),
    }
}
