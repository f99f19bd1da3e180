//! Reporter
//!
//! Turns an observed API touch into one serialized event and hands it to the
//! sink function the supervisor bound into the page.
//!
//! # Delivery
//!
//! 1. With dedup on, the key `api:method` is checked and recorded first; a
//!    repeated key ends the report with no side effect.
//! 2. The sink is looked up on the global object by its binding name. A
//!    missing or non-callable sink is not an error.
//! 3. The event carries the page call stack when the host supports it.
//! 4. The payload is a JSON object string passed as the sink's only argument.
//!
//! Every step runs under the guard, so a faulty sink costs one report and
//! nothing else.

use crate::error::HookError;
use crate::guard::Guard;
use crate::settings::Settings;
use fphook_host::{HostResult, PropertyDescriptor, Realm, Value};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// One observed API touch, as delivered to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub api: String,
    pub method: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub stacktrace: String,
}

fn empty_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Event {
    pub fn new(api: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            method: method.into(),
            stacktrace: String::new(),
        }
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = stacktrace.into();
        self
    }

    /// The dedup key for this event.
    pub fn key(&self) -> String {
        event_key(&self.api, &self.method)
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a sink payload back into an event (supervisor side).
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

fn event_key(api: &str, method: &str) -> String {
    format!("{}:{}", api, method)
}

#[derive(Debug)]
pub struct Reporter {
    binding: String,
    dedup: bool,
    capture_stack: bool,
    sent: RefCell<HashSet<String>>,
    guard: Guard,
}

impl Reporter {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binding: settings.binding.clone(),
            dedup: settings.optimize_events,
            capture_stack: settings.capture_stack,
            sent: RefCell::new(HashSet::new()),
            guard: Guard::new(!settings.silent_errors),
        }
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    pub fn dedup_enabled(&self) -> bool {
        self.dedup
    }

    /// Number of distinct keys seen under dedup mode.
    pub fn seen_keys(&self) -> usize {
        self.sent.borrow().len()
    }

    /// Report a touch of `method` on `api`. Never fails, never blocks.
    pub fn send(&self, realm: &Realm, api: &str, method: &str) {
        self.guard
            .run("report", (), || self.deliver(realm, api, method));
    }

    fn deliver(&self, realm: &Realm, api: &str, method: &str) -> Result<(), HookError> {
        if self.dedup && !self.sent.borrow_mut().insert(event_key(api, method)) {
            return Ok(());
        }

        let sink = realm.get(&realm.global_value(), &self.binding)?;
        if !sink.is_callable() {
            return Ok(());
        }

        let stacktrace = if self.capture_stack {
            realm.capture_stack().unwrap_or_default()
        } else {
            String::new()
        };
        let payload = Event::new(api, method)
            .with_stacktrace(stacktrace)
            .to_payload()?;

        tracing::trace!(api, method, "delivering fingerprint event");
        realm.call(&sink, &Value::Undefined, &[Value::from(payload)])?;
        Ok(())
    }
}

/// A sink that keeps every payload it receives, in order.
///
/// Stands in for the supervisor's binding in tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    payloads: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    /// Bind a recording sink as the global `binding` of `realm`.
    pub fn install(realm: &Realm, binding: &str) -> HostResult<Self> {
        let sink = Self::default();
        let payloads = sink.payloads.clone();
        let func = realm.new_function(binding, move |_realm, _this, args| {
            let payload = args.first().map(Value::to_string).unwrap_or_default();
            payloads.borrow_mut().push(payload);
            Ok(Value::Undefined)
        });
        realm.define_property(realm.global(), binding, PropertyDescriptor::method(func))?;
        Ok(sink)
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.borrow().clone()
    }

    /// Decoded events; payloads that fail to parse are skipped.
    pub fn events(&self) -> Vec<Event> {
        self.payloads
            .borrow()
            .iter()
            .filter_map(|p| Event::from_payload(p).ok())
            .collect()
    }

    /// Events whose method is exactly `method`.
    pub fn count(&self, api: &str, method: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.api == api && e.method == method)
            .count()
    }

    pub fn len(&self) -> usize {
        self.payloads.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.payloads.borrow_mut().clear();
    }
}
