//! Initializer
//!
//! Walks a normalized [`Catalog`] and calls the matching engine primitive
//! once per `(target, name)` pair, in declared order. Targets are dotted
//! paths resolved from the global object; an unresolvable target skips its
//! pairs and the walk goes on.

use crate::catalog::{Catalog, CatalogEntry, EntryKind, OnReturnHook};
use crate::engine::{Engine, HookOptions, HookOutcome};
use crate::settings::Settings;
use fphook_host::{Realm, Value};
use serde::Serialize;
use std::fmt;

/// Outcome tally of one initialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub installed: usize,
    pub already_hooked: usize,
    pub missing: usize,
    pub not_callable: usize,
    pub rejected: usize,
    pub faulted: usize,
    /// Target paths that did not resolve to an object.
    pub unresolved_targets: usize,
}

impl InitReport {
    pub fn record(&mut self, outcome: HookOutcome) {
        let slot = match outcome {
            HookOutcome::Installed => &mut self.installed,
            HookOutcome::AlreadyHooked => &mut self.already_hooked,
            HookOutcome::Missing => &mut self.missing,
            HookOutcome::NotCallable => &mut self.not_callable,
            HookOutcome::Rejected => &mut self.rejected,
            HookOutcome::Faulted => &mut self.faulted,
        };
        *slot += 1;
    }

    /// Hook requests issued.
    pub fn attempted(&self) -> usize {
        self.installed
            + self.already_hooked
            + self.missing
            + self.not_callable
            + self.rejected
            + self.faulted
    }

    /// Requests that left the page untouched.
    pub fn skipped(&self) -> usize {
        self.attempted() - self.installed
    }

    fn merge(&mut self, other: &InitReport) {
        self.installed += other.installed;
        self.already_hooked += other.already_hooked;
        self.missing += other.missing;
        self.not_callable += other.not_callable;
        self.rejected += other.rejected;
        self.faulted += other.faulted;
        self.unresolved_targets += other.unresolved_targets;
    }
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} installed, {} already hooked, {} missing, {} not callable, {} rejected, {} faulted, {} unresolved targets",
            self.installed,
            self.already_hooked,
            self.missing,
            self.not_callable,
            self.rejected,
            self.faulted,
            self.unresolved_targets
        )
    }
}

/// Instrument `realm` according to `catalog`.
///
/// Safe to call again: every pair already covered comes back as
/// `AlreadyHooked` and nothing is wrapped twice.
pub fn initialize(engine: &Engine, realm: &Realm, catalog: &Catalog) -> InitReport {
    let mut report = InitReport::default();
    for run in catalog.entries().chunk_by(|a, b| a.group == b.group) {
        let mut group_report = InitReport::default();
        for entry in run {
            apply_entry(engine, realm, entry, &mut group_report);
        }
        tracing::debug!(
            group = run[0].group.as_str(),
            installed = group_report.installed,
            skipped = group_report.skipped(),
            unresolved = group_report.unresolved_targets,
            "instrumented group"
        );
        report.merge(&group_report);
    }
    tracing::info!(
        installed = report.installed,
        attempted = report.attempted(),
        "fingerprint instrumentation ready"
    );
    report
}

/// Create the page's engine from `settings` and instrument `realm`.
pub fn inject(realm: &Realm, settings: &Settings, catalog: &Catalog) -> (Engine, InitReport) {
    let engine = Engine::new(settings);
    let report = initialize(&engine, realm, catalog);
    (engine, report)
}

fn apply_entry(engine: &Engine, realm: &Realm, entry: &CatalogEntry, report: &mut InitReport) {
    let options = hook_options(entry);

    if entry.kind == EntryKind::Constructor {
        for name in &entry.names {
            report.record(engine.hook_constructor(realm, name, &entry.api, &options));
        }
        return;
    }

    for path in &entry.targets {
        let target = resolve_target(engine, realm, path);
        if target.as_object().is_none() {
            tracing::trace!(target = path.as_str(), "target not present");
            report.unresolved_targets += 1;
            continue;
        }
        for name in &entry.names {
            let outcome = match entry.kind {
                EntryKind::Getter => engine.hook_getter(realm, &target, name, &entry.api),
                _ => engine.hook_method(realm, &target, name, &entry.api, &options),
            };
            tracing::trace!(target = path.as_str(), name = name.as_str(), ?outcome, "hook");
            report.record(outcome);
        }
    }
}

fn resolve_target(engine: &Engine, realm: &Realm, path: &str) -> Value {
    engine
        .guard()
        .run("resolve_target", Value::Undefined, || Ok(realm.resolve_path(path)?))
}

fn hook_options(entry: &CatalogEntry) -> HookOptions {
    let mut options = HookOptions {
        arg_index_to_wrap: entry.options.wrap_callback_arg,
        on_return: None,
        static_member: entry.options.static_member,
    };
    if let Some(hook) = &entry.options.on_return {
        options = options.on_return(chain_hook(hook.clone()));
    }
    options
}

/// Continuation that hooks `hook.method` on a returned object.
fn chain_hook(hook: OnReturnHook) -> impl Fn(&Realm, &Engine, &Value) + 'static {
    move |realm, engine, result| {
        let target = chain_target(realm, result, &hook.method);
        engine.hook_method(realm, &target, &hook.method, &hook.api, &HookOptions::default());
    }
}

/// Where a continuation wraps `method`: the result itself when it owns the
/// member, else the result's prototype, so every later result of the same
/// kind is covered by one wrapper.
fn chain_target(realm: &Realm, result: &Value, method: &str) -> Value {
    match result {
        Value::Object(obj) if !obj.is_callable() && !obj.has_own_property(method) => realm
            .get_prototype_of(obj)
            .map(|proto| Value::from(&proto))
            .unwrap_or_else(|| result.clone()),
        _ => result.clone(),
    }
}
