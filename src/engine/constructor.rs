//! Constructor interception
//!
//! The global binding is replaced by a forwarding constructor rather than a
//! subclass. Its `[[Prototype]]` is the original class, so static members and
//! `prototype` resolve through it and `instanceof` checks against either
//! binding agree. Plain calls forward without a report.

use super::{callback, Engine, HookOptions, HookOutcome};
use crate::error::HookError;
use fphook_host::{Callable, Realm, Value};

/// Method label reported for every `new`.
const CONSTRUCT_METHOD: &str = "constructor";
/// Method label reported when a wrapped constructor callback fires.
const CALLBACK_METHOD: &str = "callback";

pub(super) fn install(
    engine: &Engine,
    realm: &Realm,
    class_name: &str,
    api: &str,
    options: &HookOptions,
) -> Result<HookOutcome, HookError> {
    let original = match realm.get(&realm.global_value(), class_name)? {
        Value::Undefined | Value::Null => return Ok(HookOutcome::Missing),
        Value::Object(obj) if obj.is_constructor() => obj,
        _ => return Ok(HookOutcome::NotCallable),
    };
    if engine.registry().contains(&original) {
        return Ok(HookOutcome::AlreadyHooked);
    }

    let source = original
        .source()
        .unwrap_or_else(|| Callable::native_source(class_name));
    let call_target = Value::from(&original);
    let wrapper = {
        let engine = engine.clone();
        let api = api.to_string();
        let wrap_index = options.arg_index_to_wrap;
        let class = original.clone();

        realm
            .function(class_name)
            .inherit_from(original.clone())
            .source(source)
            .call(move |realm, this, args| realm.call(&call_target, this, args))
            .construct(move |realm, args, _new_target| {
                engine.reporter().send(realm, &api, CONSTRUCT_METHOD);

                let mut args = args.to_vec();
                if let Some(index) = wrap_index {
                    callback::wrap_argument(&engine, realm, &mut args, index, &api, CALLBACK_METHOD);
                }
                realm.construct_with_target(&class, &args, &class)
            })
            .build()
    };

    if !realm.set(realm.global(), class_name, Value::from(&wrapper))? {
        return Ok(HookOutcome::Rejected);
    }
    engine.registry().insert(&original);
    engine.registry().insert(&wrapper);
    Ok(HookOutcome::Installed)
}
