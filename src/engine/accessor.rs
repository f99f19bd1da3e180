//! Getter interception

use super::{shared_behavior_object, Engine, HookOutcome};
use crate::error::HookError;
use fphook_host::{Callable, PropertyDescriptor, PropertyKind, Realm, Value};

pub(super) fn install(
    engine: &Engine,
    realm: &Realm,
    target: &Value,
    prop_name: &str,
    api: &str,
) -> Result<HookOutcome, HookError> {
    let Some(holder) = shared_behavior_object(realm, target)? else {
        return Ok(HookOutcome::Missing);
    };

    // nearest own descriptor wins, even when it is a data property
    let mut current = Some(holder.clone());
    let mut found = None;
    while let Some(obj) = current {
        if let Some(desc) = realm.get_own_property(&obj, prop_name) {
            found = Some((obj, desc));
            break;
        }
        current = realm.get_prototype_of(&obj);
    }
    let Some((owner, desc)) = found else {
        return Ok(HookOutcome::Missing);
    };
    let Some(original_get) = desc.getter().cloned() else {
        return Ok(HookOutcome::NotCallable);
    };
    if engine.registry().contains(&original_get) {
        return Ok(HookOutcome::AlreadyHooked);
    }

    let getter_name = format!("get {}", prop_name);
    let source = original_get
        .source()
        .unwrap_or_else(|| Callable::native_source(&getter_name));
    let wrapper = {
        let engine = engine.clone();
        let api = api.to_string();
        let prop = prop_name.to_string();
        let original = Value::from(&original_get);

        realm
            .function(&getter_name)
            .source(source)
            .call(move |realm, this, _args| {
                engine.reporter().send(realm, &api, &prop);
                realm.call(&original, this, &[])
            })
            .build()
    };

    let replacement = PropertyDescriptor {
        kind: PropertyKind::Accessor {
            get: Some(wrapper.clone()),
            set: desc.setter().cloned(),
        },
        enumerable: desc.enumerable,
        configurable: desc.configurable,
    };
    if let Err(err) = realm.define_property(&holder, prop_name, replacement) {
        tracing::debug!(prop = prop_name, "getter replacement refused: {}", err);
        return Ok(HookOutcome::Rejected);
    }
    // an inherited getter still serves the owner's other descendants
    if owner.ptr_eq(&holder) {
        engine.registry().insert(&original_get);
    }
    engine.registry().insert(&wrapper);
    Ok(HookOutcome::Installed)
}
