//! Callback argument wrapping

use super::Engine;
use fphook_host::{Callable, Realm, Value};

/// Replace `args[index]` with a function that reports `(api, method)` each
/// time it fires, then forwards to the original callback with the receiver
/// and arguments it was fired with. Non-callable or absent arguments are
/// left alone.
pub(super) fn wrap_argument(
    engine: &Engine,
    realm: &Realm,
    args: &mut [Value],
    index: usize,
    api: &str,
    method: &str,
) {
    let Some(slot) = args.get_mut(index) else {
        return;
    };
    let Some(original) = slot.as_object().filter(|obj| obj.is_callable()).cloned() else {
        return;
    };

    let name = original.callable_name();
    let source = original
        .source()
        .unwrap_or_else(|| Callable::native_source(&name));
    let engine = engine.clone();
    let api = api.to_string();
    let method = method.to_string();
    let target = Value::from(&original);

    let forwarder = realm
        .function(&name)
        .source(source)
        .call(move |realm, this, cb_args| {
            engine.reporter().send(realm, &api, &method);
            realm.call(&target, this, cb_args)
        })
        .build();
    *slot = Value::from(forwarder);
}
