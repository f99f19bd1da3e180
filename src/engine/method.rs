//! Method interception

use super::{callback, shared_behavior_object, Engine, HookOptions, HookOutcome};
use crate::error::HookError;
use fphook_host::{Callable, Realm, Value};

pub(super) fn install(
    engine: &Engine,
    realm: &Realm,
    target: &Value,
    method_name: &str,
    api: &str,
    options: &HookOptions,
) -> Result<HookOutcome, HookError> {
    let holder = if options.static_member {
        target.as_object().cloned()
    } else {
        shared_behavior_object(realm, target)?
    };
    let Some(holder) = holder else {
        return Ok(HookOutcome::Missing);
    };

    let original = realm.get(&Value::from(&holder), method_name)?;
    let original_fn = match &original {
        Value::Undefined | Value::Null => return Ok(HookOutcome::Missing),
        Value::Object(obj) if obj.is_callable() => obj.clone(),
        _ => return Ok(HookOutcome::NotCallable),
    };
    if engine.registry().contains(&original_fn) {
        return Ok(HookOutcome::AlreadyHooked);
    }

    // An inherited original is still reachable unwrapped through other
    // objects; only an own original is marked hooked.
    let shadows_inherited = !holder.has_own_property(method_name);

    let source = original_fn
        .source()
        .unwrap_or_else(|| Callable::native_source(method_name));
    let wrapper = {
        let engine = engine.clone();
        let api = api.to_string();
        let method = method_name.to_string();
        let callback_method = format!("{}_cb", method_name);
        let options = options.clone();

        realm
            .function(method_name)
            .source(source)
            .call(move |realm, this, args| {
                engine.reporter().send(realm, &api, &method);

                let mut args = args.to_vec();
                if let Some(index) = options.arg_index_to_wrap {
                    callback::wrap_argument(&engine, realm, &mut args, index, &api, &callback_method);
                }

                let result = realm.call(&original, this, &args)?;

                if let Some(on_return) = &options.on_return {
                    engine.guard().run("on_return", (), || {
                        on_return(realm, &engine, &result);
                        Ok(())
                    });
                }
                Ok(result)
            })
            .build()
    };

    if !realm.set(&holder, method_name, Value::from(&wrapper))? {
        return Ok(HookOutcome::Rejected);
    }
    if !shadows_inherited {
        engine.registry().insert(&original_fn);
    }
    engine.registry().insert(&wrapper);
    Ok(HookOutcome::Installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingSink;
    use crate::settings::{Settings, DEFAULT_BINDING};
    use fphook_host::{HostError, ObjectRef, PropertyDescriptor};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page() -> (Realm, RecordingSink, Engine) {
        let realm = Realm::new();
        let sink = RecordingSink::install(&realm, DEFAULT_BINDING).unwrap();
        let engine = Engine::new(&Settings::default());
        (realm, sink, engine)
    }

    #[test]
    fn wraps_prototype_method_and_forwards_receiver() {
        let (realm, sink, engine) = page();
        let canvas = realm
            .class("HTMLCanvasElement")
            .constructor(|_realm, this, _args| {
                this.insert_property("id", PropertyDescriptor::data("c1"));
                Ok(())
            })
            .method("toDataURL", |realm, this, args| {
                let id = realm.get(this, "id")?;
                Ok(Value::from(format!("{}:{}", id, args.len())))
            })
            .install();

        let outcome = engine.hook_method(
            &realm,
            &Value::from(&canvas),
            "toDataURL",
            "canvas",
            &HookOptions::default(),
        );
        assert_eq!(outcome, HookOutcome::Installed);

        let instance = realm.construct(&Value::from(&canvas), &[]).unwrap();
        let method = realm.get(&instance, "toDataURL").unwrap();
        let out = realm.call(&method, &instance, &[Value::from("image/png")]).unwrap();
        assert_eq!(out, Value::from("c1:1"));
        assert_eq!(sink.count("canvas", "toDataURL"), 1);
        assert!(engine.is_hooked(&method));
    }

    #[test]
    fn second_hook_is_a_no_op() {
        let (realm, sink, engine) = page();
        let math = realm.new_object();
        let random = realm.new_function("random", |_realm, _this, _args| Ok(Value::from(0.5)));
        math.insert_property("random", PropertyDescriptor::method(&random));
        let target = Value::from(&math);

        let opts = HookOptions::default();
        assert!(engine.hook_method(&realm, &target, "random", "math", &opts).is_installed());
        assert_eq!(
            engine.hook_method(&realm, &target, "random", "math", &opts),
            HookOutcome::AlreadyHooked
        );

        let wrapped = realm.get(&target, "random").unwrap();
        realm.call(&wrapped, &target, &[]).unwrap();
        assert_eq!(sink.len(), 1);
        assert!(engine.is_hooked(&Value::from(&random)));
    }

    #[test]
    fn wrapper_keeps_name_and_source() {
        let (realm, _sink, engine) = page();
        let math = realm.new_object();
        math.insert_property(
            "sqrt",
            PropertyDescriptor::method(realm.new_function("sqrt", |_realm, _this, _args| {
                Ok(Value::Undefined)
            })),
        );
        let target = Value::from(&math);
        engine.hook_method(&realm, &target, "sqrt", "math", &HookOptions::default());

        let wrapped = realm.get(&target, "sqrt").unwrap();
        let func = wrapped.as_object().unwrap();
        assert_eq!(realm.get(&wrapped, "name").unwrap(), Value::from("sqrt"));
        assert_eq!(
            realm.function_to_string(func).unwrap(),
            "function sqrt() { [native code] }"
        );
    }

    #[test]
    fn report_precedes_original_side_effect() {
        let (realm, sink, engine) = page();
        let log = Rc::new(RefCell::new(Vec::new()));
        let xhr = realm.new_object();
        let seen = log.clone();
        let sink_view = sink.clone();
        xhr.insert_property(
            "send",
            PropertyDescriptor::method(realm.new_function("send", move |_realm, _this, _args| {
                seen.borrow_mut().push(sink_view.len());
                Ok(Value::Undefined)
            })),
        );
        let target = Value::from(&xhr);
        engine.hook_method(&realm, &target, "send", "network", &HookOptions::default());

        let send = realm.get(&target, "send").unwrap();
        realm.call(&send, &target, &[]).unwrap();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn original_errors_propagate_unchanged() {
        let (realm, sink, engine) = page();
        let storage = realm.new_object();
        storage.insert_property(
            "setItem",
            PropertyDescriptor::method(realm.new_function("setItem", |_realm, _this, _args| {
                Err(HostError::thrown("QuotaExceededError"))
            })),
        );
        let target = Value::from(&storage);
        engine.hook_method(&realm, &target, "setItem", "localStorage", &HookOptions::default());

        let set_item = realm.get(&target, "setItem").unwrap();
        let err = realm.call(&set_item, &target, &[]).unwrap_err();
        assert_eq!(err, HostError::thrown("QuotaExceededError"));
        assert_eq!(sink.count("localStorage", "setItem"), 1);
    }

    #[test]
    fn callback_argument_reports_with_cb_suffix() {
        let (realm, sink, engine) = page();
        let geolocation = realm.new_object();
        geolocation.insert_property(
            "getCurrentPosition",
            PropertyDescriptor::method(realm.new_function(
                "getCurrentPosition",
                |realm, _this, args| {
                    let position = Value::from("pos");
                    realm.call(&args[0], &Value::Undefined, &[position])
                },
            )),
        );
        let target = Value::from(&geolocation);
        engine.hook_method(
            &realm,
            &target,
            "getCurrentPosition",
            "geolocation",
            &HookOptions::default().wrap_arg(0),
        );

        let on_success = realm.new_function("onSuccess", |_realm, _this, args| {
            Ok(Value::from(format!("got {}", args[0])))
        });
        let method = realm.get(&target, "getCurrentPosition").unwrap();
        let out = realm.call(&method, &target, &[Value::from(&on_success)]).unwrap();

        assert_eq!(out, Value::from("got pos"));
        assert_eq!(sink.count("geolocation", "getCurrentPosition"), 1);
        assert_eq!(sink.count("geolocation", "getCurrentPosition_cb"), 1);
    }

    #[test]
    fn on_return_runs_with_result_and_its_faults_are_absorbed() {
        let (realm, _sink, engine) = page();
        let window = realm.new_object();
        window.insert_property(
            "matchMedia",
            PropertyDescriptor::method(realm.new_function("matchMedia", |realm, _this, _args| {
                Ok(Value::from(realm.new_object()))
            })),
        );
        let target = Value::from(&window);
        let results = Rc::new(RefCell::new(Vec::new()));
        let seen = results.clone();
        let options = HookOptions::default().on_return(move |_realm, _engine, result| {
            seen.borrow_mut().push(result.clone());
            panic!("continuation blew up");
        });
        engine.hook_method(&realm, &target, "matchMedia", "mediaQuery", &options);

        let match_media = realm.get(&target, "matchMedia").unwrap();
        let mql = realm.call(&match_media, &target, &[]).unwrap();
        assert_eq!(*results.borrow(), vec![mql]);
    }

    #[test]
    fn missing_and_non_callable_members_are_reported_as_such() {
        let (realm, sink, engine) = page();
        let screen = realm.new_object();
        screen.insert_property("width", PropertyDescriptor::data(1920));
        let target = Value::from(&screen);
        let opts = HookOptions::default();

        assert_eq!(engine.hook_method(&realm, &target, "nope", "x", &opts), HookOutcome::Missing);
        assert_eq!(
            engine.hook_method(&realm, &target, "width", "x", &opts),
            HookOutcome::NotCallable
        );
        assert_eq!(
            engine.hook_method(&realm, &Value::Undefined, "width", "x", &opts),
            HookOutcome::Missing
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn frozen_holder_rejects_the_wrapper() {
        let (realm, _sink, engine) = page();
        let wasm = realm.new_object();
        let compile = realm.new_function("compile", |_realm, _this, _args| Ok(Value::Undefined));
        wasm.insert_property("compile", PropertyDescriptor::method(&compile));
        wasm.freeze();
        let target = Value::from(&wasm);

        assert_eq!(
            engine.hook_method(&realm, &target, "compile", "wasm", &HookOptions::default()),
            HookOutcome::Rejected
        );
        assert_eq!(realm.get(&target, "compile").unwrap(), Value::from(&compile));
        assert!(!engine.is_hooked(&Value::from(&compile)));
    }

    #[test]
    fn shadowing_an_inherited_method_leaves_the_base_unmarked() {
        let (realm, sink, engine) = page();
        let listen = realm.new_function("addEventListener", |_realm, _this, _args| {
            Ok(Value::Undefined)
        });
        let base = realm.new_object();
        base.insert_property("addEventListener", PropertyDescriptor::method(&listen));
        let media = ObjectRef::new(Some(base.clone()));
        let window = ObjectRef::new(Some(base.clone()));
        let opts = HookOptions::default();

        assert!(engine
            .hook_method(&realm, &Value::from(&media), "addEventListener", "mediaQuery", &opts)
            .is_installed());
        assert!(!engine.is_hooked(&Value::from(&listen)));
        assert_eq!(
            engine.hook_method(&realm, &Value::from(&media), "addEventListener", "mediaQuery", &opts),
            HookOutcome::AlreadyHooked
        );
        assert!(engine
            .hook_method(&realm, &Value::from(&window), "addEventListener", "window", &opts)
            .is_installed());

        let base_listen = realm.get(&Value::from(&base), "addEventListener").unwrap();
        assert_eq!(base_listen, Value::from(&listen));
        realm.call(&base_listen, &Value::from(&base), &[]).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn static_member_is_hooked_on_the_class_itself() {
        let (realm, sink, engine) = page();
        let date = realm
            .class("Date")
            .method("getTime", |_realm, _this, _args| Ok(Value::from(1.0)))
            .static_method("now", |_realm, _this, _args| Ok(Value::from(2.0)))
            .install();
        let target = Value::from(&date);

        assert_eq!(
            engine.hook_method(&realm, &target, "now", "time", &HookOptions::default()),
            HookOutcome::Missing
        );
        assert!(engine
            .hook_method(&realm, &target, "now", "time", &HookOptions::default().static_member())
            .is_installed());

        let now = realm.get(&target, "now").unwrap();
        assert_eq!(realm.call(&now, &target, &[]).unwrap(), Value::from(2.0));
        assert_eq!(sink.count("time", "now"), 1);
    }

    #[test]
    fn throwing_accessor_faults_without_escaping() {
        let (realm, _sink, engine) = page();
        let hostile = realm.new_object();
        let getter = realm.new_function("get boom", |_realm, _this, _args| {
            Err(HostError::thrown("denied"))
        });
        hostile.insert_property("boom", PropertyDescriptor::accessor(Some(getter), None));

        assert_eq!(
            engine.hook_method(&realm, &Value::from(&hostile), "boom", "x", &HookOptions::default()),
            HookOutcome::Faulted
        );
    }
}
