use fphook::host::{PropertyDescriptor, Realm, Value};
use fphook::{Engine, HookOptions, HookOutcome, RecordingSink, Settings, DEFAULT_BINDING};
use std::cell::RefCell;
use std::rc::Rc;

fn page(optimize_events: bool) -> (Realm, RecordingSink, Engine) {
    let realm = Realm::new();
    let sink = RecordingSink::install(&realm, DEFAULT_BINDING).unwrap();
    let engine = Engine::new(&Settings::default().with_optimize_events(optimize_events));
    (realm, sink, engine)
}

fn call_method(realm: &Realm, target: &Value, name: &str, args: &[Value]) -> Value {
    let func = realm.get(target, name).unwrap();
    realm.call(&func, target, args).unwrap()
}

#[test]
fn getter_read_twice_with_dedup_reports_once_and_returns_value() {
    let (realm, sink, engine) = page(true);
    let device = realm
        .class("Device")
        .constructor(|_realm, _this, _args| Ok(()))
        .getter("answer", |_realm, _this| Ok(Value::from(42)))
        .install();

    let outcome = engine.hook_getter(&realm, &Value::from(&device), "answer", "device");
    assert_eq!(outcome, HookOutcome::Installed);

    let instance = realm.construct(&Value::from(&device), &[]).unwrap();
    assert_eq!(realm.get(&instance, "answer").unwrap(), Value::from(42));
    assert_eq!(realm.get(&instance, "answer").unwrap(), Value::from(42));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].api, "device");
    assert_eq!(events[0].method, "answer");
    assert!(events[0].stacktrace.contains("at get answer"));
}

#[test]
fn dedup_off_reports_every_call() {
    let (realm, sink, engine) = page(false);
    let math = realm.new_object();
    math.insert_property(
        "random",
        PropertyDescriptor::method(realm.new_function("random", |_realm, _this, _args| {
            Ok(Value::from(0.5))
        })),
    );
    let target = Value::from(&math);
    engine.hook_method(&realm, &target, "random", "math", &HookOptions::default());

    for _ in 0..5 {
        assert_eq!(call_method(&realm, &target, "random", &[]), Value::from(0.5));
    }
    assert_eq!(sink.count("math", "random"), 5);
}

#[test]
fn dedup_on_reports_each_key_once_across_primitives() {
    let (realm, sink, engine) = page(true);
    let canvas = realm
        .class("HTMLCanvasElement")
        .constructor(|_realm, _this, _args| Ok(()))
        .method("toDataURL", |_realm, _this, _args| Ok(Value::from("data:,")))
        .method("getContext", |_realm, _this, _args| Ok(Value::Null))
        .install();
    let class = Value::from(&canvas);
    for name in ["toDataURL", "getContext"] {
        engine.hook_method(&realm, &class, name, "canvas", &HookOptions::default());
    }

    let a = realm.construct(&class, &[]).unwrap();
    let b = realm.construct(&class, &[]).unwrap();
    for instance in [&a, &b, &a] {
        call_method(&realm, instance, "toDataURL", &[]);
        call_method(&realm, instance, "getContext", &[Value::from("2d")]);
    }

    assert_eq!(sink.count("canvas", "toDataURL"), 1);
    assert_eq!(sink.count("canvas", "getContext"), 1);
    assert_eq!(engine.reporter().seen_keys(), 2);
}

#[test]
fn hooking_twice_installs_one_wrapper() {
    let (realm, sink, engine) = page(false);
    let screen = realm
        .class("Screen")
        .getter("width", |_realm, _this| Ok(Value::from(1920)))
        .method("lock", |_realm, _this, _args| Ok(Value::Undefined))
        .install();
    let target = Value::from(&screen);
    let opts = HookOptions::default();

    assert!(engine.hook_method(&realm, &target, "lock", "screen", &opts).is_installed());
    let first = realm.get(&realm.get(&target, "prototype").unwrap(), "lock").unwrap();
    assert_eq!(
        engine.hook_method(&realm, &target, "lock", "screen", &opts),
        HookOutcome::AlreadyHooked
    );
    assert!(engine.hook_getter(&realm, &target, "width", "screen").is_installed());
    assert_eq!(
        engine.hook_getter(&realm, &target, "width", "screen"),
        HookOutcome::AlreadyHooked
    );

    let instance = realm.new_instance(&screen).unwrap();
    let instance = Value::from(instance);
    assert_eq!(realm.get(&instance, "lock").unwrap(), first);
    call_method(&realm, &instance, "lock", &[]);
    realm.get(&instance, "width").unwrap();
    assert_eq!(sink.len(), 2);
}

#[test]
fn wrappers_are_transparent() {
    let (realm, _sink, engine) = page(false);
    let format = realm
        .class("NumberFormat")
        .constructor(|_realm, this, args| {
            let locale = args.first().cloned().unwrap_or_else(|| Value::from("en-US"));
            this.insert_property("locale", PropertyDescriptor::data(locale));
            Ok(())
        })
        .method("format", |realm, this, args| {
            let locale = realm.get(this, "locale")?;
            Ok(Value::from(format!("{}:{}", locale, args[0])))
        })
        .install();
    let class = Value::from(&format);

    let plain = realm.construct(&class, &[Value::from("de-DE")]).unwrap();
    let expected = call_method(&realm, &plain, "format", &[Value::from(12.5)]);

    engine.hook_method(&realm, &class, "format", "intl", &HookOptions::default());
    engine.hook_constructor(&realm, "NumberFormat", "intl", &HookOptions::default());

    let bound = realm.get(&realm.global_value(), "NumberFormat").unwrap();
    let wrapped = realm.construct(&bound, &[Value::from("de-DE")]).unwrap();
    assert_eq!(call_method(&realm, &wrapped, "format", &[Value::from(12.5)]), expected);
    assert!(realm.instance_of(&wrapped, &class).unwrap());
    assert!(realm.instance_of(&plain, &bound).unwrap());
}

#[test]
fn report_reaches_sink_before_original_runs() {
    let realm = Realm::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let sink_log = order.clone();
    let sink = realm.new_function("sink", move |_realm, _this, args| {
        sink_log.borrow_mut().push(format!("report {}", args[0]));
        Ok(Value::Undefined)
    });
    realm
        .global()
        .insert_property(DEFAULT_BINDING, PropertyDescriptor::method(sink));

    let effect_log = order.clone();
    let xhr = realm
        .class("XMLHttpRequest")
        .constructor(|_realm, _this, _args| Ok(()))
        .method("send", move |_realm, _this, _args| {
            effect_log.borrow_mut().push("send".to_string());
            Ok(Value::Undefined)
        })
        .install();

    let engine = Engine::new(&Settings::default());
    engine.hook_method(&realm, &Value::from(&xhr), "send", "network", &HookOptions::default());
    engine.hook_constructor(&realm, "XMLHttpRequest", "network", &HookOptions::default());

    let bound = realm.get(&realm.global_value(), "XMLHttpRequest").unwrap();
    let request = realm.construct(&bound, &[]).unwrap();
    call_method(&realm, &request, "send", &[]);

    let order = order.borrow();
    assert_eq!(order.len(), 3);
    assert!(order[0].contains(r#""method":"constructor""#));
    assert!(order[1].contains(r#""method":"send""#));
    assert_eq!(order[2], "send");
}

#[test]
fn callback_adds_one_report_and_keeps_context_and_result() {
    let (realm, sink, engine) = page(true);
    let receiver = Rc::new(RefCell::new(None));
    let geolocation = realm.new_object();
    geolocation.insert_property(
        "watchPosition",
        PropertyDescriptor::method(realm.new_function("watchPosition", |realm, this, args| {
            let first = realm.call(&args[0], this, &[Value::from("fix-1")])?;
            realm.call(&args[0], this, &[Value::from("fix-2")])?;
            Ok(first)
        })),
    );
    let target = Value::from(&geolocation);
    engine.hook_method(
        &realm,
        &target,
        "watchPosition",
        "geolocation",
        &HookOptions::default().wrap_arg(0),
    );

    let seen = receiver.clone();
    let on_fix = realm.new_function("onFix", move |_realm, this, args| {
        *seen.borrow_mut() = Some(this.clone());
        Ok(Value::from(format!("handled {}", args[0])))
    });
    let out = call_method(&realm, &target, "watchPosition", &[Value::from(&on_fix)]);

    assert_eq!(out, Value::from("handled fix-1"));
    assert_eq!(*receiver.borrow(), Some(target.clone()));
    assert_eq!(sink.count("geolocation", "watchPosition"), 1);
    assert_eq!(sink.count("geolocation", "watchPosition_cb"), 1);
    assert_eq!(sink.len(), 2);
}

#[test]
fn constructor_callback_is_tagged_callback() {
    let (realm, sink, engine) = page(false);
    realm
        .class("IntersectionObserver")
        .constructor(|realm, _this, args| {
            realm.call(&args[0], &Value::Undefined, &[])?;
            Ok(())
        })
        .install();
    engine.hook_constructor(
        &realm,
        "IntersectionObserver",
        "observer",
        &HookOptions::default().wrap_arg(0),
    );

    let callback = realm.new_function("cb", |_realm, _this, _args| Ok(Value::Undefined));
    let bound = realm.get(&realm.global_value(), "IntersectionObserver").unwrap();
    realm.construct(&bound, &[Value::from(callback)]).unwrap();

    let methods: Vec<String> = sink.events().into_iter().map(|e| e.method).collect();
    assert_eq!(methods, vec!["constructor", "callback"]);
}

#[test]
fn custom_binding_routes_events_to_that_sink() {
    let realm = Realm::new();
    let default_sink = RecordingSink::install(&realm, DEFAULT_BINDING).unwrap();
    let custom_sink = RecordingSink::install(&realm, "__probe__").unwrap();
    let settings = Settings::default().with_binding("__probe__");
    let engine = Engine::new(&settings);

    let wasm = realm.new_object();
    wasm.insert_property(
        "compile",
        PropertyDescriptor::method(realm.new_function("compile", |_realm, _this, _args| {
            Ok(Value::Undefined)
        })),
    );
    let target = Value::from(&wasm);
    engine.hook_method(&realm, &target, "compile", "wasm", &HookOptions::default());
    call_method(&realm, &target, "compile", &[]);

    assert!(default_sink.is_empty());
    assert_eq!(custom_sink.count("wasm", "compile"), 1);
    assert_eq!(engine.reporter().binding(), "__probe__");
}
