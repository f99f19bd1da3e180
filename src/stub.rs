//! Stub browser page
//!
//! A realm populated with browser-shaped interfaces for every surface the
//! built-in catalog names: interface objects with shared-behavior objects,
//! accessor-backed singletons (`navigator`, `screen`), plain namespaces
//! (`Math`, `WebAssembly`, `Intl`) and observer constructors. Values are
//! fixed so probes are reproducible.
//!
//! `webkitAudioContext` and `navigator.bluetooth` are left out on purpose,
//! as on most pages, so catalogs always meet some absent targets.

use fphook_host::{HostResult, ObjectRef, PropertyDescriptor, Realm, Value};
use serde::Serialize;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn num_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).and_then(Value::as_number).unwrap_or(f64::NAN)
}

/// Plain object with the given data properties.
fn record(realm: &Realm, fields: &[(&str, Value)]) -> ObjectRef {
    let obj = realm.new_object();
    for (key, value) in fields {
        obj.insert_property(*key, PropertyDescriptor::data(value.clone()));
    }
    obj
}

fn method(realm: &Realm, target: &ObjectRef, name: &str, value: Value) {
    let func = realm.new_function(name, move |_realm, _this, _args| Ok(value.clone()));
    target.insert_property(name, PropertyDescriptor::method(func));
}

fn global_data(realm: &Realm, name: &str, value: impl Into<Value>) {
    realm
        .global()
        .insert_property(name, PropertyDescriptor::method(value));
}

fn global_getter(realm: &Realm, name: &str, value: Value) {
    let getter = realm.new_function(&format!("get {}", name), move |_realm, _this, _args| {
        Ok(value.clone())
    });
    realm
        .global()
        .insert_property(name, PropertyDescriptor::accessor(Some(getter), None));
}

/// A page realm with the stub browser surface installed.
pub struct StubPage {
    realm: Realm,
}

impl StubPage {
    pub fn new() -> Self {
        let realm = Realm::new();
        install_dom(&realm);
        install_canvas(&realm);
        install_audio(&realm);
        install_navigator(&realm);
        install_screen(&realm);
        install_network(&realm);
        install_timing(&realm);
        install_storage(&realm);
        install_intl(&realm);
        install_namespaces(&realm);
        install_observers(&realm);
        Self { realm }
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn into_realm(self) -> Realm {
        self.realm
    }
}

impl Default for StubPage {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Interfaces
// ============================================================================

fn install_dom(realm: &Realm) {
    let event_target = realm
        .class("EventTarget")
        .constructor(|_realm, _this, _args| Ok(()))
        .method("addEventListener", |_realm, _this, _args| Ok(Value::Undefined))
        .method("removeEventListener", |_realm, _this, _args| Ok(Value::Undefined))
        .install();

    let window = realm.class("Window").extends(&event_target).install();
    let window_proto = realm
        .get(&Value::from(&window), "prototype")
        .ok()
        .and_then(|proto| proto.as_object().cloned());
    realm.global().set_prototype(window_proto);

    let element = realm
        .class("Element")
        .extends(&event_target)
        .method("getBoundingClientRect", |realm, _this, _args| {
            let rect = record(
                realm,
                &[
                    ("x", 8.into()),
                    ("y", 8.into()),
                    ("width", 300.into()),
                    ("height", 150.into()),
                ],
            );
            Ok(Value::from(rect))
        })
        .method("getClientRects", |realm, _this, _args| {
            Ok(Value::from(record(realm, &[("length", 1.into())])))
        })
        .getter("clientWidth", |_realm, _this| Ok(300.into()))
        .getter("clientHeight", |_realm, _this| Ok(150.into()))
        .getter("scrollWidth", |_realm, _this| Ok(300.into()))
        .getter("scrollHeight", |_realm, _this| Ok(150.into()))
        .install();

    let html_element = realm
        .class("HTMLElement")
        .extends(&element)
        .getter("offsetWidth", |_realm, _this| Ok(300.into()))
        .getter("offsetHeight", |_realm, _this| Ok(150.into()))
        .install();

    let svg_element = realm.class("SVGElement").extends(&element).install();
    let svg_graphics = realm
        .class("SVGGraphicsElement")
        .extends(&svg_element)
        .method("getBBox", |realm, _this, _args| {
            let bbox = record(
                realm,
                &[("x", 0.into()), ("y", 0.into()), ("width", 100.into()), ("height", 20.into())],
            );
            Ok(Value::from(bbox))
        })
        .install();
    let svg_text = realm
        .class("SVGTextContentElement")
        .extends(&svg_graphics)
        .method("getComputedTextLength", |_realm, _this, _args| Ok(Value::from(87.5)))
        .install();

    let media_query_list = realm
        .class("MediaQueryList")
        .extends(&event_target)
        .getter("matches", |realm, this| {
            let media = realm.get(this, "media")?.to_string();
            Ok(Value::from(media.contains("prefers-color-scheme: light")))
        })
        .build();

    let computed = realm.new_function("getComputedStyle", |realm, _this, _args| {
        let style = record(
            realm,
            &[("fontFamily", "Arial".into()), ("fontSize", "16px".into())],
        );
        Ok(Value::from(style))
    });
    global_data(realm, "getComputedStyle", computed);

    let match_media = realm.new_function("matchMedia", move |realm, _this, args| {
        let mql = realm.new_instance(&media_query_list)?;
        mql.insert_property("media", PropertyDescriptor::data(arg(args, 0).to_string()));
        Ok(Value::from(mql))
    });
    global_data(realm, "matchMedia", match_media);

    global_getter(realm, "devicePixelRatio", 1.into());
    global_getter(realm, "innerWidth", 1280.into());
    global_getter(realm, "innerHeight", 720.into());

    let font_face_set = realm
        .class("FontFaceSet")
        .extends(&event_target)
        .method("load", |realm, _this, _args| Ok(Value::from(realm.new_object())))
        .method("check", |_realm, _this, args| {
            let font = arg(args, 0).to_string();
            Ok(Value::from(font.contains("Arial") || font.contains("sans-serif")))
        })
        .build();
    let fonts = new_singleton(realm, &font_face_set);

    let plain_element = html_element.clone();
    let document = realm.new_object();
    document.insert_property("fonts", PropertyDescriptor::data(fonts));
    let create_element = realm.new_function("createElement", move |realm, _this, args| {
        let tag = arg(args, 0).to_string().to_ascii_lowercase();
        let class = match tag.as_str() {
            "canvas" => realm.resolve_path("HTMLCanvasElement")?,
            "text" => Value::from(&svg_text),
            _ => Value::from(&plain_element),
        };
        let class = class.as_object().cloned().unwrap_or_else(|| plain_element.clone());
        Ok(Value::from(realm.new_instance(&class)?))
    });
    document.insert_property("createElement", PropertyDescriptor::method(create_element));
    global_data(realm, "document", document);
}

fn install_canvas(realm: &Realm) {
    let context_2d = realm
        .class("CanvasRenderingContext2D")
        .method("getImageData", |realm, _this, args| {
            let width = num_arg(args, 2);
            let height = num_arg(args, 3);
            let data = record(
                realm,
                &[("width", width.into()), ("height", height.into()), ("colorSpace", "srgb".into())],
            );
            Ok(Value::from(data))
        })
        .method("measureText", |realm, _this, args| {
            let text = arg(args, 0).to_string();
            let metrics = record(realm, &[("width", (text.chars().count() as f64 * 7.25).into())]);
            Ok(Value::from(metrics))
        })
        .method("isPointInPath", |_realm, _this, _args| Ok(false.into()))
        .method("fillText", |_realm, _this, _args| Ok(Value::Undefined))
        .method("strokeText", |_realm, _this, _args| Ok(Value::Undefined))
        .install();

    let webgl = webgl_class(realm, "WebGLRenderingContext");
    let webgl2 = webgl_class(realm, "WebGL2RenderingContext");

    let html_element = match realm.resolve_path("HTMLElement") {
        Ok(Value::Object(obj)) => obj,
        _ => return,
    };
    realm
        .class("HTMLCanvasElement")
        .extends(&html_element)
        .method("toDataURL", |_realm, _this, args| {
            let mime = match arg(args, 0) {
                Value::String(mime) => mime,
                _ => "image/png".to_string(),
            };
            Ok(Value::from(format!("data:{};base64,iVBORw0KGgoAAAANSUhEUg==", mime)))
        })
        .method("toBlob", |realm, _this, args| {
            let blob = record(realm, &[("size", 2048.into()), ("type", "image/png".into())]);
            realm.call(&arg(args, 0), &Value::Undefined, &[Value::from(blob)])?;
            Ok(Value::Undefined)
        })
        .method("getContext", move |realm, _this, args| {
            let class = match arg(args, 0).to_string().as_str() {
                "2d" => &context_2d,
                "webgl" | "experimental-webgl" => &webgl,
                "webgl2" => &webgl2,
                _ => return Ok(Value::Null),
            };
            Ok(Value::from(realm.new_instance(class)?))
        })
        .getter("width", |_realm, _this| Ok(300.into()))
        .getter("height", |_realm, _this| Ok(150.into()))
        .install();
}

fn webgl_class(realm: &Realm, name: &str) -> ObjectRef {
    realm
        .class(name)
        .method("getParameter", |_realm, _this, args| {
            // UNMASKED_VENDOR_WEBGL / UNMASKED_RENDERER_WEBGL
            let value: Value = match num_arg(args, 0) as u32 {
                0x9245 => "Google Inc. (Intel)".into(),
                0x9246 => "ANGLE (Intel, Mesa Intel(R) UHD Graphics 620)".into(),
                _ => Value::Null,
            };
            Ok(value)
        })
        .method("getExtension", |realm, _this, args| {
            if arg(args, 0).to_string() == "WEBGL_debug_renderer_info" {
                let ext = record(
                    realm,
                    &[("UNMASKED_VENDOR_WEBGL", 0x9245.into()), ("UNMASKED_RENDERER_WEBGL", 0x9246.into())],
                );
                return Ok(Value::from(ext));
            }
            Ok(Value::Null)
        })
        .method("readPixels", |_realm, _this, _args| Ok(Value::Undefined))
        .method("compileShader", |_realm, _this, _args| Ok(Value::Undefined))
        .method("linkProgram", |_realm, _this, _args| Ok(Value::Undefined))
        .install()
}

fn install_audio(realm: &Realm) {
    let node = |realm: &Realm, kind: &str| Value::from(record(realm, &[("kind", kind.into())]));
    let base = realm
        .class("BaseAudioContext")
        .method("createOscillator", move |realm, _this, _args| Ok(node(realm, "oscillator")))
        .method("createAnalyser", move |realm, _this, _args| Ok(node(realm, "analyser")))
        .method("createDynamicsCompressor", move |realm, _this, _args| {
            Ok(node(realm, "compressor"))
        })
        .method("createScriptProcessor", move |realm, _this, _args| Ok(node(realm, "processor")))
        .method("createMediaElementSource", move |realm, _this, _args| {
            Ok(node(realm, "media-element"))
        })
        .method("createMediaStreamSource", move |realm, _this, _args| {
            Ok(node(realm, "media-stream"))
        })
        .method("decodeAudioData", |realm, _this, args| {
            let buffer = record(realm, &[("duration", 1.into()), ("sampleRate", 44100.into())]);
            let buffer = Value::from(buffer);
            if arg(args, 1).is_callable() {
                realm.call(&arg(args, 1), &Value::Undefined, &[buffer.clone()])?;
            }
            Ok(buffer)
        })
        .getter("sampleRate", |_realm, _this| Ok(44100.into()))
        .install();

    realm
        .class("AudioContext")
        .extends(&base)
        .constructor(|_realm, _this, _args| Ok(()))
        .getter("baseLatency", |_realm, _this| Ok(Value::from(0.005)))
        .getter("outputLatency", |_realm, _this| Ok(Value::from(0.02)))
        .install();

    realm
        .class("OfflineAudioContext")
        .extends(&base)
        .constructor(|_realm, _this, _args| Ok(()))
        .method("startRendering", |realm, _this, _args| {
            Ok(Value::from(record(realm, &[("length", 44100.into())])))
        })
        .install();
}

fn install_navigator(realm: &Realm) {
    let geolocation_class = realm
        .class("Geolocation")
        .method("getCurrentPosition", |realm, _this, args| {
            let coords = record(
                realm,
                &[("latitude", Value::from(52.52)), ("longitude", Value::from(13.405))],
            );
            let position = record(realm, &[("coords", Value::from(coords))]);
            realm.call(&arg(args, 0), &Value::Undefined, &[Value::from(position)])?;
            Ok(Value::Undefined)
        })
        .method("watchPosition", |_realm, _this, _args| Ok(1.into()))
        .build();
    let geolocation = new_singleton(realm, &geolocation_class);

    let clipboard = realm.new_object();
    method(realm, &clipboard, "readText", "".into());
    method(realm, &clipboard, "writeText", Value::Undefined);

    let permissions = realm.new_object();
    let query = realm.new_function("query", |realm, _this, _args| {
        Ok(Value::from(record(realm, &[("state", "prompt".into())])))
    });
    permissions.insert_property("query", PropertyDescriptor::method(query));

    let usb = realm.new_object();
    method(realm, &usb, "requestDevice", Value::Null);

    let gpu = realm.new_object();
    method(realm, &gpu, "requestAdapter", Value::Null);

    let plugins = record(realm, &[("length", 5.into())]);
    let mime_types = record(realm, &[("length", 2.into())]);
    let languages = record(realm, &[("0", "en-US".into()), ("1", "en".into()), ("length", 2.into())]);

    let mut navigator = realm
        .class("Navigator")
        .method("getBattery", |realm, _this, _args| {
            Ok(Value::from(record(realm, &[("charging", true.into()), ("level", 1.into())])))
        })
        .method("getGamepads", |realm, _this, _args| {
            Ok(Value::from(record(realm, &[("length", 0.into())])))
        })
        .method("registerProtocolHandler", |_realm, _this, _args| Ok(Value::Undefined))
        .method("requestMediaKeySystemAccess", |_realm, _this, _args| Ok(Value::Null));

    let fixed: [(&str, Value); 20] = [
        ("userAgent", USER_AGENT.into()),
        ("appName", "Netscape".into()),
        ("appVersion", USER_AGENT.trim_start_matches("Mozilla/").into()),
        ("appCodeName", "Mozilla".into()),
        ("language", "en-US".into()),
        ("languages", languages.into()),
        ("platform", "Linux x86_64".into()),
        ("cookieEnabled", true.into()),
        ("product", "Gecko".into()),
        ("productSub", "20030107".into()),
        ("vendor", "Google Inc.".into()),
        ("vendorSub", "".into()),
        ("hardwareConcurrency", 8.into()),
        ("deviceMemory", 8.into()),
        ("maxTouchPoints", 0.into()),
        ("webdriver", false.into()),
        ("doNotTrack", Value::Null),
        ("plugins", plugins.into()),
        ("mimeTypes", mime_types.into()),
        ("geolocation", geolocation.into()),
    ];
    let linked: [(&str, Value); 4] = [
        ("clipboard", clipboard.into()),
        ("permissions", permissions.into()),
        ("usb", usb.into()),
        ("gpu", gpu.into()),
    ];
    for (name, value) in fixed.into_iter().chain(linked) {
        navigator = navigator.getter(name, move |_realm, _this| Ok(value.clone()));
    }
    let navigator = navigator.install();
    global_data(realm, "navigator", new_singleton(realm, &navigator));
}

fn install_screen(realm: &Realm) {
    let orientation = |realm: &Realm| {
        record(realm, &[("type", "landscape-primary".into()), ("angle", 0.into())])
    };
    let screen = realm
        .class("Screen")
        .extends(&event_target(realm))
        .getter("width", |_realm, _this| Ok(1920.into()))
        .getter("height", |_realm, _this| Ok(1080.into()))
        .getter("availWidth", |_realm, _this| Ok(1920.into()))
        .getter("availHeight", |_realm, _this| Ok(1040.into()))
        .getter("colorDepth", |_realm, _this| Ok(24.into()))
        .getter("pixelDepth", |_realm, _this| Ok(24.into()))
        .getter("orientation", move |realm, _this| Ok(Value::from(orientation(realm))))
        .getter("availTop", |_realm, _this| Ok(0.into()))
        .getter("availLeft", |_realm, _this| Ok(0.into()))
        .install();
    global_data(realm, "screen", new_singleton(realm, &screen));
}

fn install_network(realm: &Realm) {
    let fetch = realm.new_function("fetch", |realm, _this, args| {
        let response = record(realm, &[("url", arg(args, 0)), ("status", 200.into())]);
        Ok(Value::from(response))
    });
    global_data(realm, "fetch", fetch);

    realm
        .class("XMLHttpRequest")
        .extends(&event_target(realm))
        .constructor(|_realm, this, _args| {
            this.insert_property("readyState", PropertyDescriptor::data(0));
            Ok(())
        })
        .method("open", |realm, this, _args| {
            if let Some(xhr) = this.as_object() {
                realm.set(xhr, "readyState", 1.into())?;
            }
            Ok(Value::Undefined)
        })
        .method("send", |realm, this, _args| {
            if let Some(xhr) = this.as_object() {
                realm.set(xhr, "readyState", 4.into())?;
            }
            Ok(Value::Undefined)
        })
        .install();

    let description = |realm: &Realm, kind: &str| {
        Value::from(record(realm, &[("type", kind.into()), ("sdp", "v=0".into())]))
    };
    realm
        .class("RTCPeerConnection")
        .extends(&event_target(realm))
        .constructor(|_realm, _this, _args| Ok(()))
        .method("createOffer", move |realm, _this, _args| Ok(description(realm, "offer")))
        .method("createAnswer", move |realm, _this, _args| Ok(description(realm, "answer")))
        .method("setLocalDescription", |_realm, _this, _args| Ok(Value::Undefined))
        .method("setRemoteDescription", |_realm, _this, _args| Ok(Value::Undefined))
        .method("createDataChannel", |realm, _this, args| {
            Ok(Value::from(record(realm, &[("label", arg(args, 0))])))
        })
        .install();
}

/// Milliseconds since the epoch reported by the stub clock.
const STUB_NOW: f64 = 1_700_000_000_000.0;

fn install_timing(realm: &Realm) {
    realm
        .class("Date")
        .constructor(|_realm, this, args| {
            let time = match args.first().and_then(Value::as_number) {
                Some(ms) => ms,
                None => STUB_NOW,
            };
            this.insert_property("__time", PropertyDescriptor::data(time).hidden());
            Ok(())
        })
        .method("getTime", |realm, this, _args| realm.get(this, "__time"))
        .static_method("now", |_realm, _this, _args| Ok(Value::from(STUB_NOW)))
        .install();

    let performance = realm
        .class("Performance")
        .extends(&event_target(realm))
        .method("now", |_realm, _this, _args| Ok(Value::from(1234.5)))
        .method("getEntriesByType", |realm, _this, _args| {
            Ok(Value::from(record(realm, &[("length", 0.into())])))
        })
        .install();
    global_data(realm, "performance", new_singleton(realm, &performance));
}

fn install_storage(realm: &Realm) {
    let storage = realm
        .class("Storage")
        .method("getItem", |realm, this, args| {
            let key = format!("item:{}", arg(args, 0));
            let Some(store) = this.as_object() else {
                return Ok(Value::Null);
            };
            match store.get_own_property(&key) {
                Some(_) => realm.get(this, &key),
                None => Ok(Value::Null),
            }
        })
        .method("setItem", |_realm, this, args| {
            if let Some(store) = this.as_object() {
                let key = format!("item:{}", arg(args, 0));
                store.insert_property(key, PropertyDescriptor::data(arg(args, 1).to_string()).hidden());
            }
            Ok(Value::Undefined)
        })
        .install();
    global_data(realm, "localStorage", new_singleton(realm, &storage));
    global_data(realm, "sessionStorage", new_singleton(realm, &storage));

    let factory = realm
        .class("IDBFactory")
        .method("open", |realm, _this, args| {
            Ok(Value::from(record(realm, &[("name", arg(args, 0)), ("readyState", "pending".into())])))
        })
        .install();
    global_data(realm, "indexedDB", new_singleton(realm, &factory));
}

fn install_intl(realm: &Realm) {
    let intl = realm.new_object();
    for name in ["Collator", "NumberFormat", "DateTimeFormat"] {
        let class = realm
            .class(name)
            .constructor(|_realm, _this, _args| Ok(()))
            .method("resolvedOptions", |realm, _this, _args| {
                let options = record(
                    realm,
                    &[("locale", "en-US".into()), ("timeZone", "Europe/Berlin".into())],
                );
                Ok(Value::from(options))
            })
            .static_method("supportedLocalesOf", |realm, _this, args| {
                Ok(Value::from(record(realm, &[("0", arg(args, 0)), ("length", 1.into())])))
            })
            .build();
        intl.insert_property(name, PropertyDescriptor::method(class));
    }
    global_data(realm, "Intl", intl);
}

fn install_namespaces(realm: &Realm) {
    let math = realm.new_object();
    let unary: [(&str, fn(f64) -> f64); 7] = [
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("acos", f64::acos),
        ("asin", f64::asin),
        ("atan", f64::atan),
        ("sqrt", f64::sqrt),
    ];
    for (name, op) in unary {
        let func = realm.new_function(name, move |_realm, _this, args| {
            Ok(Value::from(op(num_arg(args, 0))))
        });
        math.insert_property(name, PropertyDescriptor::method(func));
    }
    let pow = realm.new_function("pow", |_realm, _this, args| {
        Ok(Value::from(num_arg(args, 0).powf(num_arg(args, 1))))
    });
    math.insert_property("pow", PropertyDescriptor::method(pow));
    method(realm, &math, "random", Value::from(0.4221));
    math.insert_property("PI", PropertyDescriptor::data(std::f64::consts::PI).read_only());
    global_data(realm, "Math", math);

    let wasm = realm.new_object();
    let module = |realm: &Realm| Value::from(record(realm, &[("kind", "WebAssembly.Module".into())]));
    let compile = realm.new_function("compile", move |realm, _this, _args| Ok(module(realm)));
    let instantiate = realm.new_function("instantiate", move |realm, _this, _args| {
        let instance = record(realm, &[("exports", Value::from(realm.new_object()))]);
        let result = record(realm, &[("module", module(realm)), ("instance", Value::from(instance))]);
        Ok(Value::from(result))
    });
    wasm.insert_property("compile", PropertyDescriptor::method(compile));
    wasm.insert_property("instantiate", PropertyDescriptor::method(instantiate));
    global_data(realm, "WebAssembly", wasm);
}

fn install_observers(realm: &Realm) {
    for name in ["ResizeObserver", "IntersectionObserver", "PerformanceObserver"] {
        realm
            .class(name)
            .constructor(|_realm, this, args| {
                this.insert_property("__callback", PropertyDescriptor::data(arg(args, 0)).hidden());
                Ok(())
            })
            .method("observe", |realm, this, args| {
                let callback = realm.get(this, "__callback")?;
                let entry = record(realm, &[("target", arg(args, 0))]);
                let entries = record(realm, &[("0", Value::from(entry)), ("length", 1.into())]);
                realm.call(&callback, &Value::Undefined, &[Value::from(entries), this.clone()])?;
                Ok(Value::Undefined)
            })
            .method("disconnect", |_realm, _this, _args| Ok(Value::Undefined))
            .install();
    }
}

fn event_target(realm: &Realm) -> ObjectRef {
    match realm.resolve_path("EventTarget") {
        Ok(Value::Object(obj)) => obj,
        _ => realm.class("EventTarget").build(),
    }
}

/// The page's single instance of an interface with an illegal constructor.
fn new_singleton(realm: &Realm, class: &ObjectRef) -> ObjectRef {
    realm
        .new_instance(class)
        .unwrap_or_else(|_| realm.new_object())
}

// ============================================================================
// Probe
// ============================================================================

/// One step of the probe script and what the page saw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStep {
    pub step: &'static str,
    pub value: String,
}

/// Run a fingerprinting probe against `realm` the way a tracking script
/// would: canvas and WebGL readback, navigator and screen properties, audio,
/// media queries, geolocation, observers, storage, timing and Math.
pub fn run_probe(realm: &Realm) -> HostResult<Vec<ProbeStep>> {
    let mut steps = Vec::new();
    let mut push = |step: &'static str, value: Value| {
        steps.push(ProbeStep {
            step,
            value: value.to_string(),
        })
    };
    let window = realm.global_value();
    let invoke = |target: &Value, name: &str, args: &[Value]| -> HostResult<Value> {
        let func = realm.get(target, name)?;
        realm.call(&func, target, args)
    };

    let document = realm.get(&window, "document")?;
    let canvas = invoke(&document, "createElement", &["canvas".into()])?;
    push("canvas.toDataURL", invoke(&canvas, "toDataURL", &[])?);
    let ctx = invoke(&canvas, "getContext", &["2d".into()])?;
    invoke(&ctx, "fillText", &["Cwm fjordbank glyphs vext quiz".into(), 2.into(), 15.into()])?;
    let metrics = invoke(&ctx, "measureText", &["mmmmmmmmmmlli".into()])?;
    push("ctx.measureText.width", realm.get(&metrics, "width")?);

    let gl = invoke(&canvas, "getContext", &["webgl".into()])?;
    let ext = invoke(&gl, "getExtension", &["WEBGL_debug_renderer_info".into()])?;
    let renderer = realm.get(&ext, "UNMASKED_RENDERER_WEBGL")?;
    push("webgl.renderer", invoke(&gl, "getParameter", &[renderer])?);

    let navigator = realm.get(&window, "navigator")?;
    push("navigator.userAgent", realm.get(&navigator, "userAgent")?);
    push("navigator.webdriver", realm.get(&navigator, "webdriver")?);
    push("navigator.hardwareConcurrency", realm.get(&navigator, "hardwareConcurrency")?);
    push("navigator.platform", realm.get(&navigator, "platform")?);

    let screen = realm.get(&window, "screen")?;
    for _ in 0..2 {
        push("screen.width", realm.get(&screen, "width")?);
    }
    push("screen.colorDepth", realm.get(&screen, "colorDepth")?);
    push("window.devicePixelRatio", realm.get(&window, "devicePixelRatio")?);

    let audio_class = realm.get(&window, "AudioContext")?;
    let audio = realm.construct(&audio_class, &[])?;
    push("audio.sampleRate", realm.get(&audio, "sampleRate")?);
    invoke(&audio, "createOscillator", &[])?;
    let offline_class = realm.get(&window, "OfflineAudioContext")?;
    let offline = realm.construct(&offline_class, &[1.into(), 44100.into(), 44100.into()])?;
    invoke(&offline, "createDynamicsCompressor", &[])?;
    push("offline.startRendering", invoke(&offline, "startRendering", &[])?);

    let mql = invoke(&window, "matchMedia", &["(prefers-color-scheme: dark)".into()])?;
    push("matchMedia.matches", realm.get(&mql, "matches")?);
    invoke(&mql, "addEventListener", &["change".into()])?;

    let geolocation = realm.get(&navigator, "geolocation")?;
    let on_position = realm.new_function("onPosition", |realm, _this, args| {
        let coords = realm.get(&arg(args, 0), "coords")?;
        realm.get(&coords, "latitude")
    });
    invoke(&geolocation, "getCurrentPosition", &[on_position.into()])?;

    let observer_class = realm.get(&window, "ResizeObserver")?;
    let on_resize = realm.new_function("onResize", |_realm, _this, _args| Ok(Value::Undefined));
    let observer = realm.construct(&observer_class, &[on_resize.into()])?;
    invoke(&observer, "observe", &[canvas.clone()])?;

    let storage = realm.get(&window, "localStorage")?;
    invoke(&storage, "setItem", &["fp".into(), "1".into()])?;
    push("localStorage.getItem", invoke(&storage, "getItem", &["fp".into()])?);

    let date_class = realm.get(&window, "Date")?;
    let date = realm.construct(&date_class, &[])?;
    push("date.getTime", invoke(&date, "getTime", &[])?);
    let performance = realm.get(&window, "performance")?;
    push("performance.now", invoke(&performance, "now", &[])?);

    let math = realm.get(&window, "Math")?;
    for _ in 0..3 {
        push("Math.random", invoke(&math, "random", &[])?);
    }
    push("Math.sin", invoke(&math, "sin", &[1.into()])?);

    let fonts = realm.get(&document, "fonts")?;
    push("fonts.check", invoke(&fonts, "check", &["12px Arial".into()])?);

    let wasm = realm.get(&window, "WebAssembly")?;
    invoke(&wasm, "compile", &[])?;

    Ok(steps)
}
