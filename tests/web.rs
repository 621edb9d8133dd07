// Browser-side smoke tests. Run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use controls_core::ControlsEngine;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn invalid_config_surfaces_as_js_error() {
    let err = ControlsEngine::new("{not json").err().expect("should fail");
    let message = err.as_string().unwrap_or_default();
    assert!(message.contains("Serialization error"));
}

#[wasm_bindgen_test]
fn unknown_property_surfaces_as_js_error() {
    let engine = ControlsEngine::new("{}").unwrap();
    let err = engine.set_property("volume", true, 0.0).err().expect("should fail");
    assert!(err.as_string().unwrap_or_default().contains("volume"));
}

#[wasm_bindgen_test]
fn dispatch_reaches_js_callback() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let callback = Closure::<dyn Fn(bool)>::new(move |active: bool| sink.borrow_mut().push(active));

    let engine = ControlsEngine::new(r#"{"activeDuration":500}"#).unwrap();
    engine.on_dispatch(callback.as_ref().unchecked_ref::<js_sys::Function>().clone());

    engine.set_property("playbackReady", true, 0.0).unwrap();
    engine.set_property("paused", false, 0.0).unwrap();
    engine.tick(500.0);

    assert_eq!(*seen.borrow(), vec![true, false]);
}
