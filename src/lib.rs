// controls_core: visibility engine for media player controls overlays.
// The policy lives here; JS forwards events, property changes and clock ticks.
// See DESIGN.md for the module map.

mod controls;
mod debounce;
mod disposal;
mod engine;
mod error;
mod lookup;
mod player;
mod runtime;
mod timers;
mod types;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub use controls::{MediaControls, DIRECT_ACTIVITY, MOTION_DEBOUNCE_MS, WATCHED_PROPERTIES};
pub use debounce::Debouncer;
pub use disposal::DisposalBin;
pub use engine::{decide, DecisionInputs, Rule};
pub use error::ControlsError;
pub use lookup::{NodeTree, PlayerLookup};
pub use player::{ListenerId, Player, PlayerHandle};
pub use runtime::ControlsRuntime;
pub use timers::{HideTimerTable, TimerToken};
pub use types::*;

/// Initialize panic hook and console logging for the browser.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);
}

fn js_error(err: ControlsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn timestamp_from_ms(ms: f64) -> Timestamp {
    if ms.is_finite() && ms > 0.0 {
        Timestamp::from_micros((ms * 1000.0) as u64)
    } else {
        Timestamp::default()
    }
}

/// Controls engine exposed to JavaScript: one player with one controls overlay.
///
/// The host forwards player property changes and DOM activity, calls `tick`
/// from its timer loop, and listens for `isControlsActive` through `on_dispatch`.
///
/// # Example JSON Config
/// ```json
/// {
///   "activeDuration": 2750,
///   "hideWhenPaused": true,
///   "hideOnMouseLeave": false,
///   "waitForPlaybackStart": false,
///   "pin": "bottomLeft"
/// }
/// ```
#[wasm_bindgen]
pub struct ControlsEngine {
    runtime: Rc<ControlsRuntime>,
    player: PlayerHandle,
    controls: MediaControls,
    on_dispatch: Rc<RefCell<Option<js_sys::Function>>>,
}

#[wasm_bindgen]
impl ControlsEngine {
    /// Create an engine from JSON configuration and attach it to a fresh player.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<ControlsEngine, JsValue> {
        let config = ControlsConfig::from_json(config_json).map_err(js_error)?;
        let runtime = ControlsRuntime::new();
        let player = Player::new(PlayerId::new(1));

        let on_dispatch: Rc<RefCell<Option<js_sys::Function>>> = Rc::new(RefCell::new(None));
        let callback = on_dispatch.clone();
        player.subscribe(&[PlayerProperty::IsControlsActive], move |_, active| {
            let callback = callback.borrow().clone();
            if let Some(callback) = callback {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_bool(active)) {
                    log::warn!("on_dispatch callback failed: {:?}", err);
                }
            }
        });

        let controls = MediaControls::new(runtime.clone(), config).map_err(js_error)?;
        controls.attach_to(player.clone());

        Ok(ControlsEngine {
            runtime,
            player,
            controls,
            on_dispatch,
        })
    }

    /// Register a callback receiving every `isControlsActive` change.
    pub fn on_dispatch(&self, callback: js_sys::Function) {
        *self.on_dispatch.borrow_mut() = Some(callback);
    }

    /// Forward a player property change, e.g. `("paused", false, performance.now())`.
    pub fn set_property(&self, name: &str, value: bool, now_ms: f64) -> Result<(), JsValue> {
        let property: PlayerProperty = name.parse().map_err(js_error)?;
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.player.set(property, value).map_err(js_error)
    }

    pub fn get_property(&self, name: &str) -> Result<bool, JsValue> {
        let property: PlayerProperty = name.parse().map_err(js_error)?;
        Ok(self.player.get(property))
    }

    /// Forward a DOM activity event on the player element.
    pub fn activity(&self, kind: &str, now_ms: f64) -> Result<(), JsValue> {
        let kind: ActivityKind = kind.parse().map_err(js_error)?;
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.player.emit_activity(kind);
        Ok(())
    }

    pub fn pointer_enter(&self, now_ms: f64) {
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.pointer_enter();
    }

    pub fn pointer_leave(&self, now_ms: f64) {
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.pointer_leave();
    }

    pub fn touch_start(&self, now_ms: f64) {
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.touch_start();
    }

    pub fn touch_end(&self, now_ms: f64) {
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.touch_end();
    }

    /// Advance the clock and fire due hide timers. Returns the number fired.
    pub fn tick(&self, now_ms: f64) -> u32 {
        self.runtime.advance(timestamp_from_ms(now_ms)) as u32
    }

    /// When the host should call `tick` next, if a hide is pending.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.runtime.next_deadline().map(|ts| ts.as_millis())
    }

    /// Recompute now. Returns "show", "hide" or "hide-with-delay".
    pub fn recompute(&self, now_ms: f64) -> String {
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.recompute(None).name().to_string()
    }

    pub fn is_controls_active(&self) -> bool {
        self.player.get(PlayerProperty::IsControlsActive)
    }

    pub fn is_interacting(&self) -> bool {
        self.controls.is_interacting()
    }

    pub fn set_config(&self, config_json: &str, now_ms: f64) -> Result<(), JsValue> {
        let config = ControlsConfig::from_json(config_json).map_err(js_error)?;
        self.runtime.advance(timestamp_from_ms(now_ms));
        self.controls.set_config(config).map_err(js_error)
    }

    /// Current configuration as JSON.
    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controls.config())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Unbind from the player. No dispatch happens afterwards.
    pub fn detach(&self) {
        self.controls.detach();
    }
}
