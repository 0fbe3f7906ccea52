//! WebAssembly bindings for the Hextris engine.
//!
//! The browser rendering layer forwards pointer input here and redraws from
//! the returned JSON events.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::{GameEvent, InputEvent};
#[cfg(feature = "wasm")]
use crate::bot::{Bot, BotDifficulty};
#[cfg(feature = "wasm")]
use crate::config::GameConfig;
#[cfg(feature = "wasm")]
use crate::game::{GameError, GameSession};
#[cfg(feature = "wasm")]
use crate::hex::HexSettings;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
fn events_json(result: Result<Vec<GameEvent>, GameError>) -> Result<String, JsValue> {
    match result {
        Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
        Err(e) => Err(JsValue::from_str(&e.to_string())),
    }
}

/// WASM-exposed session wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmSession {
    session: GameSession,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmSession {
    /// Start a session. An empty string uses the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmSession, JsValue> {
        let config = if config_json.trim().is_empty() {
            GameConfig::default()
        } else {
            GameConfig::from_json_str(config_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        let session = GameSession::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmSession { session })
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        events_json(self.session.handle(InputEvent::PointerDown { x, y }))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        events_json(self.session.handle(InputEvent::PointerMove { x, y }))
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        events_json(self.session.handle(InputEvent::PointerUp { x, y }))
    }

    /// Scroll wheel over the canvas; toggles the held or hovered piece
    #[wasm_bindgen(js_name = wheel)]
    pub fn wheel(&mut self, x: f64, y: f64, delta: f64) -> Result<String, JsValue> {
        events_json(self.session.handle(InputEvent::Wheel { x, y, delta }))
    }

    /// Call once per frame
    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self) -> String {
        serde_json::to_string(&self.session.tick()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Full session snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Apply new hex settings from JSON and rebuild the scene
    #[wasm_bindgen(js_name = setSettings)]
    pub fn set_settings(&mut self, settings_json: &str) -> Result<String, JsValue> {
        let settings: HexSettings = serde_json::from_str(settings_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings JSON: {}", e)))?;
        events_json(self.session.set_settings(settings))
    }

    /// Suggested move as JSON, or `null` when nothing fits
    #[wasm_bindgen(js_name = getHint)]
    pub fn get_hint(&self) -> String {
        let mut bot = Bot::new(BotDifficulty::Greedy);
        match bot.choose_move(&self.session) {
            Some(mv) => serde_json::to_string(&mv).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.session.is_game_over()
    }
}
