//! Browser bindings for the Poki SDK
//!
//! The SDK is loaded by the page as `window.PokiSDK`. Every call goes
//! through a small JS shim that throws when the SDK or the method is
//! missing, so failures surface as `AdError`s instead of exceptions.

use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::ads::{AdError, AdGateway};

#[wasm_bindgen(inline_js = "
    function sdk(method) {
        const s = globalThis.PokiSDK;
        if (!s || typeof s[method] !== 'function') {
            throw new Error('PokiSDK.' + method + ' not available');
        }
        return s;
    }

    export function poki_available(method) {
        const s = globalThis.PokiSDK;
        return !!s && typeof s[method] === 'function';
    }

    export async function poki_init() {
        await sdk('init').init();
    }

    export function poki_gameplay_start() {
        sdk('gameplayStart').gameplayStart();
    }

    export function poki_gameplay_stop() {
        sdk('gameplayStop').gameplayStop();
    }

    export async function poki_commercial_break() {
        await sdk('commercialBreak').commercialBreak();
    }

    export async function poki_rewarded_break() {
        return !!(await sdk('rewardedBreak').rewardedBreak());
    }

    export function poki_custom_event(name, payload) {
        sdk('customEvent').customEvent(name, JSON.parse(payload));
    }
")]
extern "C" {
    fn poki_available(method: &str) -> bool;

    #[wasm_bindgen(catch)]
    async fn poki_init() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn poki_gameplay_start() -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn poki_gameplay_stop() -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn poki_commercial_break() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn poki_rewarded_break() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn poki_custom_event(name: &str, payload: &str) -> Result<(), JsValue>;
}

fn sdk_error(err: JsValue) -> AdError {
    let message = match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    };
    AdError::Sdk(message)
}

/// `window.PokiSDK`
#[derive(Debug, Clone, Copy, Default)]
pub struct PokiGateway;

impl PokiGateway {
    fn require(method: &str) -> Result<(), AdError> {
        if poki_available(method) {
            Ok(())
        } else {
            Err(AdError::Unavailable)
        }
    }
}

impl AdGateway for PokiGateway {
    async fn init(&mut self) -> Result<(), AdError> {
        Self::require("init")?;
        poki_init().await.map(|_| ()).map_err(sdk_error)
    }

    fn gameplay_start(&mut self) -> Result<(), AdError> {
        poki_gameplay_start().map_err(sdk_error)
    }

    fn gameplay_stop(&mut self) -> Result<(), AdError> {
        poki_gameplay_stop().map_err(sdk_error)
    }

    async fn commercial_break(&mut self) -> Result<(), AdError> {
        Self::require("commercialBreak")?;
        poki_commercial_break()
            .await
            .map(|_| ())
            .map_err(sdk_error)
    }

    async fn rewarded_break(&mut self) -> Result<bool, AdError> {
        Self::require("rewardedBreak")?;
        let watched = poki_rewarded_break().await.map_err(sdk_error)?;
        Ok(watched.as_bool().unwrap_or(false))
    }

    fn custom_event(&mut self, name: &str, payload: &Value) -> Result<(), AdError> {
        poki_custom_event(name, &payload.to_string()).map_err(sdk_error)
    }
}
