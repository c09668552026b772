//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (effect expiry, combo window, ad cooldown)
//! - Async sleeps (SDK init backoff)
//! - Page referrer for session analytics

use std::cell::Cell;
use std::rc::Rc;

/// Time source and timer capability
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Milliseconds since an arbitrary fixed epoch
    fn now_ms(&self) -> u64;

    /// Resolve after `ms` milliseconds
    async fn sleep_ms(&self, ms: u32);

    /// Where the player came from, if known
    fn referrer(&self) -> Option<String> {
        None
    }
}

/// Manually advanced clock for tests and headless runs.
///
/// Clones share the same time, so a driver can keep a handle while the
/// session owns another. Sleeping advances the clock instantly.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<u64>>,
}

impl VirtualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Platform for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

/// Native wall clock
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Platform for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    async fn sleep_ms(&self, ms: u32) {
        // Single-threaded headless driver; blocking is fine here
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// Browser clock backed by Date.now and setTimeout
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPlatform;

#[cfg(target_arch = "wasm32")]
impl Platform for BrowserPlatform {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    async fn sleep_ms(&self, ms: u32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    fn referrer(&self) -> Option<String> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(|d| d.referrer())
            .filter(|r| !r.is_empty())
    }
}
