//! Snake Rush - A grid arcade game with campaign and time-attack modes
//!
//! Core modules:
//! - `sim`: Deterministic simulation (snake movement, power-ups, combo scoring, phases)
//! - `session`: Loop controller that owns a run and sequences ad breaks
//! - `ads`: Ad/analytics gateway capability with guarded wrapper
//! - `analytics`: Typed analytics events and their JSON payloads
//! - `audio`: Sound cue tables and music sequencing (Web Audio on wasm)
//! - `platform`: Clock and timer abstraction (virtual, native, browser)
//! - `persistence`: Key/value storage for high score and preferences
//! - `shared`: Session handle that queues actions while an ad holds it
//! - `tuning`: Data-driven game balance
//! - `web`: Poki SDK bindings (wasm only)

pub mod ads;
pub mod analytics;
pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod shared;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScore;
pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Simulation tick period in milliseconds
    pub const TICK_MS: u64 = 100;
    /// Time-attack countdown period in milliseconds
    pub const COUNTDOWN_TICK_MS: u64 = 1000;

    /// Size of one grid cell in canvas units
    pub const GRID_SIZE: i32 = 20;
    /// Canvas edge length in canvas units
    pub const CANVAS_SIZE: i32 = 400;
    /// Cells per grid edge (20x20)
    pub const TILE_COUNT: i32 = CANVAS_SIZE / GRID_SIZE;

    /// Snake head position at level start and on revive
    pub const SPAWN_X: i32 = 10;
    pub const SPAWN_Y: i32 = 10;
    /// Snake never gets shorter than head + 2 body segments
    pub const MIN_SNAKE_LEN: usize = 3;

    /// Target score of the final, endless campaign level
    pub const ENDLESS_TARGET: u64 = 9999;
    /// Targets at or above this are shown as a plain score
    pub const TARGET_DISPLAY_LIMIT: u64 = 9000;
    /// Countdown seconds at which the HUD switches to warning style
    pub const COUNTDOWN_WARNING_SECS: u32 = 10;
}
