//! Data-driven game balance
//!
//! Every knob has a default matching the shipped game. A JSON document may
//! override any subset of them.

use serde::{Deserialize, Serialize};

/// Balance values consulted by the simulation and the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Per-tick chance that a power-up spawns (when none is on the grid)
    pub powerup_spawn_chance: f64,
    /// Power-up lifetime on the grid, in ticks
    pub powerup_lifetime_ticks: u32,
    /// Duration of magnet / shield / double-score, in ms
    pub effect_duration_ms: u64,
    /// Segments removed by the shorten power-up
    pub shorten_amount: usize,
    /// Shield granted after a rewarded revive, in ms
    pub revive_shield_ms: u64,

    /// Window in which another pickup extends the combo, in ms
    pub combo_window_ms: u64,
    /// Points per food before multipliers
    pub base_food_points: u64,
    /// Analytics milestone spacing
    pub milestone_step: u64,

    /// Magnet attracts food closer than this (Manhattan distance)
    pub magnet_range: i32,
    /// Within this distance the magnet pulls every tick
    pub magnet_fast_range: i32,

    /// Random samples tried before placement falls back or gives up
    pub placement_attempts: u32,
    /// Obstacles sampled for the random-wall level
    pub random_wall_count: usize,

    /// Time-attack length, in seconds
    pub countdown_secs: u32,

    /// Minimum spacing between commercial breaks, in ms
    pub ad_cooldown_ms: u64,
    /// SDK initialization attempts before falling back to dev mode
    pub sdk_init_attempts: u32,
    /// Sleep between SDK initialization attempts, in ms
    pub sdk_init_backoff_ms: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            powerup_spawn_chance: 0.03,
            powerup_lifetime_ticks: 400,
            effect_duration_ms: 8000,
            shorten_amount: 5,
            revive_shield_ms: 3000,

            combo_window_ms: 2000,
            base_food_points: 10,
            milestone_step: 50,

            magnet_range: 8,
            magnet_fast_range: 2,

            placement_attempts: 50,
            random_wall_count: 15,

            countdown_secs: 60,

            ad_cooldown_ms: 30_000,
            sdk_init_attempts: 3,
            sdk_init_backoff_ms: 500,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
