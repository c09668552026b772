//! Read-only view of a run for the renderer and HUD

use glam::IVec2;
use serde::Serialize;

use super::level::GameMode;
use super::particles::{Particle, ScreenShake};
use super::powerup::{PowerUp, PowerUpKind};
use super::state::{GamePhase, GameState};
use crate::consts::{COUNTDOWN_WARNING_SECS, TARGET_DISPLAY_LIMIT, TILE_COUNT};

/// An unexpired effect as shown in the HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectView {
    pub kind: PowerUpKind,
    pub label: &'static str,
    pub color: u32,
    /// Whole seconds left, rounded up
    pub seconds_left: u64,
    /// Share of the full duration still remaining (0-1)
    pub fraction: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tile_count: i32,
    pub phase: GamePhase,
    pub mode: GameMode,
    /// An end screen is up (game over, level cleared, victory, time up)
    pub ended: bool,
    /// 1-based level number
    pub level: usize,
    pub snake: Vec<IVec2>,
    pub direction: IVec2,
    pub walls: Vec<IVec2>,
    pub food: IVec2,
    pub power_ups: Vec<PowerUp>,
    pub effects: Vec<EffectView>,
    pub shield_active: bool,
    pub score: u64,
    pub high_score: u64,
    pub target_score: u64,
    /// "score/target" in campaign, plain score otherwise
    pub score_label: String,
    pub combo: u32,
    pub multiplier: f64,
    pub time_remaining: Option<u32>,
    pub countdown_warning: bool,
    pub continue_available: bool,
    pub particles: Vec<Particle>,
    pub shake: ScreenShake,
}

impl Snapshot {
    pub fn capture(state: &GameState, now: u64) -> Self {
        let duration = state.tuning.effect_duration_ms.max(1);
        let effects = state
            .effects
            .active(now)
            .map(|(kind, until)| {
                let left = until - now;
                EffectView {
                    kind,
                    label: kind.label(),
                    color: kind.color(),
                    seconds_left: left.div_ceil(1000),
                    fraction: (left as f32 / duration as f32).min(1.0),
                }
            })
            .collect();

        let score_label =
            if state.mode == GameMode::Campaign && state.target_score < TARGET_DISPLAY_LIMIT {
                format!("{}/{}", state.score, state.target_score)
            } else {
                state.score.to_string()
            };

        let time_remaining = state.countdown.map(|c| c.remaining);

        Self {
            tile_count: TILE_COUNT,
            phase: state.phase,
            mode: state.mode,
            ended: state.phase.is_terminal(),
            level: state.level_index + 1,
            snake: state.snake.body.iter().copied().collect(),
            direction: state.snake.direction.delta(),
            walls: state.walls.clone(),
            food: state.food,
            power_ups: state.power_ups.clone(),
            effects,
            shield_active: state.effects.is_active(PowerUpKind::Shield, now),
            score: state.score,
            high_score: state.high_score,
            target_score: state.target_score,
            score_label,
            combo: state.combo.combo,
            multiplier: state.combo.multiplier(),
            time_remaining,
            countdown_warning: time_remaining.is_some_and(|t| t <= COUNTDOWN_WARNING_SECS),
            continue_available: state.continue_available(),
            particles: state.particles.particles.clone(),
            shake: state.shake,
        }
    }
}
