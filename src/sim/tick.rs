//! Fixed timestep simulation tick
//!
//! Core game step that advances the run by one 100 ms tick.

use glam::IVec2;

use super::grid::{self, Direction};
use super::level::GameMode;
use super::particles::{FOOD_COLOR, SHIELD_COLOR};
use super::powerup::PowerUpKind;
use super::scoring;
use super::state::{GameEvent, GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn request, buffered for this tick's move
    pub turn: Option<Direction>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one tick. `now` is wall time in ms, used for
/// effect expiry and the combo window.
pub fn tick(state: &mut GameState, input: &TickInput, now: u64) {
    // Handle pause toggle
    if input.pause {
        let paused = state.phase == GamePhase::Paused;
        state.set_paused(!paused);
    }

    // Only a running game advances
    if state.phase != GamePhase::Running {
        return;
    }

    if let Some(dir) = input.turn {
        state.snake.set_direction(dir);
    }

    state.time_ticks += 1;

    let wrap_disabled = state.wrap_disabled();
    let outcome = state.snake.advance(wrap_disabled);
    let head = outcome.head;

    state.particles.update();
    state.shake.update();

    pull_food_toward(state, head, now);

    if outcome.crashed || state.snake.check_collision(&state.walls) {
        resolve_collision(state, head, outcome.crashed, now);
        return;
    }

    state.combo.update(now);

    if head == state.food {
        eat_food(state, now);
        if state.phase != GamePhase::Running {
            return;
        }
    }

    // Age power-ups, maybe spawn one, then pick up whatever the head is on
    for p in &mut state.power_ups {
        p.update();
    }
    state.power_ups.retain(|p| !p.is_expired());
    state.try_spawn_power_up();
    collect_power_ups(state, head, now);
}

/// Magnet: drag nearby food one step toward the head.
///
/// Close food is pulled every tick, farther food on even ticks only. A pull
/// into a wall is skipped.
fn pull_food_toward(state: &mut GameState, head: IVec2, now: u64) {
    if !state.effects.is_active(PowerUpKind::Magnet, now) {
        return;
    }
    let dist = grid::manhattan(state.food, head);
    if dist <= 0 || dist >= state.tuning.magnet_range {
        return;
    }
    let pull = dist <= state.tuning.magnet_fast_range || state.time_ticks % 2 == 0;
    if !pull {
        return;
    }
    let next = state.food + (head - state.food).signum();
    if !state.is_wall(next) {
        state.food = next;
    }
}

/// Shield soaks the hit and turns the snake; otherwise the run is over
fn resolve_collision(state: &mut GameState, head: IVec2, crashed: bool, now: u64) {
    if state.effects.is_active(PowerUpKind::Shield, now) {
        state.effects.clear(PowerUpKind::Shield);
        state.particles.emit(head, SHIELD_COLOR, 30);
        state.shake.trigger(5, 5.0);

        // An out-of-bounds crash never moved the body
        if !crashed {
            state.snake.undo_move();
        }
        state.snake.bounce(&state.walls, &mut state.rng);
        state.events.push(GameEvent::ShieldAbsorbed { pos: head });
        log::debug!("Shield absorbed collision at ({}, {})", head.x, head.y);
        return;
    }

    state.phase = GamePhase::GameOver;
    state.shake.trigger(10, 5.0);
    state.events.push(GameEvent::Crashed { pos: head });
    log::info!("Crashed at ({}, {}) with score {}", head.x, head.y, state.score);
}

fn eat_food(state: &mut GameState, now: u64) {
    let pos = state.food;
    state.snake.grow();

    let multiplier = state.combo.on_eat(now);
    if state.combo.is_achievement() {
        state.events.push(GameEvent::ComboAchievement {
            combo: state.combo.combo,
        });
    }

    let double = state.effects.is_active(PowerUpKind::DoubleScore, now);
    let points = scoring::food_points(state.tuning.base_food_points, double, multiplier);
    state.events.push(GameEvent::FoodEaten {
        pos,
        points,
        combo: state.combo.combo,
        multiplier,
    });
    state.add_score(points);

    state.particles.emit(pos, FOOD_COLOR, 25);
    state.spawn_food();

    if state.mode == GameMode::Campaign && state.score >= state.target_score {
        state.phase = GamePhase::LevelComplete;
        state.events.push(GameEvent::LevelComplete {
            level: state.level_index,
            score: state.score,
            target: state.target_score,
        });
        log::info!("Level {} complete with {}", state.level_index + 1, state.score);
    }
}

fn collect_power_ups(state: &mut GameState, head: IVec2, now: u64) {
    let Some(idx) = state.power_ups.iter().position(|p| p.pos == head) else {
        return;
    };
    let pickup = state.power_ups.remove(idx);

    state.events.push(GameEvent::PowerUpCollected {
        kind: pickup.kind,
        pos: pickup.pos,
        score: state.score,
    });
    state.apply_power_up(pickup.kind, now);
    state.particles.emit(pickup.pos, pickup.kind.color(), 20);
    if pickup.kind == PowerUpKind::Shorten {
        state.shake.trigger(5, 2.0);
    }
}
