//! Game state and core simulation types
//!
//! Everything a run needs to advance deterministically lives here. Time is
//! passed in from outside as milliseconds; randomness comes from the seeded
//! RNG only.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::ComboTracker;
use super::grid;
use super::level::{self, Countdown, GameMode};
use super::particles::{ParticleSystem, SHIELD_COLOR, ScreenShake};
use super::powerup::{ActiveEffects, PowerUp, PowerUpKind};
use super::scoring;
use super::snake::Snake;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No run loaded (menus)
    Idle,
    /// Active gameplay
    Running,
    /// Run frozen by the player
    Paused,
    /// Snake crashed; may be continued once per run
    GameOver,
    /// Campaign target reached, waiting to load the next level
    LevelComplete,
    /// All campaign levels cleared
    Victory,
    /// Time-attack countdown ran out
    TimeUp,
}

impl GamePhase {
    /// Phases that end the simulation loop
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GamePhase::GameOver | GamePhase::LevelComplete | GamePhase::Victory | GamePhase::TimeUp
        )
    }
}

/// Things that happened during a tick, for feedback and analytics
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: usize, mode: GameMode },
    FoodEaten { pos: IVec2, points: u64, combo: u32, multiplier: f64 },
    ComboAchievement { combo: u32 },
    PowerUpCollected { kind: PowerUpKind, pos: IVec2, score: u64 },
    ShieldAbsorbed { pos: IVec2 },
    Crashed { pos: IVec2 },
    LevelComplete { level: usize, score: u64, target: u64 },
    Victory { score: u64 },
    TimeUp { score: u64 },
    Revived,
    HighScore { score: u64, previous: u64 },
    Milestone { score: u64, milestone: u64 },
}

/// Complete game state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,

    pub mode: GameMode,
    /// Campaign level index (0-based); always 0 in time-attack
    pub level_index: usize,
    pub target_score: u64,
    pub phase: GamePhase,

    pub snake: Snake,
    pub walls: Vec<IVec2>,
    pub food: IVec2,
    /// At most one on the grid at a time
    pub power_ups: Vec<PowerUp>,
    pub effects: ActiveEffects,
    pub combo: ComboTracker,

    pub score: u64,
    pub high_score: u64,
    /// Highest milestone boundary already reported this level
    pub last_milestone: u64,
    /// Rewarded-ad continue still available this run
    pub can_continue: bool,
    /// Present only in time-attack
    pub countdown: Option<Countdown>,

    /// Simulation tick counter
    pub time_ticks: u64,

    /// Visual feedback (not gameplay-affecting)
    pub particles: ParticleSystem,
    pub shake: ScreenShake,

    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle state with the given seed
    pub fn new(seed: u64, tuning: Tuning, high_score: u64) -> Self {
        let combo = ComboTracker::new(tuning.combo_window_ms);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            mode: GameMode::Campaign,
            level_index: 0,
            target_score: LEVELS_FIRST_TARGET,
            phase: GamePhase::Idle,
            snake: Snake::new(spawn_point()),
            walls: Vec::new(),
            food: IVec2::ZERO,
            power_ups: Vec::new(),
            effects: ActiveEffects::default(),
            combo,
            score: 0,
            high_score,
            last_milestone: 0,
            can_continue: true,
            countdown: None,
            time_ticks: 0,
            particles: ParticleSystem::new(false, seed),
            shake: ScreenShake::default(),
            events: Vec::new(),
        }
    }

    /// Campaign walls block the board edge; everything else wraps
    pub fn wrap_disabled(&self) -> bool {
        self.mode == GameMode::Campaign && !self.walls.is_empty()
    }

    pub fn is_wall(&self, cell: IVec2) -> bool {
        self.walls.contains(&cell)
    }

    /// Cell holds a snake segment or a wall
    pub fn is_occupied(&self, cell: IVec2) -> bool {
        self.snake.occupies(cell) || self.is_wall(cell)
    }

    /// Load and start a level. Returns false when the campaign has no level
    /// at `index`.
    pub fn start_level(&mut self, mode: GameMode, index: usize) -> bool {
        let Some(def) = level::level(index) else {
            return false;
        };

        self.mode = mode;
        self.level_index = index;
        self.target_score = def.target_score;
        let layout = match mode {
            GameMode::Campaign => def.walls,
            GameMode::TimeAttack => level::WallLayout::None,
        };
        self.walls = level::build_walls(layout, self.tuning.random_wall_count, &mut self.rng);

        self.snake = Snake::new(spawn_point());
        self.particles.clear();
        self.shake = ScreenShake::default();
        self.power_ups.clear();
        self.effects = ActiveEffects::default();
        self.score = 0;
        self.last_milestone = 0;
        self.can_continue = true;
        self.combo.reset();
        self.countdown = match mode {
            GameMode::Campaign => None,
            GameMode::TimeAttack => Some(Countdown::new(self.tuning.countdown_secs)),
        };
        self.spawn_food();
        self.phase = GamePhase::Running;

        log::info!(
            "Level {} loaded ({}, target {}, {} walls)",
            index + 1,
            mode.as_str(),
            self.target_score,
            self.walls.len()
        );
        self.events.push(GameEvent::LevelStarted { level: index, mode });
        true
    }

    /// Random free cell, tried `attempts` times
    fn sample_free_cell(&mut self, attempts: u32, avoid_food: bool) -> Option<IVec2> {
        for _ in 0..attempts {
            let cell = IVec2::new(
                self.rng.random_range(0..TILE_COUNT),
                self.rng.random_range(0..TILE_COUNT),
            );
            if !self.is_occupied(cell) && !(avoid_food && cell == self.food) {
                return Some(cell);
            }
        }
        None
    }

    /// Move food to a free cell; scans the whole board if sampling fails.
    /// Returns false only when the board is full.
    pub fn spawn_food(&mut self) -> bool {
        let cell = self
            .sample_free_cell(self.tuning.placement_attempts, false)
            .or_else(|| grid::all_cells().find(|&c| !self.is_occupied(c)));
        match cell {
            Some(cell) => {
                self.food = cell;
                true
            }
            None => false,
        }
    }

    /// Roll the per-tick spawn chance and place a power-up on a free cell
    pub fn try_spawn_power_up(&mut self) -> Option<PowerUpKind> {
        if !self.power_ups.is_empty() {
            return None;
        }
        if !self.rng.random_bool(self.tuning.powerup_spawn_chance.clamp(0.0, 1.0)) {
            return None;
        }

        let kind = PowerUpKind::ALL[self.rng.random_range(0..PowerUpKind::ALL.len())];
        let pos = self.sample_free_cell(self.tuning.placement_attempts, true)?;
        self.power_ups
            .push(PowerUp::new(pos, kind, self.tuning.powerup_lifetime_ticks));
        log::debug!("Spawned {} at ({}, {})", kind.name(), pos.x, pos.y);
        Some(kind)
    }

    /// Apply a collected power-up's effect
    pub fn apply_power_up(&mut self, kind: PowerUpKind, now: u64) {
        log::debug!("Collected {}", kind.name());
        if kind.is_timed() {
            self.effects
                .activate(kind, now + self.tuning.effect_duration_ms);
        } else {
            self.snake.shorten(self.tuning.shorten_amount);
        }
    }

    /// Add points, tracking the high score and crossed milestones
    pub fn add_score(&mut self, points: u64) {
        self.score += points;

        if self.score > self.high_score {
            let previous = self.high_score;
            self.high_score = self.score;
            self.events.push(GameEvent::HighScore {
                score: self.score,
                previous,
            });
        }

        for milestone in
            scoring::milestones_crossed(self.last_milestone, self.score, self.tuning.milestone_step)
        {
            self.last_milestone = milestone;
            self.events.push(GameEvent::Milestone {
                score: self.score,
                milestone,
            });
        }
    }

    /// Respawn after a watched rewarded ad: fresh snake at the spawn point
    /// facing a free direction, a short shield, score kept, combo reset.
    pub fn revive(&mut self, now: u64) {
        self.can_continue = false;
        self.snake = Snake::new(spawn_point());
        self.snake.bounce(&self.walls, &mut self.rng);
        self.combo.reset();
        self.effects
            .activate(PowerUpKind::Shield, now + self.tuning.revive_shield_ms);
        self.particles.emit(spawn_point(), SHIELD_COLOR, 30);
        self.phase = GamePhase::Running;
        self.events.push(GameEvent::Revived);
        log::info!("Revived with score {}", self.score);
    }

    /// Continue is offered once per run, and only with something to save
    pub fn continue_available(&self) -> bool {
        self.phase == GamePhase::GameOver && self.can_continue && self.score > 0
    }

    pub fn set_paused(&mut self, paused: bool) {
        match (self.phase, paused) {
            (GamePhase::Running, true) => self.phase = GamePhase::Paused,
            (GamePhase::Paused, false) => self.phase = GamePhase::Running,
            _ => {}
        }
    }

    /// One countdown second. Ends the run on the tick that reaches zero.
    pub fn countdown_tick(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return false;
        };
        if !countdown.tick() {
            return false;
        }
        self.phase = GamePhase::TimeUp;
        self.events.push(GameEvent::TimeUp { score: self.score });
        log::info!("Time up with score {}", self.score);
        true
    }

    /// Every campaign level cleared
    pub fn complete_campaign(&mut self) {
        self.phase = GamePhase::Victory;
        self.events.push(GameEvent::Victory { score: self.score });
        log::info!("Campaign complete with score {}", self.score);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

const LEVELS_FIRST_TARGET: u64 = level::LEVELS[0].target_score;

/// Fixed spawn / revive cell
pub fn spawn_point() -> IVec2 {
    IVec2::new(SPAWN_X, SPAWN_Y)
}
