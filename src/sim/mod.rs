//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Time passed in by the caller
//! - No rendering, audio, storage or ad dependencies

pub mod combo;
pub mod grid;
pub mod level;
pub mod particles;
pub mod powerup;
pub mod scoring;
pub mod snake;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use combo::{ComboTracker, multiplier_for};
pub use grid::Direction;
pub use level::{Countdown, GameMode, LEVELS, LevelDef, WallLayout};
pub use powerup::{ActiveEffects, PowerUp, PowerUpKind};
pub use snake::{MoveOutcome, Snake};
pub use snapshot::{EffectView, Snapshot};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
