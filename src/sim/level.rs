//! Campaign levels and the time-attack countdown

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{ENDLESS_TARGET, SPAWN_X, SPAWN_Y, TILE_COUNT};

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Campaign,
    #[serde(rename = "timeattack")]
    TimeAttack,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Campaign => "campaign",
            GameMode::TimeAttack => "timeattack",
        }
    }
}

/// How a level's walls are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallLayout {
    None,
    /// Ring around the board edge
    Border,
    /// Hand-placed obstacles
    Fixed(&'static [(i32, i32)]),
    /// Obstacles sampled when the level loads
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDef {
    pub id: u32,
    pub target_score: u64,
    pub walls: WallLayout,
}

const TWIN_BARS: &[(i32, i32)] = &[
    (6, 5), (7, 5), (8, 5), (9, 5), (10, 5), (11, 5), (12, 5), (13, 5),
    (6, 14), (7, 14), (8, 14), (9, 14), (10, 14), (11, 14), (12, 14), (13, 14),
];

const CROSSHAIR: &[(i32, i32)] = &[
    (10, 4), (10, 5), (10, 6), (10, 13), (10, 14), (10, 15),
    (4, 10), (5, 10), (6, 10), (13, 10), (14, 10), (15, 10),
];

/// Campaign levels in play order. The last one never completes.
pub const LEVELS: [LevelDef; 5] = [
    LevelDef { id: 1, target_score: 50, walls: WallLayout::None },
    LevelDef { id: 2, target_score: 100, walls: WallLayout::Border },
    LevelDef { id: 3, target_score: 150, walls: WallLayout::Fixed(TWIN_BARS) },
    LevelDef { id: 4, target_score: 200, walls: WallLayout::Fixed(CROSSHAIR) },
    LevelDef { id: 5, target_score: ENDLESS_TARGET, walls: WallLayout::Random },
];

pub fn level(index: usize) -> Option<&'static LevelDef> {
    LEVELS.get(index)
}

/// Cells kept clear of random walls: the spawn body and the first step ahead
fn spawn_lane(cell: IVec2) -> bool {
    cell.y == SPAWN_Y && (SPAWN_X - 2..=SPAWN_X + 1).contains(&cell.x)
}

/// Build the wall cells for a layout
pub fn build_walls<R: Rng>(layout: WallLayout, random_count: usize, rng: &mut R) -> Vec<IVec2> {
    match layout {
        WallLayout::None => Vec::new(),
        WallLayout::Border => {
            let mut walls = Vec::with_capacity((TILE_COUNT * 4) as usize);
            for i in 0..TILE_COUNT {
                for cell in [
                    IVec2::new(i, 0),
                    IVec2::new(i, TILE_COUNT - 1),
                    IVec2::new(0, i),
                    IVec2::new(TILE_COUNT - 1, i),
                ] {
                    if !walls.contains(&cell) {
                        walls.push(cell);
                    }
                }
            }
            walls
        }
        WallLayout::Fixed(cells) => cells.iter().map(|&(x, y)| IVec2::new(x, y)).collect(),
        WallLayout::Random => {
            // Sample away from the edges so the border lanes stay open
            let interior = 2..TILE_COUNT - 2;
            let free = interior
                .clone()
                .flat_map(|x| interior.clone().map(move |y| IVec2::new(x, y)))
                .filter(|&cell| !spawn_lane(cell))
                .count();
            if random_count > free {
                log::warn!("Random wall count {} capped at {}", random_count, free);
            }
            let random_count = random_count.min(free);

            let mut walls = Vec::with_capacity(random_count);
            while walls.len() < random_count {
                let cell = IVec2::new(
                    rng.random_range(2..TILE_COUNT - 2),
                    rng.random_range(2..TILE_COUNT - 2),
                );
                if !spawn_lane(cell) && !walls.contains(&cell) {
                    walls.push(cell);
                }
            }
            walls
        }
    }
}

/// Time-attack countdown, ticked once per second while not paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining: u32,
}

impl Countdown {
    pub fn new(secs: u32) -> Self {
        Self { remaining: secs }
    }

    /// Count one second down. Returns true on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_level_table() {
        assert_eq!(LEVELS.len(), 5);
        assert_eq!(level(0).map(|l| l.target_score), Some(50));
        assert_eq!(level(4).map(|l| l.target_score), Some(ENDLESS_TARGET));
        assert!(level(5).is_none());
    }

    #[test]
    fn test_border_ring() {
        let mut rng = Pcg32::seed_from_u64(1);
        let walls = build_walls(WallLayout::Border, 0, &mut rng);
        assert_eq!(walls.len(), (TILE_COUNT * 4 - 4) as usize);
        assert!(walls.contains(&IVec2::new(0, 0)));
        assert!(walls.contains(&IVec2::new(TILE_COUNT - 1, 7)));
        assert!(!walls.contains(&IVec2::new(1, 1)));
    }

    #[test]
    fn test_random_walls_are_distinct_and_clear_of_spawn() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..20 {
            let walls = build_walls(WallLayout::Random, 15, &mut rng);
            assert_eq!(walls.len(), 15);
            for (i, w) in walls.iter().enumerate() {
                assert!((2..TILE_COUNT - 2).contains(&w.x));
                assert!((2..TILE_COUNT - 2).contains(&w.y));
                assert!(!spawn_lane(*w));
                assert!(!walls[i + 1..].contains(w));
            }
        }
    }

    #[test]
    fn test_random_wall_count_capped_by_free_cells() {
        let mut rng = Pcg32::seed_from_u64(1);
        let walls = build_walls(WallLayout::Random, 300, &mut rng);
        // 16x16 interior minus the four spawn lane cells
        assert_eq!(walls.len(), 252);
        let mut unique = walls.clone();
        unique.sort_by_key(|c| (c.x, c.y));
        unique.dedup();
        assert_eq!(unique.len(), walls.len());
        assert!(walls.iter().all(|&w| !spawn_lane(w)));
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut countdown = Countdown::new(3);
        assert!(!countdown.tick());
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.is_finished());
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining, 0);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(GameMode::TimeAttack.as_str(), "timeattack");
        assert_eq!(
            serde_json::to_string(&GameMode::TimeAttack).unwrap(),
            "\"timeattack\""
        );
    }
}
