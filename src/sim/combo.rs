//! Combo streaks
//!
//! Eating again within the combo window extends the streak and raises the
//! score multiplier.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboTracker {
    pub combo: u32,
    /// Time of the last pickup (ms), None before the first
    pub last_eat_ms: Option<u64>,
    pub window_ms: u64,
}

impl ComboTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            combo: 0,
            last_eat_ms: None,
            window_ms,
        }
    }

    /// Register a pickup and return the multiplier it earns
    pub fn on_eat(&mut self, now: u64) -> f64 {
        let within_window = self
            .last_eat_ms
            .is_some_and(|last| now.saturating_sub(last) < self.window_ms);
        if within_window {
            self.combo += 1;
        } else {
            self.combo = 1;
        }
        self.last_eat_ms = Some(now);
        self.multiplier()
    }

    pub fn multiplier(&self) -> f64 {
        multiplier_for(self.combo)
    }

    /// Drop the streak once the window has passed without a pickup
    pub fn update(&mut self, now: u64) {
        if self.combo == 0 {
            return;
        }
        let expired = self
            .last_eat_ms
            .is_some_and(|last| now.saturating_sub(last) > self.window_ms);
        if expired {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.combo = 0;
    }

    /// Streaks of 5, 10, 15... are reported as achievements
    pub fn is_achievement(&self) -> bool {
        self.combo >= 5 && self.combo % 5 == 0
    }
}

/// Score multiplier for a streak length
pub fn multiplier_for(combo: u32) -> f64 {
    match combo {
        5.. => 3.0,
        3..=4 => 2.0,
        2 => 1.5,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_streak_builds_within_window() {
        let mut combo = ComboTracker::new(2000);
        assert_eq!(combo.on_eat(10_000), 1.0);
        assert_eq!(combo.on_eat(11_000), 1.5);
        assert_eq!(combo.on_eat(12_999), 2.0);
        assert_eq!(combo.combo, 3);
    }

    #[test]
    fn test_streak_restarts_after_window() {
        let mut combo = ComboTracker::new(2000);
        combo.on_eat(0);
        combo.on_eat(500);
        assert_eq!(combo.on_eat(2500), 1.0);
        assert_eq!(combo.combo, 1);
    }

    #[test]
    fn test_first_pickup_at_time_zero_starts_fresh() {
        let mut combo = ComboTracker::new(2000);
        assert_eq!(combo.on_eat(0), 1.0);
    }

    #[test]
    fn test_update_decays_to_zero() {
        let mut combo = ComboTracker::new(2000);
        combo.on_eat(1000);
        combo.on_eat(1500);
        combo.update(3500);
        assert_eq!(combo.combo, 2);
        combo.update(3501);
        assert_eq!(combo.combo, 0);
    }

    #[test]
    fn test_achievements() {
        let mut combo = ComboTracker::new(2000);
        let mut hits = Vec::new();
        for i in 0..11u64 {
            combo.on_eat(i * 100);
            if combo.is_achievement() {
                hits.push(combo.combo);
            }
        }
        assert_eq!(hits, vec![5, 10]);
    }

    proptest! {
        #[test]
        fn prop_multiplier_table(combo in 0u32..1000) {
            let expected = if combo >= 5 {
                3.0
            } else if combo >= 3 {
                2.0
            } else if combo == 2 {
                1.5
            } else {
                1.0
            };
            prop_assert_eq!(multiplier_for(combo), expected);
        }
    }
}
