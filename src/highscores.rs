//! Best score across sessions
//!
//! A single number shared by both modes, stored as JSON under
//! `snakeHighScore`.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, HIGH_SCORE_KEY, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    pub fn load(storage: &impl Storage) -> Self {
        let best = persistence::load_value(storage, HIGH_SCORE_KEY).unwrap_or(0);
        log::info!("Loaded high score {}", best);
        Self { best }
    }

    /// Record a score; persists and returns true only when it beats the best
    pub fn submit(&mut self, score: u64, storage: &mut impl Storage) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        persistence::save_value(storage, HIGH_SCORE_KEY, &self.best);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_submit_only_saves_improvements() {
        let mut storage = MemoryStorage::new();
        let mut high = HighScore::load(&storage);
        assert_eq!(high.best, 0);

        assert!(high.submit(80, &mut storage));
        assert!(!high.submit(80, &mut storage));
        assert!(!high.submit(30, &mut storage));
        assert_eq!(storage.get_item(HIGH_SCORE_KEY).as_deref(), Some("80"));

        assert_eq!(HighScore::load(&storage).best, 80);
    }

    #[test]
    fn test_malformed_value_reads_as_zero() {
        let mut storage = MemoryStorage::new();
        storage.set_item(HIGH_SCORE_KEY, "\"abc\"").unwrap();
        assert_eq!(HighScore::load(&storage).best, 0);
    }
}
