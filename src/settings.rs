//! Player preferences
//!
//! Sound and music toggles are persisted as JSON booleans under their own
//! keys. `reduced_particles` is a per-device display choice and is not
//! stored.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, MUSIC_ENABLED_KEY, SOUND_ENABLED_KEY, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Sound effects on/off
    pub sound_enabled: bool,
    /// Background music on/off
    pub music_enabled: bool,
    /// Lower particle caps for slow devices
    pub reduced_particles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            reduced_particles: false,
        }
    }
}

impl Settings {
    /// Load stored toggles; absent or malformed entries keep their default
    pub fn load(storage: &impl Storage) -> Self {
        let defaults = Self::default();
        let settings = Self {
            sound_enabled: persistence::load_value(storage, SOUND_ENABLED_KEY)
                .unwrap_or(defaults.sound_enabled),
            music_enabled: persistence::load_value(storage, MUSIC_ENABLED_KEY)
                .unwrap_or(defaults.music_enabled),
            reduced_particles: defaults.reduced_particles,
        };
        log::info!(
            "Loaded settings (sound {}, music {})",
            settings.sound_enabled,
            settings.music_enabled
        );
        settings
    }

    pub fn save(&self, storage: &mut impl Storage) {
        persistence::save_value(storage, SOUND_ENABLED_KEY, &self.sound_enabled);
        persistence::save_value(storage, MUSIC_ENABLED_KEY, &self.music_enabled);
        log::debug!("Settings saved");
    }
}
