//! Power-ups and the timed effects they grant

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Pulls nearby food toward the head
    Magnet,
    /// Absorbs one collision
    Shield,
    /// Doubles base food points
    #[serde(rename = "score_x2")]
    DoubleScore,
    /// Instantly cuts the tail
    Shorten,
}

impl PowerUpKind {
    /// Catalog order used for uniform spawn selection
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Magnet,
        PowerUpKind::Shield,
        PowerUpKind::DoubleScore,
        PowerUpKind::Shorten,
    ];

    /// Whether pickup stores an expiring effect (everything except shorten)
    pub fn is_timed(self) -> bool {
        !matches!(self, PowerUpKind::Shorten)
    }

    /// HUD label
    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "MAGNET",
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::DoubleScore => "X2",
            PowerUpKind::Shorten => "CUT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "Magnet",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::DoubleScore => "Double Score",
            PowerUpKind::Shorten => "Shorten",
        }
    }

    /// Display color (0xRRGGBB), also used for pickup particles
    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::Magnet => 0xfbbf24,
            PowerUpKind::Shield => 0x60a5fa,
            PowerUpKind::DoubleScore => 0xd946ef,
            PowerUpKind::Shorten => 0xef4444,
        }
    }
}

/// A power-up lying on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: IVec2,
    pub kind: PowerUpKind,
    /// Ticks left before it disappears on its own
    pub life: u32,
    /// Bobbing animation phase (cosmetic)
    pub anim_phase: f32,
}

impl PowerUp {
    pub fn new(pos: IVec2, kind: PowerUpKind, life: u32) -> Self {
        Self {
            pos,
            kind,
            life,
            anim_phase: 0.0,
        }
    }

    /// Age by one tick
    pub fn update(&mut self) {
        self.life = self.life.saturating_sub(1);
        self.anim_phase += 0.15;
    }

    pub fn is_expired(&self) -> bool {
        self.life == 0
    }
}

/// Active power-up effects, one absolute expiry (ms) per timed kind.
///
/// Expiry is checked lazily against the current time; stale entries are
/// simply inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub magnet_until: Option<u64>,
    pub shield_until: Option<u64>,
    pub double_score_until: Option<u64>,
}

impl ActiveEffects {
    fn slot(&self, kind: PowerUpKind) -> Option<u64> {
        match kind {
            PowerUpKind::Magnet => self.magnet_until,
            PowerUpKind::Shield => self.shield_until,
            PowerUpKind::DoubleScore => self.double_score_until,
            PowerUpKind::Shorten => None,
        }
    }

    fn slot_mut(&mut self, kind: PowerUpKind) -> Option<&mut Option<u64>> {
        match kind {
            PowerUpKind::Magnet => Some(&mut self.magnet_until),
            PowerUpKind::Shield => Some(&mut self.shield_until),
            PowerUpKind::DoubleScore => Some(&mut self.double_score_until),
            PowerUpKind::Shorten => None,
        }
    }

    /// Insert or overwrite the expiry for a timed effect (no-op for shorten)
    pub fn activate(&mut self, kind: PowerUpKind, expires_at: u64) {
        if let Some(slot) = self.slot_mut(kind) {
            *slot = Some(expires_at);
        }
    }

    pub fn clear(&mut self, kind: PowerUpKind) {
        if let Some(slot) = self.slot_mut(kind) {
            *slot = None;
        }
    }

    pub fn is_active(&self, kind: PowerUpKind, now: u64) -> bool {
        self.slot(kind).is_some_and(|until| until > now)
    }

    /// Unexpired effects with their expiry time, in catalog order
    pub fn active(&self, now: u64) -> impl Iterator<Item = (PowerUpKind, u64)> + '_ {
        PowerUpKind::ALL
            .into_iter()
            .filter_map(move |kind| self.slot(kind).filter(|&until| until > now).map(|u| (kind, u)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_expires_lazily() {
        let mut effects = ActiveEffects::default();
        effects.activate(PowerUpKind::Magnet, 8000);
        assert!(effects.is_active(PowerUpKind::Magnet, 7999));
        assert!(!effects.is_active(PowerUpKind::Magnet, 8000));
        // Entry stays stored, it just reads as inactive
        assert_eq!(effects.magnet_until, Some(8000));
        assert_eq!(effects.active(9000).count(), 0);
    }

    #[test]
    fn test_activate_overwrites_and_shorten_is_never_stored() {
        let mut effects = ActiveEffects::default();
        effects.activate(PowerUpKind::Shield, 1000);
        effects.activate(PowerUpKind::Shield, 5000);
        effects.activate(PowerUpKind::Shorten, 5000);
        assert_eq!(effects.shield_until, Some(5000));
        assert!(!effects.is_active(PowerUpKind::Shorten, 0));

        let active: Vec<_> = effects.active(0).collect();
        assert_eq!(active, vec![(PowerUpKind::Shield, 5000)]);

        effects.clear(PowerUpKind::Shield);
        assert!(!effects.is_active(PowerUpKind::Shield, 0));
    }

    #[test]
    fn test_powerup_ages_out() {
        let mut p = PowerUp::new(IVec2::new(1, 1), PowerUpKind::Magnet, 2);
        p.update();
        assert!(!p.is_expired());
        p.update();
        assert!(p.is_expired());
        p.update();
        assert_eq!(p.life, 0);
    }

    #[test]
    fn test_kind_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&PowerUpKind::DoubleScore).unwrap(),
            "\"score_x2\""
        );
        assert_eq!(serde_json::to_string(&PowerUpKind::Magnet).unwrap(), "\"magnet\"");
    }
}
