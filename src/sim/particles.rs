//! Cosmetic feedback: particle bursts and screen shake
//!
//! Nothing here affects gameplay. It lives in the sim so bursts line up
//! with the tick that caused them.

use glam::{IVec2, Vec2};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::GRID_SIZE;

/// Particle colors (0xRRGGBB)
pub const FOOD_COLOR: u32 = 0xf472b6;
pub const SHIELD_COLOR: u32 = 0x60a5fa;

/// A particle for visual effects (canvas units)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// 1.0 at birth, removed at 0
    pub life: f32,
    pub decay: f32,
    pub size: f32,
}

/// PCG stream for particle jitter, distinct from the gameplay stream
const PARTICLE_STREAM: u64 = 0x5eed_f00d;

const PARTICLE_GRAVITY: f32 = 0.1;
const PARTICLE_DRAG: f32 = 0.95;

impl Particle {
    fn new<R: Rng>(cell: IVec2, color: u32, rng: &mut R) -> Self {
        let half = GRID_SIZE as f32 / 2.0;
        let pos = cell.as_vec2() * GRID_SIZE as f32 + Vec2::splat(half);
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = rng.random::<f32>() * 3.0 + 2.0;
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color,
            life: 1.0,
            decay: rng.random::<f32>() * 0.02 + 0.015,
            size: rng.random::<f32>() * 4.0 + 2.0,
        }
    }

    fn update(&mut self) {
        self.pos += self.vel;
        self.vel.y += PARTICLE_GRAVITY;
        self.vel *= PARTICLE_DRAG;
        self.life -= self.decay;
        self.size *= 0.96;
    }
}

/// Bounded pool of live particles
///
/// Owns its RNG so the number of particles drawn never shifts the
/// gameplay stream.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    /// Per-burst cap (reduced on low-end devices), None for no cap
    pub burst_cap: Option<usize>,
    rng: Pcg32,
}

impl ParticleSystem {
    pub fn new(reduced: bool, seed: u64) -> Self {
        let mut system = Self {
            particles: Vec::new(),
            max_particles: 0,
            burst_cap: None,
            rng: Pcg32::new(seed, PARTICLE_STREAM),
        };
        system.set_reduced(reduced);
        system
    }

    /// Switch budget; live particles over the new cap are dropped
    pub fn set_reduced(&mut self, reduced: bool) {
        if reduced {
            self.max_particles = 50;
            self.burst_cap = Some(15);
        } else {
            self.max_particles = 100;
            self.burst_cap = None;
        }
        self.particles.truncate(self.max_particles);
    }

    /// Burst of `count` particles from the center of a cell
    pub fn emit(&mut self, cell: IVec2, color: u32, count: usize) {
        let count = self.burst_cap.map_or(count, |cap| count.min(cap));
        let free = self.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(free) {
            self.particles.push(Particle::new(cell, color, &mut self.rng));
        }
    }

    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.update();
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Screen shake countdown; the renderer jitters by up to `intensity` units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub frames: u32,
    pub intensity: f32,
}

impl ScreenShake {
    pub fn trigger(&mut self, frames: u32, intensity: f32) {
        self.frames = frames;
        self.intensity = intensity;
    }

    pub fn update(&mut self) {
        self.frames = self.frames.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.frames > 0
    }
}
