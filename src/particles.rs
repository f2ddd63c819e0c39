use rand::Rng;

use crate::color::Rgb;

/// Life lost per tick; a particle lives for roughly fifty ticks.
pub const LIFE_DECAY: f64 = 0.02;
pub const BURST_SIZE: usize = 10;

const MIN_SPEED: f64 = 2.0;
const MAX_SPEED: f64 = 5.0;

/// Short-lived cosmetic particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub color: Rgb,
    pub life: f64,
}

impl Particle {
    fn random<R: Rng + ?Sized>(rng: &mut R, x: f64, y: f64, color: Rgb) -> Self {
        let angle = rng.gen_range(0.0..360.0_f64).to_radians();
        let speed = rng.gen_range(MIN_SPEED..=MAX_SPEED);

        Self {
            x,
            y,
            vel_x: speed * angle.cos(),
            vel_y: speed * angle.sin(),
            color,
            life: 1.0,
        }
    }

    /// Integrate one tick; returns whether the particle is still alive.
    fn update(&mut self) -> bool {
        self.x += self.vel_x;
        self.y += self.vel_y;
        self.life -= LIFE_DECAY;
        self.life > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    enabled: bool,
}

impl ParticleSystem {
    pub fn new(enabled: bool) -> Self {
        Self {
            particles: Vec::new(),
            enabled,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Emit `count` particles from a point. No-op while particle effects are off.
    pub fn spawn_burst<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        x: f64,
        y: f64,
        color: Rgb,
        count: usize,
    ) {
        if !self.enabled {
            return;
        }
        self.particles
            .extend((0..count).map(|_| Particle::random(rng, x, y, color)));
    }

    pub fn advance_tick(&mut self) {
        self.particles.retain_mut(|particle| particle.update());
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(true)
    }
}
