use chrono::{DateTime, Local};
use rand::Rng;

use crate::color::Rgb;
use crate::difficulty::DifficultyProfile;
use crate::effects::{Effect, EffectTag};
use crate::field::{EntityField, FieldDims};
use crate::particles::{ParticleSystem, BURST_SIZE};
use crate::spawner::EntitySpawner;
use crate::stats::percentage;

/// Dropped characters that end a session
pub const MISS_LIMIT: u32 = 10;

/// Counters for one play session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub score: u32,
    pub missed: u32,
    pub level: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub spawn_timer: u32,
    pub total_keys_pressed: u32,
    pub correct_keys_pressed: u32,
    pub accuracy: u32,
    pub started_at: DateTime<Local>,
}

impl SessionStats {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            score: 0,
            missed: 0,
            level: 1,
            combo: 0,
            max_combo: 0,
            spawn_timer: 0,
            total_keys_pressed: 0,
            correct_keys_pressed: 0,
            accuracy: 100,
            started_at,
        }
    }

    /// Count a correct press. Returns true when this press levelled up.
    pub fn record_hit(&mut self) -> bool {
        self.total_keys_pressed += 1;
        self.correct_keys_pressed += 1;
        self.score += 1 + self.combo;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.refresh_accuracy();

        if self.score > self.level * 100 {
            self.level += 1;
            true
        } else {
            false
        }
    }

    pub fn record_wrong(&mut self) {
        self.total_keys_pressed += 1;
        self.combo = 0;
        self.refresh_accuracy();
    }

    pub fn record_drop(&mut self) {
        self.missed += 1;
        self.combo = 0;
    }

    pub fn is_over(&self) -> bool {
        self.missed >= MISS_LIMIT
    }

    fn refresh_accuracy(&mut self) {
        self.accuracy = percentage(
            self.correct_keys_pressed as u64,
            self.total_keys_pressed as u64,
        );
    }
}

/// Everything one play session owns: counters, live entities, particles.
#[derive(Debug, Clone)]
pub struct Session {
    pub stats: SessionStats,
    pub field: EntityField,
    pub particles: ParticleSystem,
    pub spawner: EntitySpawner,
    pub ticks: u64,
}

impl Session {
    pub fn new(dims: FieldDims, particles_enabled: bool, started_at: DateTime<Local>) -> Self {
        Self {
            stats: SessionStats::new(started_at),
            field: EntityField::new(dims),
            particles: ParticleSystem::new(particles_enabled),
            spawner: EntitySpawner::new(dims),
            ticks: 0,
        }
    }

    /// One simulation step: spawn, fall and drop detection, particle decay.
    pub fn advance_tick<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        profile: &DifficultyProfile,
        letter_effects: bool,
        effects: &mut Vec<Effect>,
    ) {
        self.ticks += 1;

        if let Some(entity) =
            self.spawner
                .maybe_spawn(rng, profile, self.stats.level, &mut self.stats.spawn_timer)
        {
            self.field.insert(entity);
        }

        let bottom = self.field.dims().height;
        for drop in self.field.advance_tick(self.ticks, letter_effects) {
            self.stats.record_drop();
            self.particles
                .spawn_burst(rng, drop.x, bottom, Rgb::RED, BURST_SIZE);
            effects.push(Effect::with_burst(EffectTag::Dropped, drop.x, bottom, Rgb::RED));
        }

        self.particles.advance_tick();
    }
}
