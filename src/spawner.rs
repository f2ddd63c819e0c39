use rand::seq::SliceRandom;
use rand::Rng;

use crate::difficulty::DifficultyProfile;
use crate::field::{EntityId, FallingEntity, FieldDims};
use crate::TICKS_PER_SECOND;

/// Horizontal inset keeping spawned characters off the field edges
pub const SPAWN_MARGIN: i64 = 50;

/// Ticks between spawns: `floor(60 / (spawn_rate + level * 0.2))`
pub fn spawn_interval(profile: &DifficultyProfile, level: u32) -> f64 {
    (TICKS_PER_SECOND as f64 / (profile.spawn_rate + level as f64 * 0.2)).floor()
}

/// Speed of an entity spawned at `level`
pub fn entity_speed(profile: &DifficultyProfile, level: u32) -> f64 {
    profile.base_speed * (1.0 + level as f64 * 0.1)
}

/// Threshold-driven spawner. Hands out unique ids for the whole session.
#[derive(Debug, Clone)]
pub struct EntitySpawner {
    dims: FieldDims,
    next_id: u64,
}

impl EntitySpawner {
    pub fn new(dims: FieldDims) -> Self {
        Self { dims, next_id: 1 }
    }

    /// Count one tick on `spawn_timer` and spawn once it reaches the interval,
    /// resetting the timer. Firing is never skipped once the threshold is met.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        profile: &DifficultyProfile,
        level: u32,
        spawn_timer: &mut u32,
    ) -> Option<FallingEntity> {
        *spawn_timer += 1;
        if (*spawn_timer as f64) < spawn_interval(profile, level) {
            return None;
        }
        *spawn_timer = 0;

        // Catalog validation at startup guarantees a non-empty set.
        let character = *profile.characters.choose(rng)?;
        let max_x = (self.dims.width as i64 - SPAWN_MARGIN).max(SPAWN_MARGIN);
        let x = rng.gen_range(SPAWN_MARGIN..=max_x) as f64;

        let id = EntityId(self.next_id);
        self.next_id += 1;

        Some(FallingEntity::new(
            id,
            character,
            x,
            entity_speed(profile, level),
        ))
    }
}

impl Default for EntitySpawner {
    fn default() -> Self {
        Self::new(FieldDims::default())
    }
}
