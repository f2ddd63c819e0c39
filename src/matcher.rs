use rand::Rng;

use crate::color::Rgb;
use crate::effects::{Effect, EffectTag};
use crate::field::FallingEntity;
use crate::particles::BURST_SIZE;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Hit(FallingEntity),
    Miss,
}

/// Uppercase a key press when it maps to exactly one character.
pub fn normalize(key: char) -> char {
    let mut upper = key.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(c), None) => c,
        _ => key,
    }
}

/// Resolve a key press against the live entities. The first entity in spawn
/// order showing the key wins; everything else stays on the field.
pub fn handle_keypress<R: Rng + ?Sized>(
    session: &mut Session,
    rng: &mut R,
    key: char,
    effects: &mut Vec<Effect>,
) -> MatchResult {
    let key = normalize(key);

    match session.field.take_first(key) {
        Some(entity) => {
            let levelled_up = session.stats.record_hit();
            session
                .particles
                .spawn_burst(rng, entity.x, entity.y, Rgb::GREEN, BURST_SIZE);
            effects.push(Effect::with_burst(
                EffectTag::Hit,
                entity.x,
                entity.y,
                Rgb::GREEN,
            ));
            if levelled_up {
                effects.push(Effect::new(EffectTag::LevelUp));
            }
            MatchResult::Hit(entity)
        }
        None => {
            session.stats.record_wrong();
            let (cx, cy) = session.field.dims().center();
            session
                .particles
                .spawn_burst(rng, cx, cy, Rgb::RED, BURST_SIZE);
            effects.push(Effect::with_burst(EffectTag::Miss, cx, cy, Rgb::RED));
            MatchResult::Miss
        }
    }
}
