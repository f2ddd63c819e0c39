use crate::color::Rgb;
use crate::{FIELD_HEIGHT, FIELD_WIDTH, TICKS_PER_SECOND};

/// Fraction of the field height where the danger zone begins
pub const DANGER_THRESHOLD: f64 = 0.7;

/// Logical size of the playing field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDims {
    pub width: f64,
    pub height: f64,
}

impl FieldDims {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.width / 2.0).floor(), (self.height / 2.0).floor())
    }

    pub fn danger_line(&self) -> f64 {
        self.height * DANGER_THRESHOLD
    }
}

impl Default for FieldDims {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// A character falling down the field
#[derive(Debug, Clone, PartialEq)]
pub struct FallingEntity {
    pub id: EntityId,
    pub character: char,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub color: Rgb,
    pub scale: f64,
    pub rotation: f64,
}

impl FallingEntity {
    pub fn new(id: EntityId, character: char, x: f64, speed: f64) -> Self {
        Self {
            id,
            character,
            x,
            y: 0.0,
            speed,
            color: Rgb::WHITE,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// An entity that fell past the bottom edge this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escaped {
    pub x: f64,
}

/// Owns the live entities in spawn order
#[derive(Debug, Clone, Default)]
pub struct EntityField {
    dims: FieldDims,
    entities: Vec<FallingEntity>,
}

impl EntityField {
    pub fn new(dims: FieldDims) -> Self {
        Self {
            dims,
            entities: Vec::new(),
        }
    }

    pub fn dims(&self) -> FieldDims {
        self.dims
    }

    pub fn entities(&self) -> &[FallingEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn insert(&mut self, entity: FallingEntity) {
        self.entities.push(entity);
    }

    /// Remove and return the first entity (in spawn order) showing `character`.
    pub fn take_first(&mut self, character: char) -> Option<FallingEntity> {
        let idx = self.entities.iter().position(|e| e.character == character)?;
        Some(self.entities.remove(idx))
    }

    /// Move every entity down by its speed, refresh its appearance and
    /// remove the ones that left the field. `tick` is the session tick counter.
    pub fn advance_tick(&mut self, tick: u64, letter_effects: bool) -> Vec<Escaped> {
        let danger_line = self.dims.danger_line();
        let height = self.dims.height;
        let (rotation, scale) = if letter_effects {
            wobble(tick)
        } else {
            (0.0, 1.0)
        };

        let mut dropped = Vec::new();
        self.entities.retain_mut(|entity| {
            entity.y += entity.speed;
            if entity.y > danger_line {
                entity.color = Rgb::danger((entity.y - danger_line) / (height - danger_line));
            }
            entity.rotation = rotation;
            entity.scale = scale;

            if entity.y > height {
                dropped.push(Escaped { x: entity.x });
                false
            } else {
                true
            }
        });
        dropped
    }
}

/// Letter rotation (degrees) and scale for a given tick
fn wobble(tick: u64) -> (f64, f64) {
    let t_ms = tick as f64 * 1000.0 / TICKS_PER_SECOND as f64;
    ((t_ms * 0.003).sin() * 10.0, 1.0 + (t_ms * 0.005).sin() * 0.1)
}
