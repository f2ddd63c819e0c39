use crate::color::Rgb;

/// What happened, for the audio/visual collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EffectTag {
    /// Correct key press
    Hit,
    /// Wrong key press
    Miss,
    /// A character fell off the bottom of the field
    Dropped,
    LevelUp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub tag: EffectTag,
    pub burst: Option<Burst>,
}

impl Effect {
    pub fn new(tag: EffectTag) -> Self {
        Self { tag, burst: None }
    }

    pub fn with_burst(tag: EffectTag, x: f64, y: f64, color: Rgb) -> Self {
        Self {
            tag,
            burst: Some(Burst { x, y, color }),
        }
    }

    /// Whether the request carries a sound cue
    pub fn has_sound(&self) -> bool {
        !matches!(self.tag, EffectTag::Dropped)
    }
}
