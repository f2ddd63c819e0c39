use thiserror::Error;

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LETTERS_AND_DIGITS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_DIFFICULTY: &str = "medium";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("difficulty {0} has an empty character set")]
    EmptyCharacterSet(String),

    #[error("no difficulties configured")]
    EmptyCatalog,
}

/// Tuning for one named difficulty
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub name: String,
    pub base_speed: f64,
    pub spawn_rate: f64,
    pub characters: Vec<char>,
}

impl DifficultyProfile {
    pub fn new(name: &str, base_speed: f64, spawn_rate: f64, characters: &str) -> Self {
        Self {
            name: name.to_string(),
            base_speed,
            spawn_rate,
            characters: characters.chars().collect(),
        }
    }
}

/// Ordered, immutable set of profiles. Order is the left/right cycle order in the menu.
#[derive(Debug, Clone)]
pub struct DifficultyCatalog {
    profiles: Vec<DifficultyProfile>,
}

impl DifficultyCatalog {
    pub fn new(profiles: Vec<DifficultyProfile>) -> Self {
        Self { profiles }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            DifficultyProfile::new("easy", 2.0, 1.0, LETTERS),
            DifficultyProfile::new("medium", 3.0, 1.2, LETTERS_AND_DIGITS),
            DifficultyProfile::new("hard", 5.0, 1.5, LETTERS_AND_DIGITS),
        ])
    }

    /// Startup check: at least one profile, and every profile has something to spawn.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        if let Some(empty) = self.profiles.iter().find(|p| p.characters.is_empty()) {
            return Err(CatalogError::EmptyCharacterSet(empty.name.clone()));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&DifficultyProfile, CatalogError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CatalogError::UnknownDifficulty(name.to_string()))
    }

    pub fn index_of(&self, name: &str) -> Result<usize, CatalogError> {
        self.profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| CatalogError::UnknownDifficulty(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profile at `index`, wrapping around the catalog.
    pub fn at(&self, index: usize) -> &DifficultyProfile {
        &self.profiles[index % self.profiles.len()]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.profiles.len()
    }

    pub fn prev_index(&self, index: usize) -> usize {
        (index + self.profiles.len() - 1) % self.profiles.len()
    }
}

impl Default for DifficultyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
