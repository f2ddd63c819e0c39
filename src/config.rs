use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::difficulty::DEFAULT_DIFFICULTY;
use crate::game::{GameContext, Settings};

/// User preferences persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub difficulty: String,
    pub sound_enabled: bool,
    pub particles_enabled: bool,
    pub dark_mode: bool,
    pub letter_effects: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_parts(DEFAULT_DIFFICULTY, &Settings::default())
    }
}

impl Config {
    fn from_parts(difficulty: &str, settings: &Settings) -> Self {
        Self {
            difficulty: difficulty.to_string(),
            sound_enabled: settings.sound_enabled,
            particles_enabled: settings.particles_enabled,
            dark_mode: settings.dark_mode,
            letter_effects: settings.letter_effects,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            sound_enabled: self.sound_enabled,
            particles_enabled: self.particles_enabled,
            dark_mode: self.dark_mode,
            letter_effects: self.letter_effects,
        }
    }
}

impl From<&GameContext> for Config {
    fn from(ctx: &GameContext) -> Self {
        Self::from_parts(&ctx.difficulty().name, &ctx.settings)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("letterfall_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
