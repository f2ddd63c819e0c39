use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyCatalog;
use crate::session::SessionStats;

const LAST_SESSION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to write statistics: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode statistics: {0}")]
    Json(#[from] serde_json::Error),
}

/// Aggregate record that survives across sessions and restarts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifetimeStats {
    pub total_games: u32,
    /// Whole seconds spent in finished sessions
    pub total_time: u64,
    pub best_scores: BTreeMap<String, u32>,
    pub average_accuracy: u32,
    pub total_keys_pressed: u64,
    pub correct_keys_pressed: u64,
    pub longest_combo: u32,
    pub last_session: Option<String>,
}

impl LifetimeStats {
    /// Zeroed record with a best-score slot for every profile in the catalog
    pub fn for_catalog(catalog: &DifficultyCatalog) -> Self {
        Self {
            total_games: 0,
            total_time: 0,
            best_scores: catalog
                .names()
                .into_iter()
                .map(|name| (name.to_string(), 0))
                .collect(),
            average_accuracy: 0,
            total_keys_pressed: 0,
            correct_keys_pressed: 0,
            longest_combo: 0,
            last_session: None,
        }
    }

    pub fn best_score(&self, difficulty: &str) -> u32 {
        self.best_scores.get(difficulty).copied().unwrap_or(0)
    }

    /// Fold a finished session into the lifetime totals.
    pub fn record_session(
        &mut self,
        difficulty: &str,
        session: &SessionStats,
        ended_at: DateTime<Local>,
    ) {
        let elapsed = (ended_at - session.started_at).num_seconds().max(0) as u64;

        self.total_games += 1;
        self.total_time += elapsed;

        let best = self.best_scores.entry(difficulty.to_string()).or_insert(0);
        *best = (*best).max(session.score);

        self.longest_combo = self.longest_combo.max(session.max_combo);
        self.total_keys_pressed += session.total_keys_pressed as u64;
        self.correct_keys_pressed += session.correct_keys_pressed as u64;
        self.average_accuracy =
            percentage(self.correct_keys_pressed, self.total_keys_pressed);
        self.last_session = Some(ended_at.format(LAST_SESSION_FORMAT).to_string());
    }

    /// Total play time as (hours, minutes)
    pub fn total_time_hm(&self) -> (u64, u64) {
        (self.total_time / 3600, (self.total_time % 3600) / 60)
    }
}

impl Default for LifetimeStats {
    fn default() -> Self {
        Self::for_catalog(&DifficultyCatalog::standard())
    }
}

/// `round(correct / max(1, total) * 100)`, halves rounding to even
pub fn percentage(correct: u64, total: u64) -> u32 {
    ((correct as f64 / total.max(1) as f64) * 100.0).round_ties_even() as u32
}

/// Load/save contract for the lifetime record
pub trait StatsStore {
    /// Never fails: a missing or unreadable record yields the zeroed default.
    fn load(&self) -> LifetimeStats;
    fn save(&self, stats: &LifetimeStats) -> Result<(), StatsError>;
}

/// JSON document on disk
#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::stats_path().unwrap_or_else(|| PathBuf::from("letterfall_stats.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> LifetimeStats {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no statistics on disk, starting fresh");
                return LifetimeStats::default();
            }
        };

        match serde_json::from_slice::<LifetimeStats>(&bytes) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "statistics file is corrupt, using defaults");
                LifetimeStats::default()
            }
        }
    }

    fn save(&self, stats: &LifetimeStats) -> Result<(), StatsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(stats)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-process store. Clones share the same slot, so a test can keep a handle
/// after passing one into the game.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsStore {
    saved: Rc<RefCell<Option<LifetimeStats>>>,
    saves: Rc<RefCell<usize>>,
    fail_saves: bool,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every save fails with an I/O error
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<LifetimeStats> {
        self.saved.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> LifetimeStats {
        self.saved.borrow().clone().unwrap_or_default()
    }

    fn save(&self, stats: &LifetimeStats) -> Result<(), StatsError> {
        if self.fail_saves {
            return Err(StatsError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        *self.saved.borrow_mut() = Some(stats.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
