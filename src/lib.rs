// Library surface for headless/integration tests and reuse.
// The terminal host in main.rs only wires these together.
pub mod app_dirs;
pub mod color;
pub mod config;
pub mod difficulty;
pub mod effects;
pub mod field;
pub mod game;
pub mod input;
pub mod matcher;
pub mod particles;
pub mod runtime;
pub mod session;
pub mod spawner;
pub mod stats;
pub mod ui;

/// Simulation cadence
pub const TICKS_PER_SECOND: u32 = 60;

/// Logical field size; the renderer scales it onto the terminal.
pub const FIELD_WIDTH: f64 = 1200.0;
pub const FIELD_HEIGHT: f64 = 900.0;
