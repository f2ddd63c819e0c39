use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use letterfall::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    effects::{Effect, EffectTag},
    game::{Flow, GameContext, SessionStateMachine},
    input::{from_key_event, is_interrupt},
    runtime::{CrosstermEventSource, FixedTicker, Runner, TermEvent},
    stats::{FileStatsStore, StatsStore},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// falling-letter reflex typing game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Letters fall down the screen; type them before they reach the bottom. Hits build combos and levels, ten misses end the game, and lifetime statistics are kept between runs."
)]
pub struct Cli {
    /// difficulty to start with (overrides the saved preference)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<SupportedDifficulty>,

    /// seed the letter generator for a reproducible run
    #[clap(long)]
    seed: Option<u64>,

    /// where lifetime statistics are kept
    #[clap(long)]
    stats_file: Option<PathBuf>,

    /// where preferences are kept
    #[clap(long)]
    config_file: Option<PathBuf>,

    /// where the log is written
    #[clap(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupportedDifficulty {
    Easy,
    Medium,
    Hard,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.clone());

    let config_store = match &cli.config_file {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = config_store.load();

    let mut ctx = build_context(&cli, &config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut ctx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = config_store.save(&Config::from(&ctx)) {
        warn!(error = %e, "could not save preferences");
    }
    info!("exiting");

    result
}

fn build_context(cli: &Cli, config: &Config) -> Result<GameContext, Box<dyn Error>> {
    let stats_store: Box<dyn StatsStore> = match &cli.stats_file {
        Some(path) => Box::new(FileStatsStore::with_path(path)),
        None => Box::new(FileStatsStore::new()),
    };

    let mut ctx = match cli.seed {
        Some(seed) => GameContext::with_seed(stats_store, seed)?,
        None => GameContext::from_entropy(stats_store)?,
    };

    ctx.settings = config.settings();
    if let Err(e) = ctx.set_difficulty(&config.difficulty) {
        warn!(error = %e, "ignoring saved difficulty");
    }
    if let Some(difficulty) = cli.difficulty {
        ctx.set_difficulty(&difficulty.to_string())?;
    }

    info!(
        difficulty = %ctx.difficulty().name,
        seed = ?cli.seed,
        games = ctx.lifetime.total_games,
        "starting"
    );
    Ok(ctx)
}

/// Logs go to a file since the terminal belongs to the game. No file, no logs.
fn init_logging(path: Option<PathBuf>) {
    let Some(path) = path.or_else(AppDirs::log_path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    ctx: &mut GameContext,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::game_rate());
    let mut machine = SessionStateMachine::new();

    loop {
        for event in runner.next_frame() {
            let TermEvent::Key(key) = event else {
                // a resize is picked up by the next draw
                continue;
            };
            if is_interrupt(&key) {
                return Ok(());
            }
            let Some(input) = from_key_event(key) else {
                continue;
            };
            if machine.handle_event(ctx, input) == Flow::Exit {
                return Ok(());
            }
        }

        machine.tick(ctx);

        let effects = machine.drain_effects();
        if ctx.settings.sound_enabled && effects.iter().any(rings_bell) {
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }

        terminal.draw(|f| f.render_widget(&machine.snapshot(ctx), f.area()))?;
    }
}

/// Hits are too frequent for the bell; only misses and level-ups ring it.
fn rings_bell(effect: &Effect) -> bool {
    effect.has_sound() && effect.tag != EffectTag::Hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use letterfall::color::Rgb;
    use letterfall::stats::MemoryStatsStore;

    #[test]
    fn cli_parses_every_flag() {
        let cli = Cli::try_parse_from([
            "letterfall",
            "-d",
            "hard",
            "--seed",
            "7",
            "--stats-file",
            "/tmp/s.json",
            "--config-file",
            "/tmp/c.json",
            "--log-file",
            "/tmp/l.log",
        ])
        .unwrap();

        assert_eq!(cli.difficulty.map(|d| d.to_string()).as_deref(), Some("hard"));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.stats_file, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn rejects_unknown_difficulty() {
        assert!(Cli::try_parse_from(["letterfall", "-d", "insane"]).is_err());
    }

    #[test]
    fn cli_difficulty_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "letterfall",
            "-d",
            "easy",
            "--seed",
            "1",
            "--stats-file",
            dir.path().join("stats.json").to_str().unwrap(),
        ])
        .unwrap();
        let config = Config {
            difficulty: "hard".into(),
            dark_mode: false,
            ..Config::default()
        };

        let ctx = build_context(&cli, &config).unwrap();

        assert_eq!(ctx.difficulty().name, "easy");
        assert!(!ctx.settings.dark_mode);
    }

    #[test]
    fn unknown_saved_difficulty_falls_back() {
        let config = Config {
            difficulty: "legendary".into(),
            ..Config::default()
        };
        let mut ctx = GameContext::with_seed(Box::new(MemoryStatsStore::new()), 0).unwrap();
        assert!(ctx.set_difficulty(&config.difficulty).is_err());
        assert_eq!(ctx.difficulty().name, "medium");
    }

    #[test]
    fn bell_for_misses_and_level_ups() {
        assert!(rings_bell(&Effect::with_burst(
            EffectTag::Miss,
            600.0,
            450.0,
            Rgb::RED
        )));
        assert!(rings_bell(&Effect::new(EffectTag::LevelUp)));
        assert!(!rings_bell(&Effect::new(EffectTag::Hit)));
        assert!(!rings_bell(&Effect::new(EffectTag::Dropped)));
    }
}
