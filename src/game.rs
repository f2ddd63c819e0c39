use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::{debug, info, warn};

use crate::difficulty::{CatalogError, DifficultyCatalog, DifficultyProfile, DEFAULT_DIFFICULTY};
use crate::effects::Effect;
use crate::field::{FallingEntity, FieldDims};
use crate::input::{Action, InputEvent};
use crate::matcher;
use crate::particles::Particle;
use crate::session::{Session, SessionStats};
use crate::stats::{LifetimeStats, StatsError, StatsStore};

/// Presentation toggles. None of them change gameplay math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub sound_enabled: bool,
    pub particles_enabled: bool,
    pub dark_mode: bool,
    pub letter_effects: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            particles_enabled: true,
            dark_mode: true,
            letter_effects: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Sound,
    Particles,
    Theme,
    LetterFx,
}

impl Settings {
    pub fn toggle(&mut self, which: Toggle) {
        let flag = match which {
            Toggle::Sound => &mut self.sound_enabled,
            Toggle::Particles => &mut self.particles_enabled,
            Toggle::Theme => &mut self.dark_mode,
            Toggle::LetterFx => &mut self.letter_effects,
        };
        *flag = !*flag;
    }
}

/// Process-wide state handed to the state machine by reference
pub struct GameContext {
    pub catalog: DifficultyCatalog,
    difficulty: usize,
    pub settings: Settings,
    pub lifetime: LifetimeStats,
    pub rng: StdRng,
    pub dims: FieldDims,
    store: Box<dyn StatsStore>,
}

impl GameContext {
    /// Validates the catalog and loads lifetime statistics from `store`.
    pub fn new(
        catalog: DifficultyCatalog,
        store: Box<dyn StatsStore>,
        rng: StdRng,
    ) -> Result<Self, CatalogError> {
        catalog.validate()?;
        let difficulty = catalog.index_of(DEFAULT_DIFFICULTY).unwrap_or(0);
        let lifetime = store.load();

        Ok(Self {
            catalog,
            difficulty,
            settings: Settings::default(),
            lifetime,
            rng,
            dims: FieldDims::default(),
            store,
        })
    }

    pub fn with_seed(store: Box<dyn StatsStore>, seed: u64) -> Result<Self, CatalogError> {
        Self::new(
            DifficultyCatalog::standard(),
            store,
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn from_entropy(store: Box<dyn StatsStore>) -> Result<Self, CatalogError> {
        Self::new(DifficultyCatalog::standard(), store, StdRng::from_entropy())
    }

    pub fn difficulty(&self) -> &DifficultyProfile {
        self.catalog.at(self.difficulty)
    }

    pub fn set_difficulty(&mut self, name: &str) -> Result<(), CatalogError> {
        self.difficulty = self.catalog.index_of(name)?;
        Ok(())
    }

    fn cycle_difficulty(&mut self, forward: bool) {
        self.difficulty = if forward {
            self.catalog.next_index(self.difficulty)
        } else {
            self.catalog.prev_index(self.difficulty)
        };
        debug!(difficulty = %self.difficulty().name, "difficulty changed");
    }

    /// Merge a finished session and persist. A failed save leaves the merged
    /// in-memory record in place.
    pub fn record_session(
        &mut self,
        session: &SessionStats,
        ended_at: DateTime<Local>,
    ) -> Result<(), StatsError> {
        let difficulty = self.difficulty().name.clone();
        self.lifetime.record_session(&difficulty, session, ended_at);
        self.store.save(&self.lifetime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    Menu,
    Playing,
    Paused,
    GameOver,
    Settings,
    Statistics,
}

/// Game phase with the data only that phase owns
#[derive(Debug)]
pub enum Phase {
    Menu,
    Settings,
    Statistics,
    Playing(Box<Session>),
    Paused(Box<Session>),
    /// Finished session kept for the results screen; already merged into lifetime stats
    GameOver(Box<Session>),
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Menu => PhaseKind::Menu,
            Phase::Settings => PhaseKind::Settings,
            Phase::Statistics => PhaseKind::Statistics,
            Phase::Playing(_) => PhaseKind::Playing,
            Phase::Paused(_) => PhaseKind::Paused,
            Phase::GameOver(_) => PhaseKind::GameOver,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Phase::Playing(s) | Phase::Paused(s) | Phase::GameOver(s) => Some(s),
            Phase::Menu | Phase::Settings | Phase::Statistics => None,
        }
    }
}

/// Phase-specific meaning of an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    OpenSettings,
    OpenStats,
    CycleDifficulty { forward: bool },
    Toggle(Toggle),
    Back,
    Press(char),
    Pause,
    Resume,
    QuitToMenu,
    Restart,
    Exit,
}

fn interpret(phase: PhaseKind, event: InputEvent) -> Option<Command> {
    use InputEvent::{Action as A, Key};

    let command = match (phase, event) {
        (PhaseKind::Menu, Key(' ') | A(Action::Confirm)) => Command::Start,
        (PhaseKind::Menu, Key('s' | 'S') | A(Action::OpenSettings)) => Command::OpenSettings,
        (PhaseKind::Menu, Key('t' | 'T') | A(Action::OpenStats)) => Command::OpenStats,
        (PhaseKind::Menu, A(Action::Left | Action::CycleDifficultyLeft)) => {
            Command::CycleDifficulty { forward: false }
        }
        (PhaseKind::Menu, A(Action::Right | Action::CycleDifficultyRight)) => {
            Command::CycleDifficulty { forward: true }
        }

        (PhaseKind::Settings, Key('1') | A(Action::ToggleSound)) => Command::Toggle(Toggle::Sound),
        (PhaseKind::Settings, Key('2') | A(Action::ToggleParticles)) => {
            Command::Toggle(Toggle::Particles)
        }
        (PhaseKind::Settings, Key('3') | A(Action::ToggleTheme)) => Command::Toggle(Toggle::Theme),
        (PhaseKind::Settings, Key('4') | A(Action::ToggleLetterFx)) => {
            Command::Toggle(Toggle::LetterFx)
        }
        (PhaseKind::Settings | PhaseKind::Statistics, A(Action::Cancel)) => Command::Back,

        (PhaseKind::Playing, A(Action::Cancel)) => Command::Pause,
        (PhaseKind::Playing, Key(c)) => Command::Press(c),

        (PhaseKind::Paused, Key(' ') | A(Action::Confirm)) => Command::Resume,
        (PhaseKind::Paused, Key('q' | 'Q') | A(Action::Quit)) => Command::QuitToMenu,

        (PhaseKind::GameOver, Key('r' | 'R') | A(Action::Restart)) => Command::Restart,
        (PhaseKind::GameOver, Key('q' | 'Q') | A(Action::Quit)) => Command::Exit,

        _ => return None,
    };
    Some(command)
}

/// What the host loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Read-only view handed to the renderer once per tick
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub phase: PhaseKind,
    pub entities: &'a [FallingEntity],
    pub particles: &'a [Particle],
    pub session: Option<&'a SessionStats>,
    pub settings: &'a Settings,
    pub dims: FieldDims,
    pub difficulty: &'a str,
    pub difficulties: Vec<&'a str>,
    /// Present only on the statistics screen
    pub lifetime: Option<&'a LifetimeStats>,
}

/// Top-level phase control
#[derive(Debug)]
pub struct SessionStateMachine {
    phase: Phase,
    effects: Vec<Effect>,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Menu,
            effects: Vec::new(),
        }
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn session(&self) -> Option<&Session> {
        self.phase.session()
    }

    /// Mutable access to the running session, if any
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::Playing(s) | Phase::Paused(s) | Phase::GameOver(s) => Some(s),
            Phase::Menu | Phase::Settings | Phase::Statistics => None,
        }
    }

    /// Take the effect requests queued since the last drain.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }

    /// Apply one input event. Events the current phase does not accept are ignored.
    pub fn handle_event(&mut self, ctx: &mut GameContext, event: InputEvent) -> Flow {
        let from = self.kind();
        let Some(command) = interpret(from, event) else {
            return Flow::Continue;
        };

        let phase = mem::replace(&mut self.phase, Phase::Menu);
        let (next, flow) = self.transition(ctx, phase, command);
        self.phase = next;

        let to = self.kind();
        if from != to {
            debug!(%from, %to, "phase transition");
        }
        flow
    }

    fn transition(&mut self, ctx: &mut GameContext, phase: Phase, command: Command) -> (Phase, Flow) {
        let next = match (phase, command) {
            (Phase::Menu, Command::Start) => {
                info!(difficulty = %ctx.difficulty().name, "session started");
                Phase::Playing(Box::new(Session::new(
                    ctx.dims,
                    ctx.settings.particles_enabled,
                    Local::now(),
                )))
            }
            (Phase::Menu, Command::OpenSettings) => Phase::Settings,
            (Phase::Menu, Command::OpenStats) => Phase::Statistics,
            (Phase::Menu, Command::CycleDifficulty { forward }) => {
                ctx.cycle_difficulty(forward);
                Phase::Menu
            }

            (Phase::Settings, Command::Toggle(which)) => {
                ctx.settings.toggle(which);
                Phase::Settings
            }
            (Phase::Settings | Phase::Statistics, Command::Back) => Phase::Menu,

            (Phase::Playing(mut session), Command::Press(key)) => {
                matcher::handle_keypress(&mut session, &mut ctx.rng, key, &mut self.effects);
                Phase::Playing(session)
            }
            (Phase::Playing(session), Command::Pause) => Phase::Paused(session),

            (Phase::Paused(session), Command::Resume) => Phase::Playing(session),
            (Phase::Paused(_), Command::QuitToMenu) => {
                debug!("session abandoned");
                Phase::Menu
            }

            (Phase::GameOver(_), Command::Restart) => Phase::Menu,
            (Phase::GameOver(session), Command::Exit) => {
                return (Phase::GameOver(session), Flow::Exit);
            }

            (phase, _) => phase,
        };
        (next, Flow::Continue)
    }

    /// Advance the simulation one tick. Only the playing phase moves.
    pub fn tick(&mut self, ctx: &mut GameContext) {
        let Phase::Playing(session) = &mut self.phase else {
            return;
        };

        let profile = ctx.catalog.at(ctx.difficulty);
        session.advance_tick(
            &mut ctx.rng,
            profile,
            ctx.settings.letter_effects,
            &mut self.effects,
        );

        if session.stats.is_over() {
            self.finish(ctx);
        }
    }

    fn finish(&mut self, ctx: &mut GameContext) {
        let phase = mem::replace(&mut self.phase, Phase::Menu);
        self.phase = match phase {
            Phase::Playing(session) => {
                info!(
                    score = session.stats.score,
                    level = session.stats.level,
                    max_combo = session.stats.max_combo,
                    accuracy = session.stats.accuracy,
                    "game over"
                );
                if let Err(e) = ctx.record_session(&session.stats, Local::now()) {
                    warn!(error = %e, "could not persist statistics");
                }
                Phase::GameOver(session)
            }
            other => other,
        };
    }

    pub fn snapshot<'a>(&'a self, ctx: &'a GameContext) -> Snapshot<'a> {
        let session = self.phase.session();
        let phase = self.kind();

        Snapshot {
            phase,
            entities: session.map(|s| s.field.entities()).unwrap_or(&[]),
            particles: session.map(|s| s.particles.particles()).unwrap_or(&[]),
            session: session.map(|s| &s.stats),
            settings: &ctx.settings,
            dims: ctx.dims,
            difficulty: &ctx.difficulty().name,
            difficulties: ctx.catalog.names(),
            lifetime: (phase == PhaseKind::Statistics).then_some(&ctx.lifetime),
        }
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectTag;
    use crate::field::{EntityId, FallingEntity};
    use crate::stats::MemoryStatsStore;

    fn setup() -> (SessionStateMachine, GameContext, MemoryStatsStore) {
        let store = MemoryStatsStore::new();
        let ctx = GameContext::with_seed(Box::new(store.clone()), 42).unwrap();
        (SessionStateMachine::new(), ctx, store)
    }

    fn start(machine: &mut SessionStateMachine, ctx: &mut GameContext) {
        machine.handle_event(ctx, InputEvent::Key(' '));
        assert_eq!(machine.kind(), PhaseKind::Playing);
    }

    fn drop_one(machine: &mut SessionStateMachine, ctx: &mut GameContext) {
        let session = machine.session_mut().unwrap();
        session.stats.spawn_timer = 0;
        session
            .field
            .insert(FallingEntity::new(EntityId(10_000), '#', 600.0, 10_000.0));
        machine.tick(ctx);
    }

    #[test]
    fn starts_in_menu_with_medium() {
        let (machine, ctx, _) = setup();
        assert_eq!(machine.kind(), PhaseKind::Menu);
        assert_eq!(ctx.difficulty().name, "medium");
        assert!(machine.session().is_none());
    }

    #[test]
    fn empty_catalog_is_rejected_at_startup() {
        let result = GameContext::new(
            DifficultyCatalog::new(Vec::new()),
            Box::new(MemoryStatsStore::new()),
            StdRng::seed_from_u64(0),
        );
        assert_eq!(result.err(), Some(CatalogError::EmptyCatalog));
    }

    #[test]
    fn menu_navigation() {
        let (mut machine, mut ctx, _) = setup();

        machine.handle_event(&mut ctx, InputEvent::Key('s'));
        assert_eq!(machine.kind(), PhaseKind::Settings);
        machine.handle_event(&mut ctx, Action::Cancel.into());
        assert_eq!(machine.kind(), PhaseKind::Menu);

        machine.handle_event(&mut ctx, InputEvent::Key('t'));
        assert_eq!(machine.kind(), PhaseKind::Statistics);
        machine.handle_event(&mut ctx, Action::Cancel.into());
        assert_eq!(machine.kind(), PhaseKind::Menu);

        machine.handle_event(&mut ctx, Action::Confirm.into());
        assert_eq!(machine.kind(), PhaseKind::Playing);
    }

    #[test]
    fn difficulty_cycles_only_in_menu() {
        let (mut machine, mut ctx, _) = setup();

        machine.handle_event(&mut ctx, Action::Right.into());
        assert_eq!(ctx.difficulty().name, "hard");
        machine.handle_event(&mut ctx, Action::Right.into());
        assert_eq!(ctx.difficulty().name, "easy");
        machine.handle_event(&mut ctx, Action::CycleDifficultyLeft.into());
        assert_eq!(ctx.difficulty().name, "hard");

        start(&mut machine, &mut ctx);
        machine.handle_event(&mut ctx, Action::Left.into());
        assert_eq!(ctx.difficulty().name, "hard");
    }

    #[test]
    fn settings_toggle_by_digit_and_action() {
        let (mut machine, mut ctx, _) = setup();
        machine.handle_event(&mut ctx, Action::OpenSettings.into());

        machine.handle_event(&mut ctx, InputEvent::Key('1'));
        machine.handle_event(&mut ctx, InputEvent::Key('2'));
        machine.handle_event(&mut ctx, Action::ToggleTheme.into());
        machine.handle_event(&mut ctx, InputEvent::Key('4'));

        assert_eq!(
            ctx.settings,
            Settings {
                sound_enabled: false,
                particles_enabled: false,
                dark_mode: false,
                letter_effects: false,
            }
        );
    }

    #[test]
    fn toggles_ignored_outside_settings() {
        let (mut machine, mut ctx, _) = setup();
        machine.handle_event(&mut ctx, Action::ToggleSound.into());
        machine.handle_event(&mut ctx, InputEvent::Key('1'));
        assert_eq!(ctx.settings, Settings::default());
    }

    #[test]
    fn gameplay_keys_ignored_in_menu() {
        let (mut machine, mut ctx, _) = setup();
        let flow = machine.handle_event(&mut ctx, InputEvent::Key('x'));
        assert_eq!(flow, Flow::Continue);
        assert_eq!(machine.kind(), PhaseKind::Menu);
        assert!(machine.drain_effects().is_empty());
    }

    #[test]
    fn pause_freezes_everything() {
        let (mut machine, mut ctx, _) = setup();
        start(&mut machine, &mut ctx);
        for _ in 0..120 {
            machine.tick(&mut ctx);
        }
        machine.handle_event(&mut ctx, InputEvent::Key('?'));

        machine.handle_event(&mut ctx, Action::Cancel.into());
        assert_eq!(machine.kind(), PhaseKind::Paused);

        let before = machine.session().unwrap().clone();
        for _ in 0..30 {
            machine.tick(&mut ctx);
        }
        machine.handle_event(&mut ctx, InputEvent::Key('a'));
        let after = machine.session().unwrap();

        assert_eq!(after.field.entities(), before.field.entities());
        assert_eq!(after.particles.particles(), before.particles.particles());
        assert_eq!(after.stats, before.stats);
        assert_eq!(after.ticks, before.ticks);

        machine.handle_event(&mut ctx, InputEvent::Key(' '));
        assert_eq!(machine.kind(), PhaseKind::Playing);
        machine.tick(&mut ctx);
        assert_eq!(machine.session().unwrap().ticks, before.ticks + 1);
    }

    #[test]
    fn quit_from_pause_abandons_without_saving() {
        let (mut machine, mut ctx, store) = setup();
        start(&mut machine, &mut ctx);
        machine.handle_event(&mut ctx, Action::Cancel.into());
        machine.handle_event(&mut ctx, InputEvent::Key('q'));

        assert_eq!(machine.kind(), PhaseKind::Menu);
        assert!(machine.session().is_none());
        assert_eq!(store.save_count(), 0);
        assert_eq!(ctx.lifetime.total_games, 0);
    }

    #[test]
    fn tenth_miss_ends_session_and_saves_once() {
        let (mut machine, mut ctx, store) = setup();
        start(&mut machine, &mut ctx);

        for _ in 0..9 {
            drop_one(&mut machine, &mut ctx);
        }
        assert_eq!(machine.kind(), PhaseKind::Playing);
        assert_eq!(machine.session().unwrap().stats.missed, 9);
        assert_eq!(store.save_count(), 0);

        drop_one(&mut machine, &mut ctx);
        assert_eq!(machine.kind(), PhaseKind::GameOver);
        assert_eq!(store.save_count(), 1);
        assert_eq!(ctx.lifetime.total_games, 1);

        // game over is inert for simulation
        machine.tick(&mut ctx);
        assert_eq!(machine.session().unwrap().stats.missed, 10);

        machine.handle_event(&mut ctx, InputEvent::Key('r'));
        assert_eq!(machine.kind(), PhaseKind::Menu);
        assert_eq!(store.save_count(), 1);
        assert_eq!(ctx.lifetime.total_games, 1);
    }

    #[test]
    fn every_escape_in_a_tick_counts_before_game_over() {
        let (mut machine, mut ctx, store) = setup();
        start(&mut machine, &mut ctx);
        {
            let session = machine.session_mut().unwrap();
            session.stats.missed = 9;
            session.stats.spawn_timer = 0;
            for id in [20_000, 20_001] {
                session
                    .field
                    .insert(FallingEntity::new(EntityId(id), '#', 300.0, 10_000.0));
            }
        }

        machine.tick(&mut ctx);

        assert_eq!(machine.kind(), PhaseKind::GameOver);
        assert_eq!(machine.session().unwrap().stats.missed, 11);
        assert_eq!(store.save_count(), 1);
        assert_eq!(ctx.lifetime.total_games, 1);
    }

    #[test]
    fn quit_from_game_over_exits() {
        let (mut machine, mut ctx, _) = setup();
        start(&mut machine, &mut ctx);
        for _ in 0..10 {
            drop_one(&mut machine, &mut ctx);
        }
        assert_eq!(machine.kind(), PhaseKind::GameOver);
        assert_eq!(
            machine.handle_event(&mut ctx, InputEvent::Key('x')),
            Flow::Continue
        );
        assert_eq!(
            machine.handle_event(&mut ctx, InputEvent::Key('q')),
            Flow::Exit
        );
    }

    #[test]
    fn failed_save_keeps_session_outcome() {
        let store = MemoryStatsStore::failing();
        let mut ctx = GameContext::with_seed(Box::new(store), 1).unwrap();
        let mut machine = SessionStateMachine::new();
        start(&mut machine, &mut ctx);
        machine.session_mut().unwrap().stats.score = 55;

        for _ in 0..10 {
            drop_one(&mut machine, &mut ctx);
        }

        assert_eq!(machine.kind(), PhaseKind::GameOver);
        assert_eq!(machine.session().unwrap().stats.score, 55);
        assert_eq!(ctx.lifetime.best_score("medium"), 55);
    }

    #[test]
    fn effects_are_queued_and_drained() {
        let (mut machine, mut ctx, _) = setup();
        start(&mut machine, &mut ctx);
        machine.handle_event(&mut ctx, InputEvent::Key('%'));
        drop_one(&mut machine, &mut ctx);

        let tags: Vec<_> = machine.drain_effects().iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![EffectTag::Miss, EffectTag::Dropped]);
        assert!(machine.drain_effects().is_empty());
    }

    #[test]
    fn snapshot_reflects_phase() {
        let (mut machine, mut ctx, _) = setup();

        let snap = machine.snapshot(&ctx);
        assert_eq!(snap.phase, PhaseKind::Menu);
        assert!(snap.session.is_none());
        assert!(snap.lifetime.is_none());
        assert_eq!(snap.difficulty, "medium");
        assert_eq!(snap.difficulties, vec!["easy", "medium", "hard"]);

        machine.handle_event(&mut ctx, InputEvent::Key('t'));
        assert!(machine.snapshot(&ctx).lifetime.is_some());
        machine.handle_event(&mut ctx, Action::Cancel.into());

        start(&mut machine, &mut ctx);
        for _ in 0..60 {
            machine.tick(&mut ctx);
        }
        let snap = machine.snapshot(&ctx);
        assert_eq!(snap.phase, PhaseKind::Playing);
        assert_eq!(snap.session.unwrap().level, 1);
        assert_eq!(snap.entities.len(), 1);
    }

    #[test]
    fn phase_kind_display() {
        assert_eq!(PhaseKind::GameOver.to_string(), "GAME_OVER");
        assert_eq!(PhaseKind::Menu.to_string(), "MENU");
    }
}
