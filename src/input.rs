use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Named actions the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    Confirm,
    Cancel,
    Left,
    Right,
    OpenSettings,
    OpenStats,
    ToggleSound,
    ToggleParticles,
    ToggleTheme,
    ToggleLetterFx,
    CycleDifficultyLeft,
    CycleDifficultyRight,
    Restart,
    Quit,
    FullscreenToggle,
}

/// A single key-down delivered to the core: a printable character or an action.
/// Characters are interpreted per phase (a `q` quits from the pause screen but
/// is a gameplay press while playing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Key(char),
    Action(Action),
}

impl From<Action> for InputEvent {
    fn from(action: Action) -> Self {
        InputEvent::Action(action)
    }
}

impl From<char> for InputEvent {
    fn from(c: char) -> Self {
        InputEvent::Key(c)
    }
}

/// Map a terminal key event onto the core vocabulary.
pub fn from_key_event(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(c) => Some(InputEvent::Key(c)),
        KeyCode::Enter => Some(Action::Confirm.into()),
        KeyCode::Esc => Some(Action::Cancel.into()),
        KeyCode::Left => Some(Action::Left.into()),
        KeyCode::Right => Some(Action::Right.into()),
        KeyCode::F(11) => Some(Action::FullscreenToggle.into()),
        _ => None,
    }
}

/// Ctrl+C, handled by the host regardless of phase
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}
