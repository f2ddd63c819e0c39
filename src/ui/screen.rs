use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    game::{PhaseKind, Snapshot},
    session::MISS_LIMIT,
    stats::LifetimeStats,
    ui::{field_to_cell, render_centered, render_particles, to_color, Theme},
};

/// A UI Screen boundary: one per game phase
pub trait Screen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer);
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        let difficulties = snap
            .difficulties
            .iter()
            .map(|name| {
                if *name == snap.difficulty {
                    format!("[{name}]")
                } else {
                    name.to_string()
                }
            })
            .join("  ");

        let lines = vec![
            Line::styled(
                "LETTERFALL",
                theme.accent(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Line::default(),
            Line::styled("SPACE - start", theme.text()),
            Line::styled("S - settings", theme.text()),
            Line::styled("T - statistics", theme.text()),
            Line::default(),
            Line::from(vec![
                Span::styled("Difficulty: ", theme.text()),
                Span::styled(difficulties, theme.accent(Color::Green)),
            ]),
            Line::styled("← → to change", theme.text().add_modifier(Modifier::DIM)),
        ];
        render_centered(lines, area.height / 4, area, buf);
    }
}

pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        if snap.settings.particles_enabled {
            render_particles(snap.particles, snap.dims, area, buf);
        }

        for entity in snap.entities {
            let Some((x, y)) = field_to_cell(snap.dims, area, entity.x, entity.y) else {
                continue;
            };
            let mut style = Style::default().fg(to_color(entity.color));
            if snap.settings.letter_effects && entity.scale > 1.0 {
                style = style.add_modifier(Modifier::BOLD);
            }
            let mut glyph = [0u8; 4];
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(entity.character.encode_utf8(&mut glyph));
                cell.set_style(style);
            }
        }

        if let Some(stats) = snap.session {
            let hud = [
                (format!("Score: {}", stats.score), Color::White),
                (format!("Level: {}", stats.level), Color::Green),
                (format!("Combo: {}", stats.combo), Color::Blue),
                (format!("Max combo: {}", stats.max_combo), Color::Yellow),
                (format!("Accuracy: {}%", stats.accuracy), Color::White),
            ];
            for (row, (text, color)) in hud.into_iter().enumerate() {
                put_str(buf, area, area.x + 1, area.y + row as u16, &text, theme.accent(color));
            }

            let missed = format!("Missed: {}/{}", stats.missed, MISS_LIMIT);
            put_right(buf, area, area.y, &missed, theme.accent(Color::Red));
            put_right(buf, area, area.y + 1, snap.difficulty, theme.text());
        }
    }
}

pub struct PausedScreen;

impl Screen for PausedScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        PlayingScreen.render(snap, theme, area, buf);
        buf.set_style(area, Style::default().add_modifier(Modifier::DIM));

        let lines = vec![
            Line::styled("PAUSED", theme.accent(Color::Yellow).add_modifier(Modifier::BOLD)),
            Line::styled("SPACE - resume", theme.text()),
            Line::styled("Q - quit to menu", theme.text()),
        ];
        render_overlay(lines, theme, area, buf);
    }
}

pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        let Some(stats) = snap.session else {
            return;
        };
        let lines = vec![
            Line::styled("GAME OVER", theme.accent(Color::Red).add_modifier(Modifier::BOLD)),
            Line::default(),
            Line::styled(format!("Final score: {}", stats.score), theme.text()),
            Line::styled(format!("Level: {}", stats.level), theme.accent(Color::Green)),
            Line::styled(format!("Max combo: {}", stats.max_combo), theme.accent(Color::Yellow)),
            Line::styled(format!("Accuracy: {}%", stats.accuracy), theme.text()),
            Line::default(),
            Line::styled("R - restart", theme.text()),
            Line::styled("Q - quit", theme.text()),
        ];
        render_centered(lines, area.height / 4, area, buf);
    }
}

pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        let on_off = |flag: bool| if flag { "On" } else { "Off" };
        let settings = snap.settings;
        let rows = [
            ("1", "Sound", on_off(settings.sound_enabled)),
            ("2", "Particles", on_off(settings.particles_enabled)),
            ("3", "Theme", if settings.dark_mode { "Dark" } else { "Light" }),
            ("4", "Letter effects", on_off(settings.letter_effects)),
        ];

        let mut lines = vec![
            Line::styled("SETTINGS", theme.accent(Color::Yellow).add_modifier(Modifier::BOLD)),
            Line::default(),
        ];
        lines.extend(rows.into_iter().map(|(key, label, value)| {
            Line::from(vec![
                Span::styled(format!("{key}  {label}: "), theme.text()),
                Span::styled(value, theme.accent(Color::Green)),
            ])
        }));
        lines.push(Line::default());
        lines.push(Line::styled("ESC - back to menu", theme.text()));

        render_centered(lines, area.height / 4, area, buf);
    }
}

pub struct StatisticsScreen;

impl Screen for StatisticsScreen {
    fn render(&self, snap: &Snapshot<'_>, theme: &Theme, area: Rect, buf: &mut Buffer) {
        let Some(lifetime) = snap.lifetime else {
            return;
        };
        let mut lines = vec![
            Line::styled("STATISTICS", theme.accent(Color::Yellow).add_modifier(Modifier::BOLD)),
            Line::default(),
        ];
        lines.extend(statistics_lines(lifetime, &snap.difficulties).into_iter().map(
            |text| Line::styled(text, theme.text()),
        ));
        lines.push(Line::default());
        lines.push(Line::styled("ESC - back to menu", theme.text()));

        render_centered(lines, area.height / 6, area, buf);
    }
}

fn statistics_lines(lifetime: &LifetimeStats, difficulties: &[&str]) -> Vec<String> {
    let (hours, minutes) = lifetime.total_time_hm();
    let mut lines = vec![
        format!("Games played: {}", lifetime.total_games),
        format!("Time played: {hours}h {minutes}m"),
    ];
    lines.extend(
        difficulties
            .iter()
            .map(|name| format!("Best {name}: {}", lifetime.best_score(name))),
    );
    lines.push(format!("Average accuracy: {}%", lifetime.average_accuracy));
    lines.push(format!("Longest combo: {}", lifetime.longest_combo));
    lines.push(format!(
        "Last session: {}",
        lifetime.last_session.as_deref().unwrap_or("never")
    ));
    lines
}

/// Write `text` at (x, y) when the position is inside `area`.
fn put_str(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
    if x >= area.right() || y >= area.bottom() {
        return;
    }
    buf.set_stringn(x, y, text, (area.right() - x) as usize, style);
}

fn put_right(buf: &mut Buffer, area: Rect, y: u16, text: &str, style: Style) {
    let width = text.width() as u16;
    let x = area.right().saturating_sub(width + 1).max(area.x);
    put_str(buf, area, x, y, text, style);
}

fn render_overlay(lines: Vec<Line<'_>>, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 6;
    let height = lines.len() as u16 + 2;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
    .intersection(area);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(theme.base())
        .block(Block::default().borders(Borders::ALL).style(theme.base()))
        .render(popup, buf);
}

/// Helper to construct the screen for the current phase
pub fn current_screen(phase: PhaseKind) -> Box<dyn Screen> {
    match phase {
        PhaseKind::Menu => Box::new(MenuScreen),
        PhaseKind::Playing => Box::new(PlayingScreen),
        PhaseKind::Paused => Box::new(PausedScreen),
        PhaseKind::GameOver => Box::new(GameOverScreen),
        PhaseKind::Settings => Box::new(SettingsScreen),
        PhaseKind::Statistics => Box::new(StatisticsScreen),
    }
}
