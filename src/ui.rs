pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Widget},
};

use crate::{color::Rgb, field::FieldDims, game::Snapshot, particles::Particle};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &Snapshot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = Theme::new(self.settings.dark_mode);
        buf.set_style(area, theme.base());
        screen::current_screen(self.phase).render(self, &theme, area, buf);
    }
}

/// Colours derived from the dark-mode setting
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
}

impl Theme {
    pub fn new(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                background: Color::Black,
                text: Color::White,
            }
        } else {
            Self {
                background: Color::White,
                text: Color::Black,
            }
        }
    }

    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Light colours from the HUD palette become unreadable on a white background.
    pub fn accent(&self, color: Color) -> Style {
        match (self.background, color) {
            (Color::White, Color::White) => self.text(),
            (Color::White, Color::Yellow) => Style::default().fg(Color::Rgb(180, 140, 0)),
            _ => Style::default().fg(color),
        }
    }
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Map a logical field position onto a terminal cell inside `area`.
pub fn field_to_cell(dims: FieldDims, area: Rect, x: f64, y: f64) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    if x < 0.0 || y < 0.0 || x > dims.width || y > dims.height {
        return None;
    }
    let col = (x / dims.width * (area.width - 1) as f64).round();
    let row = (y / dims.height * (area.height - 1) as f64).round();
    Some((area.x + col as u16, area.y + row as u16))
}

/// Render a block of centered lines starting `top` rows into `area`.
pub fn render_centered(lines: Vec<Line<'_>>, top: u16, area: Rect, buf: &mut Buffer) {
    let inner = area.inner(ratatui::layout::Margin {
        horizontal: HORIZONTAL_MARGIN,
        vertical: VERTICAL_MARGIN,
    });
    if top >= inner.height {
        return;
    }
    let target = Rect {
        y: inner.y + top,
        height: inner.height - top,
        ..inner
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(target, buf);
}

/// Particles fade from `*` to `.` as their life runs out.
pub fn render_particles(particles: &[Particle], dims: FieldDims, area: Rect, buf: &mut Buffer) {
    for particle in particles {
        let Some((x, y)) = field_to_cell(dims, area, particle.x, particle.y) else {
            continue;
        };

        let (symbol, style) = if particle.life > 0.6 {
            (
                "*",
                Style::default()
                    .fg(to_color(particle.color))
                    .add_modifier(Modifier::BOLD),
            )
        } else if particle.life > 0.3 {
            ("·", Style::default().fg(to_color(particle.color)))
        } else {
            (
                ".",
                Style::default()
                    .fg(to_color(particle.color))
                    .add_modifier(Modifier::DIM),
            )
        };

        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(symbol);
            cell.set_style(style);
        }
    }
}
