//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::ConnectionState;
use crate::source::DecisionAction;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for actions that need attention soon.
    pub warning: Color,
    /// Color for disconnection and urgent actions.
    pub critical: Color,
    /// Color for a live connection and "no action" decisions.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn connection_style(&self, state: ConnectionState) -> Style {
        match state {
            ConnectionState::Connected => Style::default().fg(self.healthy),
            ConnectionState::Disconnected => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Style for a decision action tag, keyed on its qualifier.
    pub fn action_style(&self, action: &DecisionAction) -> Style {
        match action.parts() {
            None => Style::default().fg(self.healthy),
            Some((_, "urgent" | "critical")) => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
            Some(_) => Style::default().fg(self.warning),
        }
    }

    /// Color for a heat intensity, from cool to hot over `0.0..=1.0`.
    pub fn heat_color(&self, intensity: f64) -> Color {
        let t = intensity.clamp(0.0, 1.0);
        if t < 0.25 {
            Color::Blue
        } else if t < 0.5 {
            Color::Green
        } else if t < 0.75 {
            Color::Yellow
        } else {
            Color::Red
        }
    }
}

/// Parse a `#rrggbb` palette entry.
pub fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) if digits.len() == 6 => Color::Rgb(r, g, b),
        _ => Color::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#3b82f6"), Color::Rgb(0x3b, 0x82, 0xf6));
        assert_eq!(hex_color("nope"), Color::Reset);
    }

    #[test]
    fn test_action_style() {
        let theme = Theme::dark();
        let none = DecisionAction("none".to_string());
        let urgent = DecisionAction("water_urgent".to_string());
        assert_eq!(theme.action_style(&none).fg, Some(theme.healthy));
        assert_eq!(theme.action_style(&urgent).fg, Some(theme.critical));
    }
}
