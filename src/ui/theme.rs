use ratatui::style::{Color, Modifier, Style};

/// Centralized color and style constants for the settings screen.
pub struct Theme;

impl Theme {
    // ── Accent ──────────────────────────────────────────────────────────────

    pub const ACCENT: Color = Color::Cyan;

    // ── Text hierarchy ──────────────────────────────────────────────────────

    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_MUTED: Color = Color::DarkGray;

    // ── Borders ─────────────────────────────────────────────────────────────

    pub const BORDER_FOCUSED: Color = Color::Cyan;
    pub const BORDER_UNFOCUSED: Color = Color::Gray;

    // ── Keybind hints ───────────────────────────────────────────────────────

    pub const KEYBIND_HINT: Color = Color::Yellow;

    // ── Danger / destructive ────────────────────────────────────────────────

    pub const DANGER: Color = Color::Red;

    pub const INVERTED_FG: Color = Color::Black;

    // ── Composite styles ────────────────────────────────────────────────────

    /// Bold black on accent background.
    pub fn focused_title() -> Style {
        Style::default()
            .fg(Self::INVERTED_FG)
            .bg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn unfocused_title() -> Style {
        Style::default().fg(Self::BORDER_UNFOCUSED)
    }

    pub fn subtitle() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn body() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Help line at the bottom of every screen.
    pub fn keybind() -> Style {
        Style::default().fg(Self::KEYBIND_HINT)
    }

    /// The layout's error slot.
    pub fn error() -> Style {
        Style::default()
            .fg(Self::DANGER)
            .add_modifier(Modifier::BOLD)
    }
}
