use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Title, subtitle, help text and an error slot wrapped around a screen body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: String,
    pub subtitle: String,
    pub help: String,
    error: Option<String>,
}

impl ScreenLayout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Plain-text rendering of the whole screen around `body`.
    pub fn render(&self, body: &str) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if !self.subtitle.is_empty() {
            out.push_str(&self.subtitle);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(body);
        out.push('\n');
        if let Some(error) = &self.error {
            out.push('\n');
            out.push_str("✗ ");
            out.push_str(error);
            out.push('\n');
        }
        if !self.help.is_empty() {
            out.push('\n');
            out.push_str(&self.help);
            out.push('\n');
        }
        out
    }
}

/// One fully described frame: chrome plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub layout: ScreenLayout,
    pub body: String,
    /// A text input has focus; the body is drawn highlighted.
    pub editing: bool,
}

impl Screen {
    pub fn render(&self) -> String {
        self.layout.render(&self.body)
    }
}

pub struct ScreenAreas {
    pub header: Rect,
    pub body: Rect,
    pub error: Option<Rect>,
    pub footer: Rect,
}

/// Vertical split: header | body | error | footer.
pub fn compute_layout(area: Rect, has_error: bool) -> ScreenAreas {
    let error_height = if has_error { 1 } else { 0 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(error_height),
            Constraint::Length(1),
        ])
        .split(area);

    ScreenAreas {
        header: vertical[0],
        body: vertical[1],
        error: has_error.then_some(vertical[2]),
        footer: vertical[3],
    }
}
