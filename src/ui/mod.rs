pub mod input;
pub mod layout;
pub mod list;
pub mod theme;

use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use layout::{compute_layout, Screen};
use theme::Theme;

/// Build a [`Block`] with focused or unfocused styling.
///
/// Focused: thick borders in the accent color with a highlighted title badge.
/// Unfocused: plain gray borders with a dimmed title.
pub fn focused_block(title_text: &str, focused: bool) -> Block<'_> {
    if focused {
        Block::default()
            .title(Line::from(Span::styled(title_text, Theme::focused_title())))
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(Style::default().fg(Theme::BORDER_FOCUSED))
    } else {
        Block::default()
            .title(Line::from(Span::styled(title_text, Theme::unfocused_title())))
            .borders(Borders::ALL)
            .border_type(BorderType::Plain)
            .border_style(Style::default().fg(Theme::BORDER_UNFOCUSED))
    }
}

/// Paint a settings [`Screen`] over the whole frame.
pub fn draw_screen(frame: &mut Frame, screen: &Screen) {
    let layout = &screen.layout;
    let areas = compute_layout(frame.area(), layout.error().is_some());

    let header = vec![
        Line::from(Span::styled(
            format!(" {} ", layout.title),
            Theme::focused_title(),
        )),
        Line::from(Span::styled(layout.subtitle.as_str(), Theme::subtitle())),
    ];
    frame.render_widget(Paragraph::new(header), areas.header);

    let title = format!(" {} ", layout.title);
    let body = Paragraph::new(screen.body.as_str())
        .style(Theme::body())
        .wrap(Wrap { trim: false })
        .block(focused_block(&title, screen.editing));
    frame.render_widget(body, areas.body);

    if let (Some(area), Some(error)) = (areas.error, layout.error()) {
        let line = Line::from(Span::styled(format!("✗ {error}"), Theme::error()));
        frame.render_widget(Paragraph::new(line), area);
    }

    let help = Line::from(Span::styled(layout.help.as_str(), Theme::keybind()));
    frame.render_widget(Paragraph::new(help), areas.footer);
}
