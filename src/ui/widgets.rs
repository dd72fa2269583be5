use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::models::CringeLevel;
use crate::session::{RenderMode, SessionStatus};

const PLACEHOLDER: &str = "e.g. I made a great cup of coffee this morning";
const INVALID_PLACEHOLDER: &str = "Please enter a topic first! ☝️";

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "CringeIn - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Generate:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Enter         - Generate post"),
        Line::from("  Ctrl+R        - More cringe (+2) and regenerate"),
        Line::from("  Esc           - Cancel generation"),
        Line::from("  Tab/Shift+Tab - Change post type"),
        Line::from("  Left/Right    - Change cringe level"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Scroll post"),
        Line::from("  PgUp/PgDn     - Scroll post"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C (x2)   - Quit application"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 56;
    let popup_height = 23;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

pub fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "CringeIn",
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " — LinkedIn Post Generator",
            Style::default().fg(Color::Gray),
        ),
    ];
    if app.server_reachable == Some(false) {
        spans.push(Span::styled(
            format!("  (server unreachable: {})", app.server_url),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_topic_input(frame: &mut Frame, app: &App, area: Rect) {
    let invalid = app.view().is_input_invalid();

    let (text, text_style) = if !app.input_buffer.is_empty() {
        (
            app.input_buffer.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else if invalid {
        (INVALID_PLACEHOLDER, Style::default().fg(Color::Red))
    } else {
        (PLACEHOLDER, Style::default().fg(Color::Gray))
    };

    let border = if invalid { Color::Red } else { Color::Cyan };

    let input = Paragraph::new(text)
        .style(text_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Topic ")
                .border_style(Style::default().fg(border)),
        );

    frame.render_widget(input, area);
}

/// Badge color runs from green at level 1 to red at level 10
pub const fn cringe_color(level: CringeLevel) -> Color {
    match level.get() {
        1..=3 => Color::Green,
        4..=5 => Color::Yellow,
        6..=8 => Color::LightRed,
        _ => Color::Red,
    }
}

pub fn render_options(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::raw(" Post type: "),
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.post_type.label(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
        Span::raw("    Cringe: "),
        Span::styled(
            format!(" {} ", app.cringe_level.label()),
            Style::default()
                .fg(Color::Black)
                .bg(cringe_color(app.cringe_level))
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_generate_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match app.status() {
        SessionStatus::Generating | SessionStatus::Streaming => (
            "⏳ Generating cringe... (Esc to cancel)".to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        SessionStatus::Cancelled => (
            "🚀 Generate Post (Enter)  · cancelled".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        SessionStatus::Complete => (
            format!(
                "🚀 Generate Post (Enter)  · {} words",
                app.controller.accumulated_text().split_whitespace().count()
            ),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        SessionStatus::Idle | SessionStatus::Errored => (
            "🚀 Generate Post (Enter)".to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let topic = app
        .controller
        .current()
        .filter(|_| app.is_generating())
        .map(|session| format!("  \"{}\"", session.request().topic))
        .unwrap_or_default();

    let line = Line::from(vec![
        Span::styled(format!(" {text}"), style),
        Span::styled(topic, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Thousands separators, e.g. 1247 -> "1,247"
pub fn format_count(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_post_card(frame: &mut Frame, app: &mut App, area: Rect) {
    let view = app.view();
    let persona = view.persona;

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("[{}] ", persona.initials),
                Style::default().fg(Color::White).bg(Color::Blue),
            ),
            Span::styled(
                format!(" {}", persona.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(" • 1st", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            persona.title,
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled("1h • 🌐", Style::default().fg(Color::DarkGray))),
        Line::from(""),
    ];

    if let Some(error) = &view.error {
        lines.push(Line::from(Span::styled(
            format!("❌ {error}"),
            Style::default().fg(Color::Red),
        )));
    } else if view.mode == RenderMode::Streaming {
        lines.extend(super::markdown::render_streaming_lines(&view.content));
    } else if view.content.is_empty() {
        lines.push(Line::from(Span::styled(
            "Your cringe post will appear here...",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(super::markdown::render_markdown_to_lines(&view.content));
    }

    if view.extras_visible {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw(format!("👍❤️💡 {}", format_count(persona.reactions))),
            Span::styled(
                format!(
                    "    {} comments • {} reposts",
                    format_count(persona.comments),
                    format_count(persona.reposts)
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            "👍 Like    💬 Comment    🔁 Repost    📤 Send",
            Style::default().fg(Color::Gray),
        )));
    }

    // Account for wrapping to find the true scroll limit
    let available_width = area.width.saturating_sub(2).max(1) as usize;
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = view.scroll_offset.min(max_scroll);

    let card = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(card, area);

    // Sync the clamped scroll back so scrolling up works immediately
    let view = app.view_mut();
    if view.scroll_offset != actual_scroll {
        view.scroll_offset = actual_scroll;
    }
    view.follow_tail = actual_scroll >= max_scroll;
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Enter: Generate | Ctrl+R: More Cringe | Esc: Cancel | Ctrl+H: Help | Ctrl+Q: Quit",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}
