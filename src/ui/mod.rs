pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Topic input
            Constraint::Length(1), // Post type + cringe level
            Constraint::Length(1), // Generate button / status
            Constraint::Min(6),    // Post card
            Constraint::Length(1), // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_title(frame, app, chunks[0]);
    widgets::render_topic_input(frame, app, chunks[1]);
    widgets::render_options(frame, app, chunks[2]);
    widgets::render_generate_status(frame, app, chunks[3]);
    widgets::render_post_card(frame, app, chunks[4]);
    widgets::render_bottom_bar(frame, app, chunks[5]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, EventStream, Transport};
    use crate::models::{AppConfig, GenerateRequest};
    use crate::session::{RenderMode, Renderer};
    use futures::future::BoxFuture;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct PendingTransport;

    impl Transport for PendingTransport {
        fn open(&self, _request: GenerateRequest) -> BoxFuture<'static, Result<EventStream, ApiError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_render_idle_screen() {
        let mut app = App::new(&AppConfig::default(), Arc::new(PendingTransport));
        let screen = draw(&mut app);
        assert!(screen.contains("Generate Post"));
        assert!(screen.contains("Humble Brag"));
        assert!(screen.contains("8 — Maximum Cringe"));
    }

    #[test]
    fn test_render_final_post_with_extras() {
        let mut app = App::new(&AppConfig::default(), Arc::new(PendingTransport));
        app.view_mut()
            .render_text("I **love** coffee.", RenderMode::Final);
        app.view_mut().show_extras();

        let screen = draw(&mut app);
        assert!(screen.contains("I love coffee."));
        assert!(screen.contains("comments"));
    }

    #[test]
    fn test_render_error_replaces_content() {
        let mut app = App::new(&AppConfig::default(), Arc::new(PendingTransport));
        app.view_mut().render_text("partial", RenderMode::Streaming);
        app.view_mut().render_error("rate limited");

        let screen = draw(&mut app);
        assert!(screen.contains("rate limited"));
        assert!(!screen.contains("partial"));
        assert!(!screen.contains("comments"));
    }

    #[test]
    fn test_scrolled_up_card_stays_put_while_streaming() {
        let mut app = App::new(&AppConfig::default(), Arc::new(PendingTransport));
        let long_post: String = (0..40).map(|i| format!("line {i}\n")).collect();
        app.view_mut().render_text(&long_post, RenderMode::Streaming);
        draw(&mut app);
        assert!(app.view().follow_tail);
        let bottom = app.view().scroll_offset;
        assert!(bottom > 0);

        app.view_mut().scroll_up(1);
        draw(&mut app);
        assert!(!app.view().follow_tail);

        let longer = format!("{long_post}line 40\nline 41\n");
        app.view_mut().render_text(&longer, RenderMode::Streaming);
        draw(&mut app);
        assert_eq!(app.view().scroll_offset, bottom - 1);

        app.view_mut().scroll_down(100);
        draw(&mut app);
        assert!(app.view().follow_tail);
    }

    #[test]
    fn test_render_help_window() {
        let mut app = App::new(&AppConfig::default(), Arc::new(PendingTransport));
        app.toggle_help();
        let screen = draw(&mut app);
        assert!(screen.contains("Keyboard Shortcuts"));
    }
}
