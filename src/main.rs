mod api;
mod app;
mod config;
mod events;
mod logging;
mod models;
mod session;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use api::CringeClient;
use app::App;
use config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing();

    let mut config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    args.apply(&mut config);

    let client = CringeClient::new(&config.server_url, config.request_timeout)
        .context("Failed to create HTTP client")?;
    let reachable = client.health_check().await;
    if !reachable {
        tracing::warn!(server_url = %config.server_url, "generation server is not reachable");
    }

    let mut app = App::new(&config, Arc::new(client));
    app.server_reachable = Some(reachable);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

const fn handle_help_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if !app.show_help {
        return false;
    }

    match key {
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_help();
        }
        KeyCode::Esc => {
            app.show_help = false;
        }
        _ => {}
    }
    true
}

fn handle_keyboard_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
    if handle_help_keys(app, key, modifiers) {
        return;
    }

    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            return;
        }
        _ if app.exit_pending => {
            // Any other key cancels pending exit and is processed normally
            app.exit_pending = false;
        }
        _ => {}
    }

    match key {
        KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Char('h') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_help(),
        KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.more_cringe();
        }
        KeyCode::Esc => {
            app.cancel_generation();
        }
        KeyCode::Enter => {
            app.generate();
        }

        KeyCode::Tab => app.next_post_type(),
        KeyCode::BackTab => app.previous_post_type(),
        KeyCode::Right => app.increase_cringe(),
        KeyCode::Left => app.decrease_cringe(),

        KeyCode::Up => app.view_mut().scroll_up(1),
        KeyCode::Down => app.view_mut().scroll_down(1),
        KeyCode::PageUp => app.view_mut().scroll_up(10),
        KeyCode::PageDown => app.view_mut().scroll_down(10),
        KeyCode::Home => app.view_mut().scroll_to_top(),
        KeyCode::End => app.view_mut().scroll_to_bottom(),

        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.input_buffer.push(c);
        }

        _ => {}
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Apply streamed updates before drawing
        app.controller.poll_updates();

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_keyboard_input(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            app.cancel_generation();
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, EventStream, Transport};
    use crate::models::{AppConfig, GenerateRequest, PostType};
    use crate::session::SessionStatus;
    use futures::future::BoxFuture;

    struct PendingTransport;

    impl Transport for PendingTransport {
        fn open(&self, _request: GenerateRequest) -> BoxFuture<'static, Result<EventStream, ApiError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn app() -> App {
        App::new(&AppConfig::default(), Arc::new(PendingTransport))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_keyboard_input(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_typing_edits_topic() {
        let mut app = app();
        type_text(&mut app, "coffeee");
        handle_keyboard_input(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.input_buffer, "coffee");
    }

    #[test]
    fn test_ctrl_c_requires_confirmation() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.exit_pending);
        assert!(!app.should_quit);

        handle_keyboard_input(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.exit_pending);

        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_keyboard_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_popup_swallows_keys() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Char('h'), KeyModifiers::CONTROL);
        assert!(app.show_help);
        handle_keyboard_input(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(app.input_buffer.is_empty());
        handle_keyboard_input(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.show_help);
    }

    #[test]
    fn test_enter_with_empty_topic_flags_input() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.status(), SessionStatus::Idle);
        assert!(app.view().is_input_invalid());
    }

    #[tokio::test]
    async fn test_enter_generates_and_esc_cancels() {
        let mut app = app();
        type_text(&mut app, "coffee");
        handle_keyboard_input(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.status(), SessionStatus::Generating);

        handle_keyboard_input(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.status(), SessionStatus::Cancelled);
    }

    #[test]
    fn test_selector_keys() {
        let mut app = app();
        handle_keyboard_input(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.post_type, PostType::Inspirational);
        handle_keyboard_input(&mut app, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(app.post_type, PostType::HumbleBrag);

        handle_keyboard_input(&mut app, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.cringe_level.get(), 9);
        handle_keyboard_input(&mut app, KeyCode::Left, KeyModifiers::NONE);
        handle_keyboard_input(&mut app, KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(app.cringe_level.get(), 7);
    }
}
