use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::Transport;
use crate::models::{AppConfig, CringeLevel, Persona, PostType};
use crate::session::{RenderMode, Renderer, SessionController, SessionStatus, SessionTimeouts};

/// How long the empty-topic cue stays visible
pub const INVALID_INPUT_CUE: Duration = Duration::from_secs(2);

/// The post card. Receives render calls from the live session.
#[derive(Debug)]
pub struct PostView {
    pub persona: &'static Persona,
    pub content: String,
    pub mode: RenderMode,
    pub error: Option<String>,
    pub extras_visible: bool,
    pub invalid_input_at: Option<Instant>,
    pub scroll_offset: usize,
    /// Streaming text keeps the card scrolled to the end
    pub follow_tail: bool,
}

impl PostView {
    pub fn new() -> Self {
        Self {
            persona: &crate::models::PERSONAS[0],
            content: String::new(),
            mode: RenderMode::Final,
            error: None,
            extras_visible: false,
            invalid_input_at: None,
            scroll_offset: 0,
            follow_tail: true,
        }
    }

    pub fn is_input_invalid(&self) -> bool {
        self.invalid_input_at
            .is_some_and(|at| at.elapsed() < INVALID_INPUT_CUE)
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
        self.follow_tail = false;
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.follow_tail = false;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped to the real maximum when the card is drawn
        self.scroll_offset = usize::MAX;
        self.follow_tail = true;
    }
}

impl Default for PostView {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PostView {
    fn clear(&mut self) {
        self.content.clear();
        self.mode = RenderMode::Final;
        self.error = None;
        self.extras_visible = false;
        self.scroll_offset = 0;
        self.follow_tail = true;
    }

    fn render_text(&mut self, text: &str, mode: RenderMode) {
        self.content.clear();
        self.content.push_str(text);
        self.mode = mode;
        self.error = None;
        if mode == RenderMode::Streaming && self.follow_tail {
            self.scroll_to_bottom();
        }
    }

    fn render_error(&mut self, message: &str) {
        self.content.clear();
        self.mode = RenderMode::Final;
        self.error = Some(message.to_string());
    }

    fn show_extras(&mut self) {
        self.extras_visible = true;
    }

    fn input_invalid(&mut self) {
        self.invalid_input_at = Some(Instant::now());
    }
}

pub struct App {
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    pub input_buffer: String,
    pub post_type: PostType,
    pub cringe_level: CringeLevel,
    pub server_url: String,
    pub server_reachable: Option<bool>,
    pub controller: SessionController<PostView>,
}

impl App {
    pub fn new(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            should_quit: false,
            exit_pending: false,
            show_help: false,
            input_buffer: String::new(),
            post_type: config.default_post_type,
            cringe_level: config.default_cringe_level,
            server_url: config.server_url.clone(),
            server_reachable: None,
            controller: SessionController::new(
                transport,
                PostView::new(),
                SessionTimeouts::from_config(config),
            ),
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn view(&self) -> &PostView {
        self.controller.renderer()
    }

    pub fn view_mut(&mut self) -> &mut PostView {
        self.controller.renderer_mut()
    }

    pub fn status(&self) -> SessionStatus {
        self.controller.status()
    }

    pub fn is_generating(&self) -> bool {
        self.controller.is_generating()
    }

    /// Start a generation from the current inputs, replacing any running one
    pub fn generate(&mut self) -> bool {
        let started = self
            .controller
            .start_generation(&self.input_buffer, self.post_type, self.cringe_level)
            .is_some();
        if started {
            self.view_mut().persona = Persona::random();
        }
        started
    }

    /// Raise the cringe level by two and generate again
    pub fn more_cringe(&mut self) -> bool {
        self.cringe_level = self.cringe_level.bumped();
        self.generate()
    }

    pub fn cancel_generation(&mut self) -> bool {
        self.controller.cancel_current()
    }

    pub fn next_post_type(&mut self) {
        self.post_type = self.post_type.next();
    }

    pub fn previous_post_type(&mut self) {
        self.post_type = self.post_type.previous();
    }

    pub fn increase_cringe(&mut self) {
        self.cringe_level = self.cringe_level.increment();
    }

    pub fn decrease_cringe(&mut self) {
        self.cringe_level = self.cringe_level.decrement();
    }
}
