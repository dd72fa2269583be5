// Generation session state machine

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::Transport;
use crate::events::{Event, SessionId, SessionMessage, SessionUpdate};
use crate::models::{AppConfig, CringeLevel, GenerateRequest, PostType};

pub const STREAM_CLOSED_MESSAGE: &str = "Stream closed unexpectedly";
pub const TIMED_OUT_MESSAGE: &str = "Timed out waiting for the server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Generating,
    Streaming,
    Complete,
    Errored,
    Cancelled,
}

impl SessionStatus {
    /// Generating or Streaming: the session may still mutate the view
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Generating | Self::Streaming)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Errored | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Partial text, show an in-progress affordance
    Streaming,
    /// Complete text, apply full formatting
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Until the response headers arrive
    pub open: Duration,
    /// Between two body chunks
    pub idle: Duration,
}

impl SessionTimeouts {
    pub const fn from_config(config: &AppConfig) -> Self {
        Self {
            open: Duration::from_secs(config.request_timeout),
            idle: Duration::from_secs(config.stream_idle_timeout),
        }
    }
}

/// Presentation side of a session. Every call comes from the live session only.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer {
    /// A new session started: empty content, extras hidden
    fn clear(&mut self);
    fn render_text(&mut self, text: &str, mode: RenderMode);
    fn render_error(&mut self, message: &str);
    /// Reactions and share controls become relevant
    fn show_extras(&mut self);
    /// Generation was requested with an empty topic
    fn input_invalid(&mut self);
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    request: GenerateRequest,
    accumulated_text: String,
    status: SessionStatus,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Session {
    pub const fn request(&self) -> &GenerateRequest {
        &self.request
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    fn transition(&mut self, status: SessionStatus) {
        tracing::debug!(session = %self.id, from = ?self.status, to = ?status, "session transition");
        self.status = status;
    }

    fn abort(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Owns at most one live generation session.
pub struct SessionController<R: Renderer> {
    transport: Arc<dyn Transport>,
    renderer: R,
    current: Option<Session>,
    timeouts: SessionTimeouts,
    tx: mpsc::UnboundedSender<SessionMessage>,
    rx: mpsc::UnboundedReceiver<SessionMessage>,
}

impl<R: Renderer> SessionController<R> {
    pub fn new(transport: Arc<dyn Transport>, renderer: R, timeouts: SessionTimeouts) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            renderer,
            current: None,
            timeouts,
            tx,
            rx,
        }
    }

    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub const fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.current.as_ref().map_or(SessionStatus::Idle, Session::status)
    }

    pub fn is_generating(&self) -> bool {
        self.status().is_live()
    }

    pub fn accumulated_text(&self) -> &str {
        self.current.as_ref().map_or("", Session::accumulated_text)
    }

    /// Start a new session, superseding any live one.
    ///
    /// Returns `None` without touching the network when the topic is blank.
    /// Must be called from within a tokio runtime.
    pub fn start_generation(
        &mut self,
        topic: &str,
        post_type: PostType,
        cringe_level: CringeLevel,
    ) -> Option<SessionId> {
        if topic.trim().is_empty() {
            tracing::debug!("rejecting generation with empty topic");
            self.renderer.input_invalid();
            return None;
        }

        self.cancel_current();

        let request = GenerateRequest::new(topic, post_type, cringe_level);
        let id = SessionId::new();
        let cancel = CancellationToken::new();

        tracing::info!(
            session = %id,
            post_type = ?request.post_type,
            cringe_level = request.cringe_level.get(),
            "starting generation"
        );

        let task = tokio::spawn(drive_session(
            Arc::clone(&self.transport),
            request.clone(),
            id,
            cancel.clone(),
            self.timeouts,
            self.tx.clone(),
        ));

        self.current = Some(Session {
            id,
            request,
            accumulated_text: String::new(),
            status: SessionStatus::Generating,
            cancel,
            task: Some(task),
        });
        self.renderer.clear();

        Some(id)
    }

    /// Cancel the live session, if any. Returns whether something was cancelled.
    pub fn cancel_current(&mut self) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };
        if session.status.is_terminal() {
            return false;
        }

        session.abort();
        session.transition(SessionStatus::Cancelled);
        true
    }

    /// Apply one update from a session task.
    ///
    /// Updates from any session other than the live one are dropped.
    pub fn handle(&mut self, message: SessionMessage) {
        let Some(session) = self
            .current
            .as_mut()
            .filter(|s| s.id == message.session && s.status.is_live())
        else {
            tracing::trace!(session = %message.session, "dropping update from stale session");
            return;
        };

        match message.update {
            SessionUpdate::Event(Event::Text { content }) => {
                if session.status == SessionStatus::Generating {
                    session.transition(SessionStatus::Streaming);
                }
                session.accumulated_text.push_str(&content);
                self.renderer
                    .render_text(&session.accumulated_text, RenderMode::Streaming);
            }
            SessionUpdate::Event(Event::Done) => {
                session.transition(SessionStatus::Complete);
                session.task = None;
                self.renderer
                    .render_text(&session.accumulated_text, RenderMode::Final);
                self.renderer.show_extras();
            }
            SessionUpdate::Event(Event::Error { content }) => {
                session.transition(SessionStatus::Errored);
                session.abort();
                self.renderer.render_error(&content);
            }
            SessionUpdate::TransportFailed(message) => {
                tracing::warn!(session = %session.id, %message, "transport failure");
                session.transition(SessionStatus::Errored);
                session.task = None;
                self.renderer.render_error(&message);
            }
            SessionUpdate::StreamClosed => {
                tracing::warn!(session = %session.id, "stream closed without a terminal event");
                session.transition(SessionStatus::Errored);
                session.task = None;
                self.renderer.render_error(STREAM_CLOSED_MESSAGE);
            }
            SessionUpdate::TimedOut => {
                tracing::warn!(session = %session.id, "stream idle timeout");
                session.transition(SessionStatus::Errored);
                session.abort();
                self.renderer.render_error(TIMED_OUT_MESSAGE);
            }
        }
    }

    /// Handle every queued update without waiting. Returns how many were processed.
    pub fn poll_updates(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Wait for the next update and handle it.
    #[allow(dead_code)]
    pub async fn pump(&mut self) -> bool {
        match self.rx.recv().await {
            Some(message) => {
                self.handle(message);
                true
            }
            None => false,
        }
    }
}

impl<R: Renderer> Drop for SessionController<R> {
    fn drop(&mut self) {
        if let Some(session) = self.current.as_mut() {
            session.abort();
        }
    }
}

// Background half of a session: open the request, forward decoded events
// until a terminal one, and stop as soon as the token is cancelled.
async fn drive_session(
    transport: Arc<dyn Transport>,
    request: GenerateRequest,
    id: SessionId,
    cancel: CancellationToken,
    timeouts: SessionTimeouts,
    tx: mpsc::UnboundedSender<SessionMessage>,
) {
    let send = |update: SessionUpdate| {
        if cancel.is_cancelled() {
            return false;
        }
        tx.send(SessionMessage {
            session: id,
            update,
        })
        .is_ok()
    };

    let opened = tokio::select! {
        () = cancel.cancelled() => return,
        opened = tokio::time::timeout(timeouts.open, transport.open(request)) => opened,
    };

    let mut stream = match opened {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            send(SessionUpdate::TransportFailed(e.to_string()));
            return;
        }
        Err(_) => {
            send(SessionUpdate::TimedOut);
            return;
        }
    };

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return,
            next = tokio::time::timeout(timeouts.idle, stream.next()) => next,
        };

        let update = match next {
            Err(_) => SessionUpdate::TimedOut,
            Ok(None) => SessionUpdate::StreamClosed,
            Ok(Some(Err(e))) => SessionUpdate::TransportFailed(e.to_string()),
            Ok(Some(Ok(event))) => {
                let terminal = event.is_terminal();
                if !send(SessionUpdate::Event(event)) || terminal {
                    return;
                }
                continue;
            }
        };
        send(update);
        return;
    }
}
