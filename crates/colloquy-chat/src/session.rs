//! Conversation session: one transcript, at most one turn in flight.
//!
//! A turn moves through a small lifecycle:
//! - Idle -> Sending (send accepted, user message + placeholder appended)
//! - Sending -> Streaming (backend stream opened)
//! - Streaming -> Completed (stream ended; content left as reconciled)
//! - Streaming -> Failed (stream error; content replaced with fallback)
//! - Sending -> Failed (stream could not be opened)
//!
//! Completed and Failed accept the next send. All transcript mutation is
//! serialized through the session's single mutex-guarded inner; observers
//! read snapshots and subscribe to [`SessionEvent`] notifications.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use colloquy_core::{
    ChatConfig, Message, Role, SessionEvent, StreamEvent, Timestamp, Transcript,
};

use crate::backend::GenerationBackend;
use crate::error::ChatError;
use crate::reconciler::StreamReconciler;

/// Lifecycle phase of the current (or most recent) turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// No turn has run yet. Ready to send.
    Idle,
    /// Send accepted; the backend stream is being opened.
    Sending,
    /// Frames are being consumed and reconciled.
    Streaming,
    /// The last turn ended normally.
    Completed,
    /// The last turn failed; the fallback message is shown.
    Failed,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "Idle"),
            TurnPhase::Sending => write!(f, "Sending"),
            TurnPhase::Streaming => write!(f, "Streaming"),
            TurnPhase::Completed => write!(f, "Completed"),
            TurnPhase::Failed => write!(f, "Failed"),
        }
    }
}

impl TurnPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &TurnPhase) -> bool {
        matches!(
            (self, target),
            (TurnPhase::Idle, TurnPhase::Sending)
                | (TurnPhase::Completed, TurnPhase::Sending)
                | (TurnPhase::Failed, TurnPhase::Sending)
                | (TurnPhase::Sending, TurnPhase::Streaming)
                | (TurnPhase::Sending, TurnPhase::Failed)
                | (TurnPhase::Streaming, TurnPhase::Completed)
                | (TurnPhase::Streaming, TurnPhase::Failed)
        )
    }

    /// Whether a turn is in flight in this phase.
    pub fn is_responding(&self) -> bool {
        matches!(self, TurnPhase::Sending | TurnPhase::Streaming)
    }
}

/// Transcript and phase, mutated only under the session mutex.
#[derive(Debug)]
struct SessionInner {
    transcript: Transcript,
    phase: TurnPhase,
}

impl SessionInner {
    fn advance(&mut self, target: TurnPhase) -> Result<(), ChatError> {
        if self.phase.can_transition_to(&target) {
            tracing::debug!("Turn phase: {} -> {}", self.phase, target);
            self.phase = target;
            Ok(())
        } else {
            Err(ChatError::InvalidTransition {
                from: self.phase,
                to: target,
            })
        }
    }
}

/// A conversation session owning an append-only transcript.
///
/// `send` drives one turn at a time through the backend; a second send while
/// a turn is in flight is rejected with [`ChatError::Busy`] and leaves the
/// transcript untouched. Observers subscribe to state-change events and read
/// transcript snapshots; they never mutate.
pub struct ChatSession<B: GenerationBackend> {
    id: Uuid,
    backend: B,
    config: ChatConfig,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
}

impl<B: GenerationBackend> ChatSession<B> {
    /// Create a session with the given backend and configuration.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            id: Uuid::new_v4(),
            backend,
            config,
            inner: Mutex::new(SessionInner {
                transcript: Transcript::new(),
                phase: TurnPhase::Idle,
            }),
            events,
        }
    }

    /// The session's stable identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to session events. Slow receivers lag; they never block
    /// the session.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// A snapshot of the transcript in insertion order.
    pub fn transcript(&self) -> Transcript {
        self.lock().transcript.clone()
    }

    /// Whether a turn is currently in flight.
    pub fn is_responding(&self) -> bool {
        self.lock().phase.is_responding()
    }

    /// The lifecycle phase of the current or most recent turn.
    pub fn phase(&self) -> TurnPhase {
        self.lock().phase
    }

    /// Send a user message and stream the reply to completion.
    ///
    /// Returns the assistant message's id once the turn completes. Rejects
    /// synchronously with [`ChatError::Busy`] while a turn is in flight and
    /// with [`ChatError::EmptyMessage`] for whitespace-only input.
    pub async fn send(&self, text: &str) -> Result<Uuid, ChatError> {
        self.send_with_cancellation(text, &CancellationToken::new())
            .await
    }

    /// Like [`ChatSession::send`], honoring a cancellation token at every
    /// suspension point.
    ///
    /// Cancellation stops frame consumption, keeps whatever content was
    /// already reconciled, and returns [`ChatError::Cancelled`].
    pub async fn send_with_cancellation(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Uuid, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let (user_id, assistant_id) = self.begin_turn(text)?;
        self.emit(SessionEvent::TurnStarted {
            session_id: self.id,
            user_message_id: user_id,
            assistant_message_id: assistant_id,
            timestamp: Timestamp::now(),
        });

        if self.config.turn_timeout_secs == 0 {
            return self.run_turn(text, assistant_id, cancel).await;
        }
        let deadline = Duration::from_secs(self.config.turn_timeout_secs);
        match tokio::time::timeout(deadline, self.run_turn(text, assistant_id, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.fail_turn(assistant_id, "turn deadline exceeded");
                Err(ChatError::TimedOut(self.config.turn_timeout_secs))
            }
        }
    }

    // -- Private helpers --

    /// Accept the turn: single-flight check and transcript append, under one
    /// lock acquisition so concurrent senders cannot interleave.
    fn begin_turn(&self, text: &str) -> Result<(Uuid, Uuid), ChatError> {
        let mut inner = self.lock();
        if inner.phase.is_responding() {
            return Err(ChatError::Busy);
        }
        inner.advance(TurnPhase::Sending)?;
        let user_id = inner.transcript.push(Message::user(text));
        let assistant_id = inner.transcript.push(Message::assistant_placeholder());
        Ok((user_id, assistant_id))
    }

    async fn run_turn(
        &self,
        prompt: &str,
        assistant_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Uuid, ChatError> {
        let mut frames = match self.backend.open_stream(prompt).await {
            Ok(rx) => rx,
            Err(e) => {
                self.fail_turn(assistant_id, &e.to_string());
                return Err(ChatError::StreamFailed(e.to_string()));
            }
        };
        {
            let mut inner = self.lock();
            inner.advance(TurnPhase::Streaming)?;
        }

        let mut reconciler = StreamReconciler::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(session = %self.id, "Turn cancelled; keeping partial reply");
                    self.complete_turn(assistant_id);
                    return Err(ChatError::Cancelled);
                }
                event = frames.recv() => match event {
                    Some(StreamEvent::Frame(frame)) => {
                        let increment = reconciler.push(&frame);
                        if !increment.is_empty() {
                            self.update_assistant(assistant_id, reconciler.display());
                        }
                    }
                    Some(StreamEvent::Error(reason)) => {
                        self.fail_turn(assistant_id, &reason);
                        return Err(ChatError::StreamFailed(reason));
                    }
                    Some(StreamEvent::Done) | None => {
                        self.complete_turn(assistant_id);
                        return Ok(assistant_id);
                    }
                }
            }
        }
    }

    /// Replace the placeholder's content with the reconciled display text.
    fn update_assistant(&self, assistant_id: Uuid, content: &str) {
        {
            let mut inner = self.lock();
            if let Some(message) = inner.transcript.get_mut(assistant_id) {
                message.content = content.to_string();
            }
        }
        self.emit(SessionEvent::MessageUpdated {
            session_id: self.id,
            message_id: assistant_id,
            content: content.to_string(),
            timestamp: Timestamp::now(),
        });
    }

    /// End the turn normally, leaving the content exactly as last reconciled.
    fn complete_turn(&self, assistant_id: Uuid) {
        {
            let mut inner = self.lock();
            if let Err(e) = inner.advance(TurnPhase::Completed) {
                tracing::debug!(error = %e, "Completion after terminal phase ignored");
            }
        }
        self.emit(SessionEvent::TurnCompleted {
            session_id: self.id,
            message_id: assistant_id,
            timestamp: Timestamp::now(),
        });
    }

    /// End the turn in failure: the assistant message (located by id, or the
    /// last message if it is an assistant message) is replaced wholesale with
    /// the fallback text. Prior history is untouched.
    fn fail_turn(&self, assistant_id: Uuid, reason: &str) {
        let fallback = self.config.fallback_message.clone();
        let message_id = {
            let mut inner = self.lock();
            if let Err(e) = inner.advance(TurnPhase::Failed) {
                tracing::debug!(error = %e, "Failure after terminal phase ignored");
            }
            if let Some(message) = inner.transcript.get_mut(assistant_id) {
                message.content = fallback;
                Some(assistant_id)
            } else {
                match inner.transcript.last_mut() {
                    Some(last) if last.role == Role::Assistant => {
                        last.content = fallback;
                        Some(last.id)
                    }
                    _ => None,
                }
            }
        };
        tracing::warn!(session = %self.id, error = reason, "Turn failed; fallback message shown");
        if let Some(message_id) = message_id {
            self.emit(SessionEvent::TurnFailed {
                session_id: self.id,
                message_id,
                reason: reason.to_string(),
                timestamp: Timestamp::now(),
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine; events are best-effort notifications.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================
