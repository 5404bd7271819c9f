//! Generation backend trait and local implementations.
//!
//! A backend turns a prompt into a cancellable stream of [`StreamEvent`]s
//! delivered over an mpsc channel. The stream may terminate normally (`Done`
//! or channel close) or with an `Error` at any point after zero or more
//! frames. Frames carry no shape guarantee; reconciliation is the session's
//! job.

use tokio::sync::mpsc;

use colloquy_core::{ColloquyError, StreamEvent};

/// Buffer size for backend reply channels.
const STREAM_BUFFER: usize = 32;

/// A prompt-in, frame-stream-out generation service.
///
/// Implementations wrap a local language-generation engine behind a uniform
/// async interface. Each call produces an independent single-use stream.
pub trait GenerationBackend: Send + Sync {
    /// Open a reply stream for the given prompt.
    ///
    /// Returns an error if the stream cannot be opened at all; errors after
    /// opening arrive in-band as [`StreamEvent::Error`].
    fn open_stream(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<mpsc::Receiver<StreamEvent>, ColloquyError>> + Send;
}

/// Scripted backend for testing.
///
/// Plays back a fixed sequence of stream events for any prompt, or fails to
/// open. Deterministic; no timing dependence.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Vec<StreamEvent>,
    open_error: Option<String>,
}

impl ScriptedBackend {
    /// A backend that emits the given events and then closes the channel.
    pub fn with_events(script: Vec<StreamEvent>) -> Self {
        Self {
            script,
            open_error: None,
        }
    }

    /// A backend that streams the given frames and terminates with `Done`.
    pub fn with_frames(frames: &[&str]) -> Self {
        let mut script: Vec<StreamEvent> = frames
            .iter()
            .map(|f| StreamEvent::Frame(f.to_string()))
            .collect();
        script.push(StreamEvent::Done);
        Self::with_events(script)
    }

    /// A backend that refuses to open a stream.
    pub fn failing_open(reason: &str) -> Self {
        Self {
            script: Vec::new(),
            open_error: Some(reason.to_string()),
        }
    }
}

impl GenerationBackend for ScriptedBackend {
    async fn open_stream(
        &self,
        _prompt: &str,
    ) -> Result<mpsc::Receiver<StreamEvent>, ColloquyError> {
        if let Some(reason) = &self.open_error {
            return Err(ColloquyError::Generation(reason.clone()));
        }
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let script = self.script.clone();
        tokio::spawn(async move {
            for event in script {
                // Receiver dropped means the turn was cancelled; stop feeding.
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

/// Demo backend that streams the prompt back as growing snapshots.
///
/// Emits one cumulative frame per word with a short pause between frames,
/// exercising the reconciler's snapshot branch end to end.
#[derive(Debug, Clone)]
pub struct EchoBackend {
    frame_delay_ms: u64,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self { frame_delay_ms: 60 }
    }

    /// Override the inter-frame delay (0 for tests).
    pub fn with_frame_delay_ms(frame_delay_ms: u64) -> Self {
        Self { frame_delay_ms }
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationBackend for EchoBackend {
    async fn open_stream(
        &self,
        prompt: &str,
    ) -> Result<mpsc::Receiver<StreamEvent>, ColloquyError> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let reply = format!("You said: {}", prompt);
        let delay = std::time::Duration::from_millis(self.frame_delay_ms);
        tokio::spawn(async move {
            let mut snapshot = String::new();
            for word in reply.split_inclusive(' ') {
                snapshot.push_str(word);
                if tx.send(StreamEvent::Frame(snapshot.clone())).await.is_err() {
                    return;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            let _ = tx.send(StreamEvent::Done).await;
        });
        Ok(rx)
    }
}

// =============================================================================
// Tests
// =============================================================================
