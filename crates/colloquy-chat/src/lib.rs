//! Conversational core for Colloquy.
//!
//! Reconciles a generation backend's frame stream (cumulative snapshots,
//! deltas, or a mix) into a consistent transcript, driving each outgoing
//! turn through a small lifecycle with single-flight send semantics.

pub mod backend;
pub mod error;
pub mod reconciler;
pub mod session;

pub use backend::{EchoBackend, GenerationBackend, ScriptedBackend};
pub use error::ChatError;
pub use reconciler::StreamReconciler;
pub use session::{ChatSession, TurnPhase};
