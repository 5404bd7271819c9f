//! Shared domain types for the Colloquy assistant core.
//!
//! Defines the message/transcript model mutated by streaming turns, the
//! tagged stream events produced by generation backends, the session event
//! notifications consumed by observers, and cross-cutting configuration and
//! error types.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{ChatConfig, ColloquyConfig, ExtractionConfig, GeneralConfig};
pub use error::{ColloquyError, Result};
pub use events::SessionEvent;
pub use types::{Message, Role, StreamEvent, Timestamp, Transcript};
