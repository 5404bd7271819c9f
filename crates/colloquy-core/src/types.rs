use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// The author of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A message typed by the user.
    User,
    /// A reply produced by the generation backend.
    Assistant,
    /// An instruction injected by the application.
    System,
}

/// One element of a generation backend's reply stream.
///
/// The relationship of a `Frame`'s text to previous frames is not guaranteed:
/// a frame may be a cumulative snapshot of the whole reply so far, or only
/// the newly added fragment, and a single stream may mix both. The stream
/// terminates with exactly one `Done` or `Error`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A unit of reply text (cumulative snapshot or delta).
    Frame(String),
    /// The stream ended normally.
    Done,
    /// The stream failed; no further frames will follow.
    Error(String),
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }
}

// =============================================================================
// Messages
// =============================================================================

/// A single transcript entry.
///
/// Identity (`id`) never changes after creation. `content` is the only
/// mutable field: the owning session rewrites it in place while a reply
/// streams in. Messages are never removed from a live session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: Timestamp,
}

impl Message {
    /// Create a user message carrying the given text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Create an empty assistant placeholder to be filled by streaming.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: String::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::System,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// An insertion-ordered sequence of messages.
///
/// Order is chronological send order and is load-bearing: rendering and the
/// "last message" fallback used on stream failure both depend on it. The
/// transcript is append-only; content mutation goes through `get_mut`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, returning its id.
    pub fn push(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Look up a message by its stable id.
    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Look up a message by its stable id for mutation.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// The most recently appended message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recently appended message for mutation, if any.
    pub fn last_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// All messages, in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
