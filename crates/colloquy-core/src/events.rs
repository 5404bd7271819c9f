use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Timestamp;

/// Notifications emitted by a conversation session as a turn progresses.
///
/// Events are published on a broadcast channel and consumed by:
/// - Observer layers rendering the transcript (per-message updates by id)
/// - The event log (for audit/debugging)
///
/// Observers diff by `message_id`, never by transcript position.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    /// A turn was accepted: the user message and the empty assistant
    /// placeholder have both been appended to the transcript.
    TurnStarted {
        session_id: Uuid,
        user_message_id: Uuid,
        assistant_message_id: Uuid,
        timestamp: Timestamp,
    },

    /// The assistant placeholder's content changed during streaming.
    /// `content` carries the full reconciled text, not the increment.
    MessageUpdated {
        session_id: Uuid,
        message_id: Uuid,
        content: String,
        timestamp: Timestamp,
    },

    /// The stream ended; the assistant message holds its final content.
    /// Also emitted when a turn is cancelled with partial content kept.
    TurnCompleted {
        session_id: Uuid,
        message_id: Uuid,
        timestamp: Timestamp,
    },

    /// The stream failed; the assistant message content was replaced with
    /// the fallback text. Prior history is untouched.
    TurnFailed {
        session_id: Uuid,
        message_id: Uuid,
        reason: String,
        timestamp: Timestamp,
    },
}

impl SessionEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            SessionEvent::TurnStarted { timestamp, .. }
            | SessionEvent::MessageUpdated { timestamp, .. }
            | SessionEvent::TurnCompleted { timestamp, .. }
            | SessionEvent::TurnFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::TurnStarted { .. } => "turn_started",
            SessionEvent::MessageUpdated { .. } => "message_updated",
            SessionEvent::TurnCompleted { .. } => "turn_completed",
            SessionEvent::TurnFailed { .. } => "turn_failed",
        }
    }

    /// The id of the message this event concerns, if any.
    pub fn message_id(&self) -> Option<Uuid> {
        match self {
            SessionEvent::TurnStarted {
                assistant_message_id,
                ..
            } => Some(*assistant_message_id),
            SessionEvent::MessageUpdated { message_id, .. }
            | SessionEvent::TurnCompleted { message_id, .. }
            | SessionEvent::TurnFailed { message_id, .. } => Some(*message_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_timestamp() {
        let ts = Timestamp::now();
        let event = SessionEvent::TurnStarted {
            session_id: Uuid::new_v4(),
            user_message_id: Uuid::new_v4(),
            assistant_message_id: Uuid::new_v4(),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_names() {
        let ts = Timestamp::now();
        let sid = Uuid::new_v4();
        let mid = Uuid::new_v4();

        let events = vec![
            SessionEvent::TurnStarted {
                session_id: sid,
                user_message_id: Uuid::new_v4(),
                assistant_message_id: mid,
                timestamp: ts,
            },
            SessionEvent::MessageUpdated {
                session_id: sid,
                message_id: mid,
                content: "partial".to_string(),
                timestamp: ts,
            },
            SessionEvent::TurnCompleted {
                session_id: sid,
                message_id: mid,
                timestamp: ts,
            },
            SessionEvent::TurnFailed {
                session_id: sid,
                message_id: mid,
                reason: "backend gone".to_string(),
                timestamp: ts,
            },
        ];

        let names: Vec<&str> = events.iter().map(|e| e.event_name()).collect();
        assert_eq!(
            names,
            vec![
                "turn_started",
                "message_updated",
                "turn_completed",
                "turn_failed"
            ]
        );
        for event in &events {
            assert_eq!(event.message_id(), Some(mid));
        }
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = SessionEvent::MessageUpdated {
            session_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            content: "Hello from test".to_string(),
            timestamp: Timestamp::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();

        if let SessionEvent::MessageUpdated { content, .. } = &back {
            assert_eq!(content, "Hello from test");
        } else {
            panic!("Expected MessageUpdated variant after deserialization");
        }
        assert_eq!(event.timestamp(), back.timestamp());
    }
}
