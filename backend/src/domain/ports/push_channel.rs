//! Port for real-time pushes to connected users.
//!
//! Delivery is fire-and-forget: a user without a live connection simply
//! misses the event. Nothing is queued or replayed.

use serde::Serialize;
use serde_json::Value;

use crate::domain::UserId;

/// One real-time event frame, serialised as `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    /// Event name clients subscribe to.
    pub event: String,
    /// Event body.
    pub payload: Value,
}

impl PushMessage {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Routes pushes to the user's active connection.
#[cfg_attr(test, mockall::automock)]
pub trait PushChannel: Send + Sync {
    /// Queue `message` on the user's connection. Returns `false` when the user
    /// is offline and the message was dropped.
    fn push(&self, user_id: &UserId, message: PushMessage) -> bool;
}

/// Fixture channel where every user is offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePushChannel;

impl PushChannel for FixturePushChannel {
    fn push(&self, _user_id: &UserId, _message: PushMessage) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_serialise_event_and_payload() {
        let frame = PushMessage::new("userOnline", json!({ "userId": "u1" }));
        let value = serde_json::to_value(&frame).expect("serialise");
        assert_eq!(value, json!({ "event": "userOnline", "payload": { "userId": "u1" } }));
    }
}
