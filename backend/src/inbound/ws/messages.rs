//! Wire-level message definitions for the WebSocket adapter.
//!
//! Server frames reuse the push frame shape `{"event", "payload"}`. Client
//! frames are tagged by `type`.

use serde::Deserialize;
use serde_json::json;

use crate::domain::UserId;
use crate::domain::ports::PushMessage;

/// Presence event sent when a user connects.
pub const USER_ONLINE_EVENT: &str = "userOnline";
/// Presence event sent when a user disconnects.
pub const USER_OFFLINE_EVENT: &str = "userOffline";

/// Frames a client may send.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask whether another user is connected.
    CheckOnlineStatus {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
}

/// Presence frame for `user`.
pub fn presence(user: UserId, online: bool) -> PushMessage {
    let event = if online {
        USER_ONLINE_EVENT
    } else {
        USER_OFFLINE_EVENT
    };
    PushMessage::new(event, json!({ "userId": user }))
}
