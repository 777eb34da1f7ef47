//! Registry of live user connections.
//!
//! Each user holds at most one connection. Registering again replaces the
//! previous entry; dropping its sender ends the old session's outbound
//! stream so that session closes itself. Removal is keyed by connection id,
//! so a replaced session cleaning up late never evicts its successor.
//!
//! Each connection queues at most [`OUTBOUND_CAPACITY`] frames. A push to a
//! full queue is dropped and reported as undelivered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::domain::ports::{PushChannel, PushMessage};

/// Frames buffered per connection before further pushes are dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Identifier of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct Connection {
    id: ConnectionId,
    sender: mpsc::Sender<String>,
}

/// Handle returned to the session that registered.
pub struct Registration {
    pub id: ConnectionId,
    /// Serialised frames queued for this connection.
    pub outbound: mpsc::Receiver<String>,
    /// Whether an older connection for the same user was displaced.
    pub replaced: bool,
}

/// Concurrency-safe map from user to live connection.
#[derive(Default)]
pub struct PushRegistry {
    next_id: AtomicU64,
    connections: Mutex<HashMap<UserId, Connection>>,
}

impl PushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection for `user`, replacing any existing one.
    pub fn register(&self, user: UserId) -> Registration {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, outbound) = mpsc::channel(OUTBOUND_CAPACITY);
        let previous = self.lock().insert(user, Connection { id, sender });
        if previous.is_some() {
            debug!(user_id = %user, "replaced existing push connection");
        }
        Registration {
            id,
            outbound,
            replaced: previous.is_some(),
        }
    }

    /// Remove `user`'s entry if it still belongs to connection `id`.
    /// Returns whether an entry was removed.
    pub fn unregister(&self, user: UserId, id: ConnectionId) -> bool {
        let mut connections = self.lock();
        match connections.get(&user) {
            Some(current) if current.id == id => {
                connections.remove(&user);
                true
            }
            _ => false,
        }
    }

    pub fn is_online(&self, user: &UserId) -> bool {
        self.lock().contains_key(user)
    }

    /// Queue `message` for every connected user except `origin`.
    pub fn broadcast_except(&self, origin: &UserId, message: &PushMessage) {
        let Some(frame) = encode(message) else {
            return;
        };
        for (user, connection) in self.lock().iter() {
            if user != origin {
                deliver(user, connection, frame.clone());
            }
        }
    }
}

fn deliver(user: &UserId, connection: &Connection, frame: String) -> bool {
    match connection.sender.try_send(frame) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(user_id = %user, "push queue full; dropping frame");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(user_id = %user, "dropping frame for closing connection");
            false
        }
    }
}

fn encode(message: &PushMessage) -> Option<String> {
    serde_json::to_string(message)
        .inspect_err(|err| {
            warn!(event = %message.event, error = %err, "push frame failed to serialise");
        })
        .ok()
}

impl PushChannel for PushRegistry {
    fn push(&self, user_id: &UserId, message: PushMessage) -> bool {
        let Some(frame) = encode(&message) else {
            return false;
        };
        self.lock()
            .get(user_id)
            .is_some_and(|connection| deliver(user_id, connection, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn frame(event: &str) -> PushMessage {
        PushMessage::new(event, json!({"bookId": "b1"}))
    }

    #[rstest]
    fn push_reaches_registered_user() {
        let registry = PushRegistry::new();
        let user = UserId::random();
        let mut registration = registry.register(user);

        assert!(registry.push(&user, frame("new-meet-request")));
        let raw = registration.outbound.try_recv().expect("queued frame");
        let value: Value = serde_json::from_str(&raw).expect("json frame");
        assert_eq!(value["event"], "new-meet-request");
    }

    #[rstest]
    fn push_to_offline_user_is_dropped() {
        let registry = PushRegistry::new();
        assert!(!registry.push(&UserId::random(), frame("new-meet-request")));
    }

    #[rstest]
    fn new_connection_replaces_old_and_closes_its_stream() {
        let registry = PushRegistry::new();
        let user = UserId::random();
        let mut first = registry.register(user);
        let second = registry.register(user);

        assert!(!first.replaced);
        assert!(second.replaced);
        assert!(matches!(
            first.outbound.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert!(!registry.unregister(user, first.id), "stale cleanup is ignored");
        assert!(registry.is_online(&user));
        assert!(registry.unregister(user, second.id));
        assert!(!registry.is_online(&user));
    }

    #[rstest]
    fn stalled_connection_drops_pushes_beyond_capacity() {
        let registry = PushRegistry::new();
        let user = UserId::random();
        let mut registration = registry.register(user);

        for _ in 0..OUTBOUND_CAPACITY {
            assert!(registry.push(&user, frame("new-meet-request")));
        }
        assert!(!registry.push(&user, frame("new-meet-request")));
        assert!(registry.is_online(&user), "a full queue keeps the connection");

        assert!(registration.outbound.try_recv().is_ok());
        assert!(registry.push(&user, frame("new-meet-request")));
    }

    #[rstest]
    fn broadcast_skips_origin() {
        let registry = PushRegistry::new();
        let alice = UserId::random();
        let bob = UserId::random();
        let mut alice_conn = registry.register(alice);
        let mut bob_conn = registry.register(bob);

        let online = PushMessage::new("userOnline", json!({"userId": alice}));
        registry.broadcast_except(&alice, &online);

        assert!(alice_conn.outbound.try_recv().is_err());
        assert!(bob_conn.outbound.try_recv().is_ok());
    }
}
