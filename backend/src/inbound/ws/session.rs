//! Per-connection WebSocket handler.
//!
//! Keeps framing and heartbeats at the edge. The session forwards queued
//! push frames from the registry, answers presence queries and announces the
//! user's arrival and departure to everyone else. The server pings every 5s
//! and drops a connection after 10s without client traffic; tests shorten
//! both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::UserId;
use crate::inbound::ws::messages::{ClientMessage, presence};
use crate::outbound::push::{PushRegistry, Registration};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(200);

pub(super) async fn handle_ws_session(
    registry: Arc<PushRegistry>,
    user: UserId,
    session: Session,
    stream: MessageStream,
) {
    let registration = registry.register(user);
    info!(user_id = %user, replaced = registration.replaced, "push connection opened");
    registry.broadcast_except(&user, &presence(user, true));

    let connection = registration.id;
    WsSession {
        registry: Arc::clone(&registry),
        user,
    }
    .run(session, stream, registration)
    .await;

    if registry.unregister(user, connection) {
        registry.broadcast_except(&user, &presence(user, false));
        info!(user_id = %user, "push connection closed");
    }
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    Replaced,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

struct WsSession {
    registry: Arc<PushRegistry>,
    user: UserId,
}

impl WsSession {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        registration: Registration,
    ) {
        let Registration { mut outbound, .. } = registration;
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                frame = outbound.recv() => match frame {
                    Some(frame) => session.text(frame).await.map_err(SessionError::Network),
                    None => Err(SessionError::Replaced),
                },
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
            };

            if let Err(error) = result {
                self.log_shutdown_reason(&error);
                if let Some(reason) = close_reason_for(error) {
                    if let Err(err) = session.close(reason).await {
                        debug!(error = %err, "WebSocket already closed");
                    }
                }
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };
        let message = message.map_err(SessionError::Protocol)?;
        *last_heartbeat = Instant::now();

        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => self.handle_text_message(session, text.as_ref()).await,
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    async fn handle_text_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionError> {
        let request = serde_json::from_str::<ClientMessage>(text).map_err(|error| {
            warn!(user_id = %self.user, error = %error, "rejected malformed WebSocket payload");
            SessionError::InvalidPayload
        })?;

        match request {
            ClientMessage::CheckOnlineStatus { user_id } => {
                let frame = presence(user_id, self.registry.is_online(&user_id));
                match serde_json::to_string(&frame) {
                    Ok(body) => session.text(body).await.map_err(SessionError::Network),
                    Err(error) => {
                        warn!(error = %error, "presence frame failed to serialise");
                        Ok(())
                    }
                }
            }
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!(user_id = %self.user, "WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(user_id = %self.user, error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(
                    user_id = %self.user,
                    error = %error,
                    "WebSocket send failed; closing connection"
                );
            }
            SessionError::Replaced => {
                debug!(user_id = %self.user, "connection superseded by a newer one");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    let reason = |code, description: &str| {
        Some(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
        SessionError::Replaced => reason(CloseCode::Policy, "replaced by a newer connection"),
        SessionError::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
        SessionError::InvalidPayload => reason(CloseCode::Policy, "invalid payload"),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
