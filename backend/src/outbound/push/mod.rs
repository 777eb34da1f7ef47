//! In-process push delivery over live WebSocket connections.

mod registry;

pub use registry::{ConnectionId, PushRegistry, Registration};
