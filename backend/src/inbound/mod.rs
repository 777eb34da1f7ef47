//! Inbound adapters that translate external requests into domain port calls
//! while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the real-time presence and push
//! channel lives under [`ws`] and shares the bearer-token verifier.

pub mod http;
pub mod ws;
