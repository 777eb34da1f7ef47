//! Request middleware: trace id propagation.

pub mod trace;

pub use trace::Trace;
