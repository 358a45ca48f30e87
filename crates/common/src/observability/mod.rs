//! Observability primitives
//!
//! - [`logging::DebugLog`]: the per-client diagnostic log
//! - [`logging::init_tracing`]: global subscriber setup for binaries and tests

pub mod logging;

pub use logging::{init_tracing, DebugLog, LogFormat, LOG_TARGET};
