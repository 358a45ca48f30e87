//! Runtime building blocks shared by the Classeviva clients.
//!
//! - [`session`]: snapshot cache and renewal timer
//! - [`observability`]: debug logging and subscriber setup
//! - [`testing`]: in-memory mocks and fixtures (`test-utils` feature)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod observability;
pub mod session;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use observability::{init_tracing, DebugLog, LogFormat};
pub use session::{
    renewal_delay, CacheError, CachedSnapshot, FileSessionCache, RenewalTimer, SessionCache,
};
