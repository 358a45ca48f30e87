//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory [`SessionCache`](crate::session::SessionCache)
//! - **[`fixtures`]**: login responses and snapshots with relative expiries
//!
//! Enabled for downstream crates through the `test-utils` feature.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{login_payload, snapshot_expiring_in, FIXTURE_IDENT, FIXTURE_TOKEN};
pub use mocks::MemorySessionCache;
