//! # Classeviva Domain
//!
//! Domain types shared by the Classeviva session clients.
//!
//! This crate contains:
//! - The [`ApiError`] every client operation fails with
//! - Capability contracts (logging, app identity, authorization)
//! - Session, user profile and portal enumerations
//! - Client construction options
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - No I/O

pub mod capabilities;
pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use capabilities::{AppIdentity, Authorization, LogSink, Logging};
pub use config::{ClientOptions, RenewalConfig};
pub use errors::*;
pub use types::*;
