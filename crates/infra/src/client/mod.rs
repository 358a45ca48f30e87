//! Generic session client
//!
//! - [`base`]: [`SessionClient`], lifecycle and request primitives
//! - [`strategy`]: the per-backend [`SessionStrategy`] contract
//! - [`fetch`]: request descriptions and response helpers
//! - [`cookies`]: `Set-Cookie` extraction

pub mod base;
pub mod cookies;
pub mod fetch;
pub mod strategy;

pub use base::SessionClient;
pub use fetch::{FetchRequest, RawResponse, RequestBody};
pub use strategy::{Handshake, SessionStrategy};
