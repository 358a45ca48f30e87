//! Session lifecycle building blocks
//!
//! - [`cache`]: durable snapshot of the last login response
//! - [`renewal`]: one-shot keep-alive timer and its delay policy

pub mod cache;
pub mod renewal;

pub use cache::{CacheError, CachedSnapshot, FileSessionCache, SessionCache};
pub use renewal::{renewal_delay, RenewalTimer};
