//! Cookie-authenticated client of the legacy web portal

pub mod auth;
pub mod endpoints;

pub use auth::{AccountInfo, LegacyCookieAuth, WebClient};
pub use endpoints::{ExportFormat, Product};
