//! # Classeviva clients
//!
//! Session clients for the three Classeviva backends.
//!
//! This crate contains:
//! - [`RestClient`]: token authentication, session cache and keep-alive
//! - [`TibidaboClient`]: two-step cookie login to the messaging backend
//! - [`WebClient`]: cookie login to the legacy web portal
//! - the HTTP transport and the configuration loader they share
//!
//! ## Architecture
//! - Pure types and errors live in `classeviva-domain`
//! - Session cache, renewal timer and logging live in `classeviva-common`
//! - Everything that talks to the network lives here
//!
//! ```no_run
//! use classeviva_infra::{ClientOptions, RestClient};
//!
//! # async fn run() -> Result<(), classeviva_infra::ApiError> {
//! let client = RestClient::new(ClientOptions::new("S1234567", "secret"))?;
//! let user = client.login().await?;
//! println!("hello {}", user.display_name());
//! let grades = client.get_grades().await?;
//! # let _ = grades;
//! client.logout();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod http;
pub mod rest;
pub mod tibidabo;
pub mod web;

// Re-export commonly used items
pub use classeviva_domain::{
    ApiError, ApiErrorCategory, ApiResult, App, AppIdentity, Authorization, ClientOptions,
    Logging, RenewalConfig, School, State, UserProfile, UserType,
};
pub use client::{FetchRequest, RawResponse, SessionClient, SessionStrategy};
pub use rest::{AgendaFilter, Card, LessonsRange, ReadNoticeOptions, RestClient, TokenAuth};
pub use tibidabo::{is_email, CookieAuth, TibidaboClient};
pub use web::{ExportFormat, LegacyCookieAuth, Product, WebClient};
