//! Token-authenticated REST client
//!
//! [`RestClient`] logs in with `auth/login`, caches the response and keeps the
//! token alive. The endpoint catalog lives in [`endpoints`].

pub mod auth;
pub mod endpoints;

pub use auth::{LoginResponse, RestClient, TokenAuth};
pub use endpoints::{AgendaFilter, Card, LessonsRange, ReadNoticeOptions};
