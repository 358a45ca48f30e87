//! Cookie-authenticated client of the social messaging backend

pub mod auth;
pub mod endpoints;

pub use auth::{is_email, CookieAuth, SamAccount, SamAuth, TibidaboClient};
pub use endpoints::DEFAULT_PAGE_SIZE;
