//! Authenticated session state
//!
//! A [`Session`] is either empty (not authorized, no token, empty user) or
//! established through [`Session::establish`]. There is no way to flip the
//! authorized flag without going through one of those two paths.

use chrono::{DateTime, Utc};

use super::user::UserProfile;
use crate::errors::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authorized: bool,
    token: String,
    expiration: Option<DateTime<Utc>>,
    user: UserProfile,
}

impl Session {
    /// Empty, unauthorized session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an authorized session.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the token is empty or the expiration
    /// is not in the future.
    pub fn establish(
        token: impl Into<String>,
        expiration: Option<DateTime<Utc>>,
        user: UserProfile,
    ) -> ApiResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(ApiError::precondition("Login failed (no token)"));
        }
        if let Some(expires_at) = expiration {
            if expires_at <= Utc::now() {
                return Err(ApiError::precondition("Login failed (token already expired)"));
            }
        }

        Ok(Self { authorized: true, token, expiration, user })
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Credential material (header value or cookie), empty when logged out.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Mutable access for endpoints that enrich the profile.
    pub fn user_mut(&mut self) -> &mut UserProfile {
        &mut self.user
    }

    /// Seconds left before the credential lapses, `None` for cookie sessions.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expiration.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Reset every field to its empty form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
