//! Login response fixtures shaped like the REST backend's.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::{json, Value};

use crate::session::CachedSnapshot;

/// Identifier used by the fixtures; its numeric id is `123`.
pub const FIXTURE_IDENT: &str = "AB123XY";
pub const FIXTURE_TOKEN: &str = "abc";

/// Expiry `offset` from now, rendered with the backend's +01:00 offset.
pub fn expire_in(offset: Duration) -> String {
    let expires_at: DateTime<Utc> = Utc::now() + offset;
    match FixedOffset::east_opt(3600) {
        Some(cet) => expires_at.with_timezone(&cet).to_rfc3339(),
        None => expires_at.to_rfc3339(),
    }
}

/// A REST login response that expires `offset` from now.
pub fn login_payload(offset: Duration) -> Value {
    json!({
        "ident": FIXTURE_IDENT,
        "firstName": "A",
        "lastName": "B",
        "showPwdChangeReminder": false,
        "token": FIXTURE_TOKEN,
        "release": expire_in(Duration::zero()),
        "expire": expire_in(offset),
    })
}

/// Snapshot of [`login_payload`].
///
/// # Panics
///
/// Never in practice; the payload always carries a valid `expire`.
pub fn snapshot_expiring_in(offset: Duration) -> CachedSnapshot {
    #[allow(clippy::expect_used)]
    CachedSnapshot::from_response(&login_payload(offset)).expect("fixture has an expire field")
}
