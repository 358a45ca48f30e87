//! Backend constants
//!
//! Header names (lowercase, as `http` expects them), fixed header values and
//! the default timing of the session lifecycle.

/// Header carrying the REST token.
pub const AUTH_TOKEN_HEADER: &str = "z-auth-token";
/// Developer API key header expected by the REST backend.
pub const DEV_APIKEY_HEADER: &str = "z-dev-apikey";
pub const DEV_APIKEY: &str = "Tg1NWEwNGIgIC0K";
pub const IF_NONE_MATCH_HEADER: &str = "z-if-none-match";
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";
pub const REQUESTED_WITH: &str = "XMLHttpRequest";

/// Suffix appended to the app identifier in the REST user agent.
pub const REST_AGENT_SUFFIX: &str = "iOS/15.4";
/// User agent of the social messaging backend.
pub const OAS_USER_AGENT: &str = "OAS User Agent";
/// Browser user agent used by the legacy web backend.
pub const WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/102.0.5005.63 Safari/537.36 Edg/102.0.1245.33";

/// Default session-cache file name.
pub const DEFAULT_CACHE_FILE: &str = "cvv.json";

/// Renew this many seconds before the token expires.
pub const DEFAULT_RENEWAL_LEAD_SECS: u64 = 600;
/// Renewal period when the backend gave no usable expiry (90 minutes).
pub const DEFAULT_RENEWAL_FALLBACK_SECS: u64 = 5400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
