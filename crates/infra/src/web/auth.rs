//! Legacy cookie authentication against the web portal

use async_trait::async_trait;
use classeviva_domain::constants::WEB_USER_AGENT;
use classeviva_domain::{ApiError, ApiResult, ClientOptions, School, UserProfile, UserType};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::fetch::{error_text, project_path};
use crate::client::{FetchRequest, Handshake, SessionClient, SessionStrategy};

pub(crate) const LOGIN_PATH: &str = "auth-p7/app/default/AuthApi4.php?a=aLoginPwd";

/// Session cookie authentication of the web portal
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCookieAuth;

/// Client of the web portal
pub type WebClient = SessionClient<LegacyCookieAuth>;

/// `data.auth.accountInfo` of the login answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub cognome: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, rename = "type")]
    pub account_type: String,
}

impl AccountInfo {
    fn into_profile(self) -> UserProfile {
        let id = match self.id {
            Value::Number(number) => Some(number.to_string()),
            Value::String(text) if !text.is_empty() => Some(text),
            _ => None,
        };
        let user_type = (!self.account_type.is_empty())
            .then(|| UserType::from_code_or_student(Some(&self.account_type)));
        let school = (!self.cid.is_empty())
            .then(|| School { code: Some(self.cid), ..School::default() });

        UserProfile {
            name: Some(self.nome),
            surname: Some(self.cognome),
            id,
            ident: None,
            user_type,
            school,
        }
    }
}

#[async_trait]
impl SessionStrategy for LegacyCookieAuth {
    const NAME: &'static str = "Web";
    const METHODS: &'static [&'static str] = &[
        "get_agenda",
        "get_portfolio",
        "export_agenda",
        "get_unread_messages",
        "get_username",
        "get_documentation_list",
        "documentation_url",
        "get_avatar",
        "get_maps_api_key",
        "get_rubrica",
        "get_messages",
        "get_bacheca",
        "read_communications",
        "get_document_url",
        "get_account_info",
    ];

    fn customize_headers(_options: &ClientOptions, headers: &mut HeaderMap) {
        headers.insert(USER_AGENT, HeaderValue::from_static(WEB_USER_AGENT));
        headers.remove(ACCEPT);
    }

    async fn handshake(client: &SessionClient<Self>) -> ApiResult<Handshake> {
        let options = client.options();
        let host = client.host();
        let origin = host.trim_end_matches('/').to_string();

        let request = FetchRequest::post(LOGIN_PATH)
            .form([
                ("cid", ""),
                ("uid", options.username.as_str()),
                ("pwd", options.password.as_str()),
                ("pin", ""),
                ("target", ""),
            ])
            .header(REFERER, &format!("{host}home/app/default/login.php"))
            .header(ORIGIN, &origin);

        let response = client.dispatch(request, false).await?;
        let body = client.interpret(&response)?;
        let status = response.status.as_u16();

        let Some(cookie) = client.get_cookie(&response, &SET_COOKIE) else {
            return Err(client.error(ApiError::business(status, "Login failed (no token)")));
        };

        let account = project_path(body, &["data", "auth", "accountInfo"], Value::Null);
        let account: AccountInfo = match account {
            Value::Object(_) => serde_json::from_value(account).map_err(|err| {
                client.error(ApiError::transport(status, format!("Unexpected account info: {err}")))
            })?,
            _ => {
                return Err(
                    client.error(ApiError::business(status, "Login failed (no account info)"))
                );
            }
        };

        Ok(Handshake { token: cookie, expiration: None, user: account.into_profile(), snapshot: None })
    }

    fn attach(token: &str) -> Option<(HeaderName, HeaderValue)> {
        HeaderValue::from_str(token).ok().map(|value| (COOKIE, value))
    }

    /// A non-empty `error` string or array.
    fn business_error(status: StatusCode, body: &Value) -> Option<ApiError> {
        let text = body.get("error").and_then(error_text)?;
        Some(ApiError::business(status.as_u16(), text))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn account_info_maps_to_profile() {
        let account: AccountInfo = serde_json::from_value(json!({
            "cid": "SS16836",
            "cognome": "Rossi",
            "nome": "Mario",
            "id": 1_234_567,
            "type": "S",
        }))
        .unwrap();
        let user = account.into_profile();

        assert_eq!(user.name.as_deref(), Some("Mario"));
        assert_eq!(user.surname.as_deref(), Some("Rossi"));
        assert_eq!(user.id.as_deref(), Some("1234567"));
        assert_eq!(user.user_type, Some(UserType::Student));
        assert_eq!(user.school_code(), Some("SS16836"));
    }

    #[test]
    fn error_string_or_array_is_a_failure() {
        let err = LegacyCookieAuth::business_error(StatusCode::OK, &json!({ "error": "nope" }))
            .unwrap();
        assert_eq!(err.message(), "nope");
        assert_eq!(err.status_code(), 200);

        let err = LegacyCookieAuth::business_error(
            StatusCode::OK,
            &json!({ "error": ["auth failed", "retry"] }),
        )
        .unwrap();
        assert_eq!(err.message(), "auth failed,retry");
    }

    #[test]
    fn empty_error_is_not_a_failure() {
        assert!(LegacyCookieAuth::business_error(StatusCode::OK, &json!({ "error": [] })).is_none());
        assert!(LegacyCookieAuth::business_error(StatusCode::OK, &json!({ "error": "" })).is_none());
        assert!(LegacyCookieAuth::business_error(StatusCode::OK, &json!({ "data": {} })).is_none());
    }

    #[test]
    fn headers_look_like_a_browser() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        LegacyCookieAuth::customize_headers(&ClientOptions::default(), &mut headers);

        assert_eq!(headers[USER_AGENT], WEB_USER_AGENT);
        assert!(!headers.contains_key(ACCEPT));
    }

    #[test]
    fn cookie_rides_in_cookie_header() {
        let (name, value) = LegacyCookieAuth::attach("PHPSESSID=abc").unwrap();
        assert_eq!(name, COOKIE);
        assert_eq!(value, "PHPSESSID=abc");
    }
}
