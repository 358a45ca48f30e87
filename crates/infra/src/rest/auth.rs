//! Token authentication against `/rest/v1`

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use classeviva_common::CachedSnapshot;
use classeviva_domain::constants::{
    AUTH_TOKEN_HEADER, DEV_APIKEY, DEV_APIKEY_HEADER, IF_NONE_MATCH_HEADER, REST_AGENT_SUFFIX,
};
use classeviva_domain::{numeric_id, ApiError, ApiResult, ClientOptions, UserProfile};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{FetchRequest, Handshake, SessionClient, SessionStrategy};

pub(crate) const LOGIN_PATH: &str = "rest/v1/auth/login/";

/// Token header authentication
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAuth;

/// Client of the REST API
pub type RestClient = SessionClient<TokenAuth>;

/// Body of a successful `auth/login` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ident: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub token: String,
    pub release: Option<String>,
    pub expire: DateTime<FixedOffset>,
}

impl LoginResponse {
    fn into_handshake(self, snapshot: Option<CachedSnapshot>) -> Handshake {
        let user = UserProfile {
            name: self.first_name,
            surname: self.last_name,
            id: Some(numeric_id(&self.ident)),
            ident: Some(self.ident),
            ..UserProfile::default()
        };

        Handshake {
            token: self.token,
            expiration: Some(self.expire.with_timezone(&Utc)),
            user,
            snapshot,
        }
    }
}

#[async_trait]
impl SessionStrategy for TokenAuth {
    const NAME: &'static str = "Rest";
    const METHODS: &'static [&'static str] = &[
        "set_state",
        "get_cards",
        "get_card",
        "get_grades",
        "get_absences",
        "get_agenda",
        "get_documents",
        "check_document",
        "read_document",
        "get_noticeboard",
        "read_notice",
        "get_notice_document_url",
        "get_school_books",
        "get_calendar",
        "get_lessons",
        "get_notes",
        "get_periods",
        "get_subjects",
        "get_didactics",
        "get_overview",
        "get_ticket",
        "get_avatar",
        "get_token_status",
        "get_parents_options",
        "get_overall_talks",
        "get_talks",
        "book_talk",
        "read_talk_message",
        "get_terms_agreement",
        "set_terms_agreement",
        "get_contents",
    ];
    const USES_CACHE: bool = true;
    const RENEWS: bool = true;

    fn customize_headers(options: &ClientOptions, headers: &mut HeaderMap) {
        let agent = match options.app {
            Some(app) => format!("{} {REST_AGENT_SUFFIX}", app.identifier()),
            None => REST_AGENT_SUFFIX.to_string(),
        };
        if let Ok(agent) = HeaderValue::from_str(&agent) {
            headers.insert(USER_AGENT, agent);
        }
        headers.insert(
            HeaderName::from_static(DEV_APIKEY_HEADER),
            HeaderValue::from_static(DEV_APIKEY),
        );
        headers.insert(HeaderName::from_static(IF_NONE_MATCH_HEADER), HeaderValue::from_static(""));
    }

    async fn handshake(client: &SessionClient<Self>) -> ApiResult<Handshake> {
        let options = client.options();
        let request = FetchRequest::post(LOGIN_PATH)
            .json(json!({ "uid": options.username, "pass": options.password }));

        let response = client.dispatch(request, false).await?;
        let body = client.interpret(&response)?;
        let snapshot = CachedSnapshot::from_response(&body);

        let login: LoginResponse = serde_json::from_value(body).map_err(|err| {
            client.error(ApiError::transport(
                response.status.as_u16(),
                format!("Unexpected login response: {err}"),
            ))
        })?;

        Ok(login.into_handshake(snapshot))
    }

    fn attach(token: &str) -> Option<(HeaderName, HeaderValue)> {
        let value = HeaderValue::from_str(token).ok()?;
        Some((HeaderName::from_static(AUTH_TOKEN_HEADER), value))
    }

    /// `{ statusCode, message, error }`: any truthy `error` is a failure.
    fn business_error(status: StatusCode, body: &Value) -> Option<ApiError> {
        let error = body.get("error")?;
        let raised = match error {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::String(text) => !text.is_empty(),
            _ => true,
        };
        if !raised {
            return None;
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .or_else(|| {
                error.as_str().and_then(|text| text.rsplit('/').next()).map(str::to_string)
            })
            .unwrap_or_else(|| error.to_string());

        let code = body
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or_else(|| status.as_u16());

        Some(ApiError::business(code, message))
    }

    fn restore(snapshot: &CachedSnapshot) -> Option<Handshake> {
        let login: LoginResponse = snapshot.decode().ok()?;
        Some(login.into_handshake(None))
    }
}
