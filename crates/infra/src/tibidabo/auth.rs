//! Two-step cookie authentication of the social messaging backend
//!
//! `emlLogin` resolves the e-mail to its accounts and hands out a short-lived
//! cookie. `stdLogin` trades that cookie, the first account and its school
//! code for the session cookie.

use async_trait::async_trait;
use classeviva_domain::constants::OAS_USER_AGENT;
use classeviva_domain::{ApiError, ApiResult, ClientOptions, School, UserProfile, UserType};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::fetch::error_text;
use crate::client::{FetchRequest, Handshake, SessionClient, SessionStrategy};

pub(crate) const LOGIN_PATH: &str = "home/app/default/login-sso.php";

#[allow(clippy::expect_used)]
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("EMAIL_REGEX pattern is valid")
});

/// Whether `email` looks like an e-mail address (case-insensitive).
#[must_use]
pub fn is_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(&email.to_lowercase())
}

/// Cookie authentication of the messaging backend
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieAuth;

/// Client of the social messaging backend
pub type TibidaboClient = SessionClient<CookieAuth>;

/// `samAuth` of the e-mail step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamAuth {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub cognome: String,
    #[serde(default)]
    pub auth_string: Option<String>,
}

/// One entry of `samAccounts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamAccount {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub account_string: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub scuola_descrizione: Option<String>,
    #[serde(default)]
    pub scuola_intitolazione: Option<String>,
    #[serde(default)]
    pub scuola_luogo: Option<String>,
    #[serde(default)]
    pub sede_codice: String,
}

fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Profile of the first account.
fn profile(auth: &SamAuth, account: &SamAccount) -> UserProfile {
    let school = School {
        name: account.scuola_descrizione.clone(),
        dedication: account.scuola_intitolazione.clone(),
        city: account.scuola_luogo.clone(),
        province: None,
        code: Some(account.sede_codice.clone()).filter(|code| !code.is_empty()),
    };

    UserProfile {
        name: Some(auth.nome.clone()),
        surname: Some(auth.cognome.clone()),
        id: id_text(&account.id),
        ident: Some(account.account_string.clone()),
        user_type: account
            .account_type
            .as_deref()
            .map(|code| UserType::from_code_or_student(Some(code))),
        school: Some(school),
    }
}

/// Message of a failed e-mail step, looked up in `errDeco` by `errNo`.
fn email_step_error(body: &Value) -> Option<String> {
    let code = body.get("errNo").and_then(Value::as_u64).filter(|code| *code != 0)?;
    let message = usize::try_from(code)
        .ok()
        .and_then(|index| body.get("errDeco")?.get(index)?.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Login failed (error {code})"));
    Some(message)
}

#[async_trait]
impl SessionStrategy for CookieAuth {
    const NAME: &'static str = "Tibidabo";
    const METHODS: &'static [&'static str] = &[
        "whoami",
        "get_oas_settings",
        "get_user_info",
        "get_msg_targets",
        "get_address_book",
        "get_groups",
        "get_contact_info",
        "get_messages",
        "set_message_as_read",
        "post_comment",
        "like_message",
        "get_unread_messages_count",
        "send_message",
        "remove_me_from_thread",
        "report_message",
    ];

    fn customize_headers(_options: &ClientOptions, headers: &mut HeaderMap) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        headers.insert(USER_AGENT, HeaderValue::from_static(OAS_USER_AGENT));
    }

    fn validate(options: &ClientOptions) -> ApiResult<()> {
        if !options.has_credentials() {
            return Err(ApiError::precondition("Email or password not set"));
        }
        if !is_email(&options.username) {
            return Err(ApiError::precondition("Invalid email"));
        }
        Ok(())
    }

    async fn handshake(client: &SessionClient<Self>) -> ApiResult<Handshake> {
        let options = client.options();

        let request = FetchRequest::post(LOGIN_PATH)
            .query([("a", "emlLogin")])
            .form([("u", options.username.as_str()), ("p", options.password.as_str())]);
        let response = client.dispatch(request, false).await?;
        let body = client.interpret(&response)?;
        let status = response.status.as_u16();

        if let Some(message) = email_step_error(&body) {
            return Err(client.error(ApiError::business(status, message)));
        }

        let Some(short_cookie) = client.get_cookie(&response, &SET_COOKIE) else {
            return Err(client.error(ApiError::business(status, "Login failed (no token)")));
        };

        let auth = body
            .get("samAuth")
            .filter(|auth| auth.is_object())
            .and_then(|auth| serde_json::from_value::<SamAuth>(auth.clone()).ok());
        let account = body
            .get("samAccounts")
            .and_then(|accounts| accounts.get(0))
            .and_then(|account| serde_json::from_value::<SamAccount>(account.clone()).ok());
        let (Some(auth), Some(account)) = (auth, account) else {
            return Err(client.error(ApiError::business(status, "Login failed (no account)")));
        };
        debug!(account = %account.account_string, "resolved messaging account");

        let request = FetchRequest::post(LOGIN_PATH)
            .query([("a", "stdLogin")])
            .form([
                ("u", account.account_string.as_str()),
                ("p", options.password.as_str()),
                ("c", account.sede_codice.as_str()),
            ])
            .header(COOKIE, &short_cookie);
        let response = client.dispatch(request, false).await?;
        let status = response.status.as_u16();
        let body = response
            .json()
            .ok_or_else(|| client.error(ApiError::transport(status, "Could not parse JSON")))?;

        if !body.get("auth").is_some_and(is_truthy) {
            let reason = body.get("error").and_then(error_text);
            return Err(client.error(ApiError::business(
                status,
                format!("Login failed ({})", reason.as_deref().unwrap_or("unknown error")),
            )));
        }

        let Some(cookie) = client.get_cookie(&response, &SET_COOKIE) else {
            return Err(client.error(ApiError::business(status, "Login failed (no token)")));
        };

        Ok(Handshake {
            token: cookie,
            expiration: None,
            user: profile(&auth, &account),
            snapshot: None,
        })
    }

    fn attach(token: &str) -> Option<(HeaderName, HeaderValue)> {
        HeaderValue::from_str(token).ok().map(|value| (COOKIE, value))
    }

    fn business_error(status: StatusCode, body: &Value) -> Option<ApiError> {
        let text = body.get("error").and_then(error_text)?;
        Some(ApiError::business(status.as_u16(), text))
    }
}
