//! Integration tests for the social messaging client
//!
//! **Coverage:**
//! - Two-step login: e-mail lookup, then account login with the short cookie
//! - Input validation before any request
//! - `OAS` envelope unwrapping of the messaging endpoints

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use classeviva_infra::tibidabo::DEFAULT_PAGE_SIZE;
use classeviva_infra::{ApiErrorCategory, Authorization, TibidaboClient, UserType};
use serde_json::{json, Value};
use support::{TestBackend, SSO_LOGIN};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const EMAIL: &str = "mario.rossi@example.it";
const SHORT_COOKIE: &str = "LOGIN_SSO=sh0rt";
const SESSION_COOKIE: &str = "PHPSESSID=l0ng";

fn accounts_body() -> Value {
    json!({
        "errNo": 0,
        "samAuth": { "id": 99, "nome": "Mario", "cognome": "Rossi" },
        "samAccounts": [{
            "id": 1234567,
            "account_string": "S1234567X",
            "account_type": "S",
            "nome": "Mario Rossi",
            "scuola_descrizione": "Liceo",
            "scuola_intitolazione": "G. Galilei",
            "scuola_luogo": "Roma",
            "sede_codice": "RMIT0001",
        }],
    })
}

async fn mount_email_step(backend: &TestBackend, body: Value) {
    Mock::given(method("POST"))
        .and(path(SSO_LOGIN))
        .and(query_param("a", "emlLogin"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", format!("{SHORT_COOKIE}; path=/"))
                .set_body_json(body),
        )
        .mount(&backend.server)
        .await;
}

async fn mount_account_step(backend: &TestBackend, body: Value) {
    Mock::given(method("POST"))
        .and(path(SSO_LOGIN))
        .and(query_param("a", "stdLogin"))
        .and(header("cookie", SHORT_COOKIE))
        .and(body_string_contains("u=S1234567X"))
        .and(body_string_contains("c=RMIT0001"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", format!("{SESSION_COOKIE}; path=/; HttpOnly"))
                .set_body_json(body),
        )
        .mount(&backend.server)
        .await;
}

async fn logged_in(backend: &TestBackend) -> TibidaboClient {
    mount_email_step(backend, accounts_body()).await;
    mount_account_step(backend, json!({ "auth": true })).await;
    let client = TibidaboClient::new(backend.options(EMAIL, "secret")).unwrap();
    client.login().await.unwrap();
    client
}

#[tokio::test]
async fn two_step_login_builds_profile() {
    let backend = TestBackend::start().await;
    let client = logged_in(&backend).await;

    let user = client.user();
    assert!(client.authorized());
    assert_eq!(user.name.as_deref(), Some("Mario"));
    assert_eq!(user.surname.as_deref(), Some("Rossi"));
    assert_eq!(user.id.as_deref(), Some("1234567"));
    assert_eq!(user.ident.as_deref(), Some("S1234567X"));
    assert_eq!(user.user_type, Some(UserType::Student));
    assert_eq!(user.school_code(), Some("RMIT0001"));
    assert!(client.expiration().is_none());
    assert!(!backend.cache_path().exists());
}

#[tokio::test]
async fn invalid_email_fails_without_requests() {
    let backend = TestBackend::start().await;
    let client = TibidaboClient::new(backend.options("S1234567", "secret")).unwrap();

    let err = client.login().await.unwrap_err();

    assert_eq!(err.category(), ApiErrorCategory::Precondition);
    assert_eq!(err.message(), "Invalid email");
    let requests = backend.server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn email_step_error_uses_decoded_message() {
    let backend = TestBackend::start().await;
    mount_email_step(&backend, json!({ "errNo": 2, "errDeco": ["", "", "Password errata"] }))
        .await;
    let client = TibidaboClient::new(backend.options(EMAIL, "wrong")).unwrap();

    let err = client.login().await.unwrap_err();

    assert_eq!(err.category(), ApiErrorCategory::Business);
    assert_eq!(err.message(), "Password errata");
    assert!(!client.authorized());
}

#[tokio::test]
async fn email_without_accounts_fails() {
    let backend = TestBackend::start().await;
    mount_email_step(&backend, json!({ "errNo": 0, "samAccounts": [] })).await;
    let client = TibidaboClient::new(backend.options(EMAIL, "secret")).unwrap();

    let err = client.login().await.unwrap_err();

    assert_eq!(err.message(), "Login failed (no account)");
}

#[tokio::test]
async fn rejected_account_step_reports_reason() {
    let backend = TestBackend::start().await;
    mount_email_step(&backend, accounts_body()).await;
    mount_account_step(&backend, json!({ "auth": false, "error": ["account bloccato"] })).await;
    let client = TibidaboClient::new(backend.options(EMAIL, "secret")).unwrap();

    let err = client.login().await.unwrap_err();

    assert_eq!(err.message(), "Login failed (account bloccato)");
    assert!(!client.authorized());
}

#[tokio::test]
async fn requests_send_session_cookie_and_unwrap_oas() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/sps/app/default/SocMsgApi.php"))
        .and(header("cookie", SESSION_COOKIE))
        .and(header("user-agent", "OAS User Agent"))
        .and(body_string_contains("a=acGetUnreadCount"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "OAS": { "unread": { "totCount": 4 } } })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    let client = logged_in(&backend).await;

    assert_eq!(client.get_unread_messages_count().await.unwrap(), 4);
}

#[tokio::test]
async fn whoami_defaults_when_oas_missing() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/sps/app/default/SocMsgApi.php"))
        .and(body_string_contains("a=acWhoAmI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&backend.server)
        .await;
    let client = logged_in(&backend).await;

    assert_eq!(client.whoami().await.unwrap(), json!({}));
}

#[tokio::test]
async fn groups_use_ident_without_check_letter() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/sps/app/default/GroupsApi.php"))
        .and(body_string_contains("a=aGrpListOf"))
        .and(body_string_contains("uid=S1234567&"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "groups": ["3A"] } })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    let client = logged_in(&backend).await;

    assert_eq!(client.get_groups(false, false, false).await.unwrap(), json!(["3A"]));
}

#[tokio::test]
async fn oas_settings_errors_are_business_errors() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/oas/app/default/oas_services4.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "errori": ["servizio non attivo"] })),
        )
        .mount(&backend.server)
        .await;
    let client = logged_in(&backend).await;

    let err = client.get_oas_settings().await.unwrap_err();

    assert_eq!(err.category(), ApiErrorCategory::Business);
    assert_eq!(err.message(), "servizio non attivo");
}

#[tokio::test]
async fn endpoints_require_login() {
    let backend = TestBackend::start().await;
    let client = TibidaboClient::new(backend.options(EMAIL, "secret")).unwrap();

    let err = client.get_messages(None, "", DEFAULT_PAGE_SIZE).await.unwrap_err();

    assert_eq!(err.message(), "Not logged in");
}
