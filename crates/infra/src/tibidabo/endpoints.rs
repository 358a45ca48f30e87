//! Messaging endpoints
//!
//! Every call is a form POST with an `a` action field. Most answers wrap the
//! payload in an `OAS` object that is unwrapped before returning.

use classeviva_domain::{ApiError, ApiResult, UserType};
use serde_json::{json, Value};

use super::auth::CookieAuth;
use crate::client::fetch::{error_text, project, project_path};
use crate::client::{FetchRequest, SessionClient};

const MESSAGES: &str = "sps/app/default/SocMsgApi.php";
const GROUPS: &str = "sps/app/default/GroupsApi.php";
const THREADS: &str = "sps-api/app/default/messaggi.php";
const SERVICES: &str = "oas/app/default/oas_services4.php";

/// Default page size of message listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

fn flag(enabled: bool) -> u8 {
    u8::from(enabled)
}

impl SessionClient<CookieAuth> {
    /// POST `fields` to `path` and return the whole answer.
    async fn call(&self, path: &str, fields: Vec<(&str, String)>) -> ApiResult<Value> {
        self.fetch(FetchRequest::post(path).form(fields)).await
    }

    /// POST `fields` to `path` and return its `OAS` object, `{}` when absent.
    async fn oas_call(&self, path: &str, fields: Vec<(&str, String)>) -> ApiResult<Value> {
        let body = self.call(path, fields).await?;
        Ok(project(body, "OAS", json!({})))
    }

    /// Who the portal thinks we are.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn whoami(&self) -> ApiResult<Value> {
        let body = self.oas_call(MESSAGES, vec![("a", "acWhoAmI".into())]).await?;
        Ok(project_path(body, &["data", "whoami"], json!({})))
    }

    /// Settings of the messaging service.
    ///
    /// # Errors
    ///
    /// Fails when not logged in, on any request failure, or when the answer
    /// carries `errori`.
    pub async fn get_oas_settings(&self) -> ApiResult<Value> {
        let body = self.call(SERVICES, vec![("a", "info".into())]).await?;
        let failure = body
            .get("errori")
            .filter(|errors| !matches!(errors, Value::Null | Value::Bool(false)))
            .map(|errors| error_text(errors).unwrap_or_else(|| errors.to_string()));
        match failure {
            Some(message) => Err(self.error(ApiError::business(200, message))),
            None => Ok(body),
        }
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_user_info(&self, user_id: &str, account_type: UserType) -> ApiResult<Value> {
        let body = self
            .oas_call(
                MESSAGES,
                vec![
                    ("a", "acUserGetInfo".into()),
                    ("id", user_id.to_string()),
                    ("type", account_type.to_string()),
                ],
            )
            .await?;
        Ok(project(body, "userInfo", json!({})))
    }

    /// Classes, groups and people that can receive a message.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_msg_targets(&self, with_users: bool) -> ApiResult<Value> {
        let body = self
            .oas_call(
                MESSAGES,
                vec![("a", "acGetGroups".into()), ("withUsers", flag(with_users).to_string())],
            )
            .await?;
        Ok(project(body, "targets", json!({})))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_address_book(&self, with_groups: bool) -> ApiResult<Value> {
        let uid = self.user().id.unwrap_or_default();
        let body = self
            .call(
                GROUPS,
                vec![
                    ("a", "aNetList".into()),
                    ("uid", uid),
                    ("wg", flag(with_groups).to_string()),
                    ("ityp", "*".into()),
                ],
            )
            .await?;
        Ok(project_path(body, &["data", "net"], json!({})))
    }

    /// Groups of the account.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_groups(
        &self,
        with_long_description: bool,
        with_photo: bool,
        with_xml_info: bool,
    ) -> ApiResult<Value> {
        let mut uid = self.user().ident.unwrap_or_default();
        uid.pop();

        let body = self
            .call(
                GROUPS,
                vec![
                    ("a", "aGrpListOf".into()),
                    ("uid", uid),
                    ("wl", flag(with_long_description).to_string()),
                    ("wx", flag(with_xml_info).to_string()),
                    ("wf", flag(with_photo).to_string()),
                    ("wmc", "1".into()),
                    ("ityp", "*".into()),
                ],
            )
            .await?;
        Ok(project_path(body, &["data", "groups"], json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_contact_info(&self, account_ident: &str) -> ApiResult<Value> {
        self.oas_call(MESSAGES, vec![("a", "acGetPUInfo".into()), ("uid", account_ident.into())])
            .await
    }

    /// One page of messages, optionally filtered by `search`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_messages(
        &self,
        page: Option<u32>,
        search: &str,
        page_size: u32,
    ) -> ApiResult<Value> {
        self.oas_call(
            MESSAGES,
            vec![
                ("a", "acGetMsgPag".into()),
                ("p", page.map(|page| page.to_string()).unwrap_or_default()),
                ("mpp", page_size.to_string()),
                ("search", search.into()),
            ],
        )
        .await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn set_message_as_read(&self, message_id: &str) -> ApiResult<Value> {
        self.oas_call(MESSAGES, vec![("a", "acSetDRead".into()), ("mids[]", message_id.into())])
            .await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn post_comment(&self, message_id: &str, comment: &str) -> ApiResult<Value> {
        self.oas_call(
            THREADS,
            vec![
                ("a", "acPostComment".into()),
                ("id", message_id.into()),
                ("message", comment.into()),
            ],
        )
        .await
    }

    /// Toggle the like on a message.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn like_message(&self, message_id: &str) -> ApiResult<Value> {
        self.oas_call(MESSAGES, vec![("a", "acSwitchLikePost".into()), ("id", message_id.into())])
            .await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_unread_messages_count(&self) -> ApiResult<u64> {
        let body = self.oas_call(MESSAGES, vec![("a", "acGetUnreadCount".into())]).await?;
        Ok(project_path(body, &["unread", "totCount"], json!(0)).as_u64().unwrap_or(0))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn send_message(
        &self,
        message: &str,
        subject: &str,
        target_id: &str,
    ) -> ApiResult<Value> {
        self.oas_call(
            THREADS,
            vec![
                ("a", "acPostMsg".into()),
                ("uid", target_id.into()),
                ("subject", subject.into()),
                ("message", message.into()),
            ],
        )
        .await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn remove_me_from_thread(&self, thread_message_id: &str) -> ApiResult<Value> {
        self.oas_call(
            THREADS,
            vec![("a", "acRemoveMeFromThread".into()), ("id", thread_message_id.into())],
        )
        .await
    }

    /// Report a message to the moderators.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn report_message(&self, message_id: &str) -> ApiResult<Value> {
        self.oas_call(THREADS, vec![("a", "acBanMsgReq".into()), ("id", message_id.into())]).await
    }
}
