//! REST endpoint catalog
//!
//! Each method builds a path under `rest/v1/{audience}/{user}`, runs it
//! through the authenticated fetch and projects one field of the answer,
//! falling back to an empty value when the field is missing.

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use classeviva_domain::constants::AUTH_TOKEN_HEADER;
use classeviva_domain::{ApiError, ApiResult, Authorization, School, State, UserType};
use reqwest::header::{HeaderName, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::auth::TokenAuth;
use crate::client::fetch::project;
use crate::client::{FetchRequest, SessionClient};

const API_ROOT: &str = "rest/v1";

/// Resource family in the REST path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Students,
    Parents,
    Users,
}

impl Audience {
    const fn segment(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Parents => "parents",
            Self::Users => "users",
        }
    }
}

/// Which user identifier goes into the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserKey {
    Id,
    Ident,
}

/// Agenda event family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaFilter {
    #[default]
    All,
    Homework,
    Other,
}

impl AgendaFilter {
    /// Code used in the agenda path.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Homework => "AGHW",
            Self::Other => "AGNT",
        }
    }
}

impl FromStr for AgendaFilter {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "homework" => Ok(Self::Homework),
            "other" => Ok(Self::Other),
            _ => Err(ApiError::precondition("Invalid filter")),
        }
    }
}

/// Lessons to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonsRange {
    Today,
    Between(NaiveDate, NaiveDate),
}

/// Options when reading a noticeboard item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadNoticeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Student card, the source of the user type and school descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub ident: Option<String>,
    pub usr_type: Option<String>,
    pub usr_id: Option<Value>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sch_code: Option<String>,
    pub sch_name: Option<String>,
    pub sch_dedication: Option<String>,
    pub sch_city: Option<String>,
    pub sch_prov: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    #[must_use]
    pub fn user_type(&self) -> UserType {
        UserType::from_code_or_student(self.usr_type.as_deref())
    }

    #[must_use]
    pub fn school(&self) -> School {
        School {
            name: self.sch_name.clone(),
            dedication: self.sch_dedication.clone(),
            city: self.sch_city.clone(),
            province: self.sch_prov.clone(),
            code: self.sch_code.clone(),
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl SessionClient<TokenAuth> {
    /// Switch region and rebind the transport to its host.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the transport cannot be rebuilt.
    pub fn set_state(&self, state: State) -> ApiResult<()> {
        self.set_region(state);
        self.rebuild_http_client()?;
        debug!(state = %state, host = %self.host(), "switched region");
        Ok(())
    }

    fn user_path(&self, audience: Audience, key: UserKey, path: &str) -> String {
        let user = self.user();
        let id = match key {
            UserKey::Id => user.id,
            UserKey::Ident => user.ident,
        }
        .unwrap_or_default();
        format!("{API_ROOT}/{}/{id}{path}", audience.segment())
    }

    fn students_get(&self, path: &str) -> FetchRequest {
        FetchRequest::get(self.user_path(Audience::Students, UserKey::Id, path))
    }

    fn apply_card(&self, card: &Card) {
        let user_type = card.user_type();
        let school = card.school();
        self.update_user(|user| {
            user.user_type = Some(user_type);
            user.school = Some(school);
        });
    }

    /// All cards of the account. The first one enriches the profile.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_cards(&self) -> ApiResult<Vec<Card>> {
        let body = self.fetch(self.students_get("/cards")).await?;
        let cards: Vec<Card> =
            serde_json::from_value(project(body, "cards", json!([]))).unwrap_or_default();
        if let Some(card) = cards.first() {
            self.apply_card(card);
        }
        Ok(cards)
    }

    /// The user's card. A non-empty card enriches the profile.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_card(&self) -> ApiResult<Option<Card>> {
        let body = self.fetch(self.students_get("/card")).await?;
        let card = match project(body, "card", Value::Null) {
            Value::Object(fields) if !fields.is_empty() => {
                serde_json::from_value::<Card>(Value::Object(fields)).ok()
            }
            _ => None,
        };
        if let Some(card) = &card {
            self.apply_card(card);
        }
        Ok(card)
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_grades(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/grades2")).await?;
        Ok(project(body, "grades", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_absences(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/absences/details")).await?;
        Ok(project(body, "events", json!([])))
    }

    /// Agenda events between `start` and `end` (both default to today).
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_agenda(
        &self,
        filter: AgendaFilter,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Value> {
        let path = format!(
            "/agenda/{}/{}/{}",
            filter.code(),
            format_date(start.unwrap_or_else(today)),
            format_date(end.unwrap_or_else(today))
        );
        let body = self.fetch(self.students_get(&path)).await?;
        Ok(project(body, "agenda", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_documents(&self) -> ApiResult<Value> {
        let path = self.user_path(Audience::Students, UserKey::Id, "/documents");
        let body = self.fetch(FetchRequest::post(path)).await?;
        Ok(if body.is_null() { json!([]) } else { body })
    }

    /// Availability of the document identified by `hash`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn check_document(&self, hash: &str) -> ApiResult<Value> {
        let path =
            self.user_path(Audience::Students, UserKey::Id, &format!("/documents/check/{hash}/"));
        let body = self.fetch(FetchRequest::post(path)).await?;
        Ok(project(body, "document", json!({ "avaible": false })))
    }

    /// Raw content of the document identified by `hash`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn read_document(&self, hash: &str) -> ApiResult<Vec<u8>> {
        let path =
            self.user_path(Audience::Students, UserKey::Id, &format!("/documents/read/{hash}/"));
        self.fetch_bytes(FetchRequest::post(path)).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_noticeboard(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/noticeboard")).await?;
        Ok(project(body, "items", json!([])))
    }

    /// Mark a noticeboard item as read, optionally signing or joining it.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn read_notice(
        &self,
        event_code: &str,
        id: &str,
        options: &ReadNoticeOptions,
    ) -> ApiResult<Value> {
        let path = self.user_path(
            Audience::Students,
            UserKey::Id,
            &format!("/noticeboard/read/{event_code}/{id}/101"),
        );
        let encoded = serde_json::to_string(options)
            .map_err(|err| self.error(ApiError::precondition(format!("Invalid options: {err}"))))?;
        let request = FetchRequest::post(path)
            .raw(encoded)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.fetch(request).await
    }

    /// Download URL of a noticeboard attachment, empty when there is none.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on a network failure.
    pub async fn get_notice_document_url(&self, event_code: &str, id: &str) -> ApiResult<String> {
        let path = self.user_path(
            Audience::Students,
            UserKey::Ident,
            &format!("/noticeboard/attach/{event_code}/{id}/"),
        );
        let response = self.fetch_raw(FetchRequest::get(path)).await?;
        Ok(response.location().unwrap_or_default())
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_school_books(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/schoolbooks")).await?;
        Ok(project(body, "schoolbooks", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_calendar(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/calendar/all")).await?;
        Ok(project(body, "calendar", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_lessons(&self, range: LessonsRange) -> ApiResult<Value> {
        let path = match range {
            LessonsRange::Today => "/lessons/today".to_string(),
            LessonsRange::Between(start, end) => {
                format!("/lessons/{}/{}", format_date(start), format_date(end))
            }
        };
        let body = self.fetch(self.students_get(&path)).await?;
        Ok(project(body, "lessons", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_notes(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/notes/all")).await?;
        Ok(if body.is_null() { json!({}) } else { body })
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_periods(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/periods")).await?;
        Ok(project(body, "periods", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_subjects(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/subjects")).await?;
        Ok(project(body, "subjects", json!([])))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_didactics(&self) -> ApiResult<Value> {
        let body = self.fetch(self.students_get("/didactics")).await?;
        Ok(project(body, "didacticts", json!([])))
    }

    /// Everything happening between `start` and `end` (default today).
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_overview(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Value> {
        let path = format!(
            "/overview/all/{}/{}",
            format_date(start.unwrap_or_else(today)),
            format_date(end.unwrap_or_else(today))
        );
        self.fetch(self.students_get(&path)).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_ticket(&self) -> ApiResult<Value> {
        self.fetch(FetchRequest::get(format!("{API_ROOT}/auth/ticket"))).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_avatar(&self) -> ApiResult<Value> {
        self.fetch(FetchRequest::get(format!("{API_ROOT}/auth/avatar"))).await
    }

    /// Status of `token`, or of the session token when `None`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_token_status(&self, token: Option<&str>) -> ApiResult<Value> {
        if !self.authorized() {
            return Err(self.error(ApiError::precondition("Not authorized")));
        }
        let token = token.map_or_else(|| self.token(), str::to_string);
        let request = FetchRequest::get(format!("{API_ROOT}/auth/status/"))
            .header(HeaderName::from_static(AUTH_TOKEN_HEADER), &token);
        self.fetch(request).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_parents_options(&self) -> ApiResult<Value> {
        let path = self.user_path(Audience::Parents, UserKey::Id, "/_options");
        let body = self.fetch(FetchRequest::get(path)).await?;
        Ok(project(body, "options", json!({})))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_overall_talks(&self) -> ApiResult<Value> {
        let path = self.user_path(Audience::Parents, UserKey::Id, "/overalltalks/list");
        let body = self.fetch(FetchRequest::get(path)).await?;
        Ok(project(body, "overallTalks", json!([])))
    }

    /// Teachers' talk frames between `start` and `end` (default today).
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_talks(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<Value> {
        let path = self.user_path(
            Audience::Parents,
            UserKey::Id,
            &format!(
                "/talks/teachersframes/{}/{}",
                format_date(start.unwrap_or_else(today)),
                format_date(end.unwrap_or_else(today))
            ),
        );
        let body = self.fetch(FetchRequest::get(path)).await?;
        Ok(project(body, "teachers", json!([])))
    }

    /// Book `slot` of a talk. `contact` is sent as given (e.g. `{"cell": ...}`).
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn book_talk(
        &self,
        teacher_id: &str,
        talk_id: &str,
        slot: &str,
        contact: Value,
    ) -> ApiResult<Value> {
        let path = self.user_path(
            Audience::Parents,
            UserKey::Id,
            &format!("/talks/book/{teacher_id}/{talk_id}/{slot}"),
        );
        self.fetch(FetchRequest::post(path).json(contact)).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn read_talk_message(&self, booking_id: &str) -> ApiResult<Value> {
        let path = self.user_path(
            Audience::Parents,
            UserKey::Id,
            &format!("/talks/teachermessage/{booking_id}"),
        );
        self.fetch(FetchRequest::post(path).json(json!({ "messageRead": true }))).await
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_terms_agreement(&self) -> ApiResult<Value> {
        let path = self.user_path(Audience::Users, UserKey::Ident, "/getTermsAgreement");
        self.fetch(FetchRequest::get(path)).await
    }

    /// Accept or refuse third party data collection.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn set_terms_agreement(&self, third_party: bool) -> ApiResult<Value> {
        let path = self.user_path(Audience::Users, UserKey::Ident, "/setTermsAgreement");
        let bitmask = if third_party { "1" } else { "0" };
        let body = self.fetch(FetchRequest::post(path).json(json!({ "bitmask": bitmask }))).await?;
        Ok(if body.is_null() { json!({ "msg": "NOT OK" }) } else { body })
    }

    /// School contents shown in the app. Needs the school code from a card.
    ///
    /// # Errors
    ///
    /// Fails when not logged in, when no card was fetched yet, or on any
    /// request failure.
    pub async fn get_contents(&self, common: bool) -> ApiResult<Value> {
        if !self.authorized() {
            return Err(self.error(ApiError::precondition("Not authorized")));
        }
        let Some(code) = self.user().school_code().map(str::to_string) else {
            return Err(self.error(ApiError::precondition(
                "No school code, please update using get_card() or get_cards()",
            )));
        };

        let request = FetchRequest::get(format!("gek/api/v1/{code}/2021/students/contents"))
            .query([("common", common)]);
        let body = self.fetch(request).await?;
        Ok(if body.is_null() { json!([]) } else { body })
    }
}
