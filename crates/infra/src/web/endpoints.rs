//! Web portal endpoints
//!
//! Paths are `{section}/app/default/{page}`, where the section is one of the
//! portal areas (`fml`, `tools`, `sps`, `sif`, `sol`, `acc`, `auth`).

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use classeviva_domain::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auth::LegacyCookieAuth;
use crate::client::fetch::project_path;
use crate::client::{FetchRequest, SessionClient};

const DEFAULT_SECTION: &str = "fml";

/// File format of an agenda export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xml,
    Xls,
}

impl ExportFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Xls => "xls",
        }
    }
}

/// Product area of the documentation portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Set,
    Cvv,
    Oas,
    Ldt,
    Sdg,
    Acd,
    Vrd,
    E2c,
    Cvp,
}

impl Product {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Cvv => "cvv",
            Self::Oas => "oas",
            Self::Ldt => "ldt",
            Self::Sdg => "sdg",
            Self::Acd => "acd",
            Self::Vrd => "vrd",
            Self::E2c => "e2c",
            Self::Cvp => "cvp",
        }
    }
}

fn page(section: &str, page: &str) -> String {
    format!("{section}/app/default/{page}")
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

fn or_empty_object(body: Value) -> Value {
    if body.is_null() {
        json!({})
    } else {
        body
    }
}

impl SessionClient<LegacyCookieAuth> {
    /// Agenda events between `start` and `end` (both default to now).
    ///
    /// # Errors
    ///
    /// Fails when not logged in, on a non-success status or when the answer is
    /// neither `null` nor JSON.
    pub async fn get_agenda(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        hide_virtual_rooms: bool,
    ) -> ApiResult<Value> {
        let now = Utc::now();
        let request = FetchRequest::get(page(DEFAULT_SECTION, "agenda_studenti.php")).query([
            ("ope", "get_events".to_string()),
            ("classe_id", String::new()),
            ("gruppo_id", String::new()),
            ("nascondi_av", flag(hide_virtual_rooms).to_string()),
            ("start", start.unwrap_or(now).timestamp().to_string()),
            ("end", end.unwrap_or(now).timestamp().to_string()),
        ]);

        let text = self.fetch_text(request).await?;
        if text.trim() == "null" {
            return Ok(json!([]));
        }
        serde_json::from_str(&text)
            .map_err(|_| self.error(ApiError::transport(200, "Could not parse JSON")))
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_portfolio(&self) -> ApiResult<Value> {
        let body = self.fetch(FetchRequest::get(page("tools", "get_pfolio.php"))).await?;
        Ok(or_empty_object(body))
    }

    /// Export the agenda between `start` and `end` as an XML or XLS document.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on a non-success status.
    pub async fn export_agenda(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        format: ExportFormat,
    ) -> ApiResult<String> {
        let today = Local::now().date_naive();
        let start = start.unwrap_or(today);
        let end = end.unwrap_or(today);
        let author = self.user().id.unwrap_or_default();

        let request = FetchRequest::get(page(DEFAULT_SECTION, "xml_export.php")).query([
            ("stampa", ":stampa:".to_string()),
            ("report_name", String::new()),
            ("tipo", "agenda".to_string()),
            // Day of month. Older portal clients sent the weekday number here.
            (
                "data",
                format!("{}+{}+{:02}", today.day(), today.month(), today.year() % 100),
            ),
            ("autore_id", author),
            ("tipo_export", "EVENTI_AGENDA_STUDENTI".to_string()),
            ("quad", ":quad:".to_string()),
            ("materia_id", String::new()),
            ("classe_id", ":classe_id:".to_string()),
            ("gruppo_id", ":gruppo_id:".to_string()),
            ("ope", "RPT".to_string()),
            ("dal", start.format("%Y-%-m-%-d").to_string()),
            ("al", end.format("%Y-%-m-%-d").to_string()),
            ("formato", format.as_str().to_string()),
        ]);

        self.fetch_text(request).await
    }

    /// Number of unread messages, `None` when the portal does not say.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_unread_messages(&self) -> ApiResult<Option<u64>> {
        let request =
            FetchRequest::get(page("sps", "SocMsgApi.php")).query([("a", "acGetUnreadCount")]);
        let body = self.fetch(request).await?;
        Ok(project_path(body, &["OAS", "unread", "totCount"], Value::Null).as_u64())
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_username(&self) -> ApiResult<Value> {
        let body = self.fetch(FetchRequest::get(page("tools", "get_username.php"))).await?;
        Ok(or_empty_object(body))
    }

    /// Documentation entries matching `search` in `product`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_documentation_list(
        &self,
        product: Option<Product>,
        search: &str,
    ) -> ApiResult<Value> {
        let request = FetchRequest::get(page("acc", "documentazione.xhr.php")).query([
            ("act", "get_faq_autocomplete"),
            ("prodotto", product.map_or("", |product| product.code())),
            ("find", search),
        ]);
        let body = self.fetch(request).await?;
        Ok(or_empty_object(body))
    }

    /// Link to a documentation page. No request is made.
    #[must_use]
    pub fn documentation_url(&self, product: Product, id: u64) -> String {
        format!(
            "{}{}?prodotto={}&cerca={}",
            self.host(),
            page("acc", "documentazione.php"),
            urlencoding::encode(product.code()),
            urlencoding::encode(&format!("d:{id}")),
        )
    }

    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_avatar(&self) -> ApiResult<Value> {
        let body = self.fetch(FetchRequest::get(page("tools", "get_avatar.php"))).await?;
        Ok(or_empty_object(body))
    }

    /// Maps API key used by the portal, empty when absent.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_maps_api_key(&self) -> ApiResult<String> {
        let request =
            FetchRequest::get(page("sps", "SocMsgApi.php")).query([("a", "acGooBApiK")]);
        let body = self.fetch(request).await?;
        Ok(project_path(body, &["OAS", "gooBApiK"], Value::Null)
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    /// Address book of the messaging area.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_rubrica(&self) -> ApiResult<Value> {
        let request =
            FetchRequest::get(page("sps", "SocMsgApi.php")).query([("a", "acGetRubrica")]);
        let body = self.fetch(request).await?;
        Ok(project_path(body, &["OAS", "targets"], json!({})))
    }

    /// First page of messages.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_messages(&self) -> ApiResult<Value> {
        let request = FetchRequest::post(page("sps", "SocMsgApi.php"))
            .query([("a", "acGetMsgPag")])
            .form([
                ("anyt", "0"),
                ("ctx", ""),
                ("hmid", "0"),
                ("ignpf", "0"),
                ("mid", "0"),
                ("mmid", "0"),
                ("mpp", "20"),
                ("nosp", "0"),
                ("nwth", "0"),
                ("p", "1"),
                ("search", ""),
                ("unreadOnly", "0"),
                ("_stkx", ""),
            ]);
        let body = self.fetch(request).await?;
        Ok(project_path(body, &["OAS", "rows"], json!([])))
    }

    /// Personal noticeboard.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_bacheca(&self, hide_inactive: bool) -> ApiResult<Value> {
        let request = FetchRequest::get(page("sif", "bacheca_personale.php")).query([
            ("action", "get_comunicazioni"),
            ("cerca", ""),
            ("ncna", flag(hide_inactive)),
            ("tipo_com", ""),
        ]);
        let body = self.fetch(request).await?;
        Ok(or_empty_object(body))
    }

    /// Mark noticeboard communications as read. True when the portal says `OK`.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on a non-success status.
    pub async fn read_communications(&self, ids: &[&str]) -> ApiResult<bool> {
        let request = FetchRequest::get(page("sif", "bacheca_personale.php"))
            .query([("action", "read_all".to_string()), ("id_relazioni", ids.join(","))]);
        let text = self.fetch_text(request).await?;
        Ok(text.trim() == "OK")
    }

    /// Resolve a published document.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_document_url(&self, params: &str, doctype: u32) -> ApiResult<Value> {
        let request = FetchRequest::get(page("sol", "pubblicazioni.php")).query([
            ("a", "RA-RICAVA".to_string()),
            ("doctype", doctype.to_string()),
            ("sessione", "S3".to_string()),
            ("params", params.to_string()),
        ]);
        let body = self.fetch(request).await?;
        Ok(or_empty_object(body))
    }

    /// Two-factor status of the account.
    ///
    /// # Errors
    ///
    /// Fails when not logged in or on any request failure.
    pub async fn get_account_info(&self) -> ApiResult<Value> {
        let request = FetchRequest::get(page("auth", "OtpApi.php")).query([("a", "recStatus")]);
        let body = self.fetch(request).await?;
        Ok(or_empty_object(body))
    }
}
