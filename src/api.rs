//! Remote theme API client.
//!
//! A thin blocking client over `reqwest`. Every GET endpoint answers with the
//! same envelope:
//!
//! ```json
//! { "message": "Success", "data": { "items": [ ... ] } }
//! ```
//!
//! Anything other than `message == "Success"` is surfaced verbatim as
//! [`ApiError::Server`]. Parsing lives in free functions ([`parse_layouts`],
//! [`parse_theme_options`], [`parse_upload_response`]) so it can be tested
//! without a server.
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`ApiClient::fetch_layouts`] | `GET {base}/layouts` |
//! | [`ApiClient::fetch_theme_categories`] | `GET {base}/theme-categories` |
//! | [`ApiClient::fetch_theme_lists`] | `GET {base}/theme-lists` |
//! | [`ApiClient::upload_theme`] | `POST {base}/themes` (multipart) |
//!
//! Nothing is retried.

use crate::catalog::{LayoutEntry, normalize_code};
use crate::config::ApiConfig;
use crate::upload::{FieldValue, UploadSubmission};
use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const SUCCESS: &str = "Success";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API base URL is not configured (set api.base_url)")]
    NotConfigured,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: String,
    #[serde(default = "Option::default")]
    data: Option<Items<T>>,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Unwrap an envelope, failing on any non-success message.
fn parse_items<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, ApiError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if envelope.message != SUCCESS {
        return Err(ApiError::Server(envelope.message));
    }
    Ok(envelope.data.map(|d| d.items).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct RemoteLayout {
    id: i64,
    code: String,
    width: u32,
    height: u32,
}

/// Layout entries from a `/layouts` body, in server order.
///
/// Codes are uppercased so they match like built-in codes. Entries without a
/// code or with a zero dimension are dropped.
pub fn parse_layouts(body: &str) -> Result<Vec<LayoutEntry>, ApiError> {
    let items: Vec<RemoteLayout> = parse_items(body)?;
    Ok(items
        .into_iter()
        .filter_map(|l| {
            let code = normalize_code(&l.code);
            if code.is_empty() || l.width == 0 || l.height == 0 {
                debug!(id = l.id, code = %l.code, "dropping unusable remote layout");
                return None;
            }
            Some(LayoutEntry::new(code, l.width, l.height).with_id(l.id))
        })
        .collect())
}

/// A selectable theme category or theme list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeOption {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub order_no: i64,
    #[serde(default)]
    pub is_active: bool,
}

/// Active options sorted by `orderNo` (stable for ties).
pub fn parse_theme_options(body: &str) -> Result<Vec<ThemeOption>, ApiError> {
    let mut items: Vec<ThemeOption> = parse_items(body)?;
    items.retain(|o| o.is_active);
    items.sort_by_key(|o| o.order_no);
    Ok(items)
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    message: String,
}

/// Success iff the HTTP status is a success and `message == "Success"`.
///
/// Otherwise the server's message is returned verbatim, falling back to the
/// HTTP status text when the body has none.
pub fn parse_upload_response(
    status_ok: bool,
    status_text: &str,
    body: &str,
) -> Result<(), ApiError> {
    let message = serde_json::from_str::<UploadResponse>(body)
        .map(|r| r.message)
        .unwrap_or_default();
    if status_ok && message == SUCCESS {
        return Ok(());
    }
    if message.is_empty() {
        return Err(ApiError::Server(status_text.to_string()));
    }
    Err(ApiError::Server(message))
}

/// Blocking client bound to one API root.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    fn get_body(&self, path: &str) -> Result<String, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        let body = response.text().map_err(|e| self.map_reqwest_error(e))?;
        if !status.is_success() {
            // Prefer the envelope message when the server sent one
            return match parse_items::<serde_json::Value>(&body) {
                Err(ApiError::Server(message)) => Err(ApiError::Server(message)),
                _ => Err(ApiError::Server(status.to_string())),
            };
        }
        Ok(body)
    }

    pub fn fetch_layouts(&self) -> Result<Vec<LayoutEntry>, ApiError> {
        let layouts = parse_layouts(&self.get_body("layouts")?)?;
        info!(count = layouts.len(), "loaded remote layout catalog");
        Ok(layouts)
    }

    pub fn fetch_theme_categories(&self) -> Result<Vec<ThemeOption>, ApiError> {
        parse_theme_options(&self.get_body("theme-categories")?)
    }

    pub fn fetch_theme_lists(&self) -> Result<Vec<ThemeOption>, ApiError> {
        parse_theme_options(&self.get_body("theme-lists")?)
    }

    /// Send an assembled upload as `multipart/form-data`.
    pub fn upload_theme(&self, submission: &UploadSubmission) -> Result<(), ApiError> {
        let mut form = multipart::Form::new();
        for field in &submission.fields {
            form = match &field.value {
                FieldValue::Text(text) => form.text(field.name.clone(), text.clone()),
                FieldValue::File {
                    filename,
                    mime,
                    bytes,
                } => {
                    let part = multipart::Part::bytes(bytes.clone())
                        .file_name(filename.clone())
                        .mime_str(mime)
                        .map_err(|e| ApiError::Network(e.to_string()))?;
                    form.part(field.name.clone(), part)
                }
            };
        }

        let url = self.endpoint("themes");
        info!(%url, fields = submission.fields.len(), "uploading theme");
        let response = self
            .authorize(self.http.post(&url))
            .multipart(form)
            .send()
            .map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        let status_text = status.to_string();
        let body = response.text().map_err(|e| self.map_reqwest_error(e))?;
        parse_upload_response(status.is_success(), &status_text, &body)
    }
}
