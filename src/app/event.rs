//! The trigger contract: what a handler receives and what it hands back.

use std::collections::{BTreeMap, HashMap};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::utils::error::AppError;

/// An HTTP request as delivered by the trigger.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

impl ApiEvent {
    pub fn new(http_method: impl Into<String>) -> Self {
        Self { http_method: http_method.into(), query_string_parameters: None, body: None }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// A query string parameter, if present.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query_string_parameters.as_ref()?.get(key).map(String::as_str)
    }

    /// Parse the JSON body. An absent or blank body parses as `T::default()`.
    pub fn json_body<T: DeserializeOwned + Default>(&self) -> Result<T, AppError> {
        match self.body.as_deref().map(str::trim) {
            None | Some("") => Ok(T::default()),
            Some(body) => serde_json::from_str(body).map_err(|e| {
                tracing::debug!("rejecting body: {e}");
                AppError::InvalidBody
            }),
        }
    }
}

/// Per-invocation metadata. Handlers only log it.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub request_id: Option<String>,
}

impl Context {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Self { request_id }
    }
}

/// An HTTP response as handed back to the trigger.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

impl ApiResponse {
    /// A JSON response with the standard headers.
    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);
        Self { status_code: status.as_u16(), headers, is_base64_encoded: false, body: body.to_string() }
    }

    /// An empty CORS preflight response.
    pub fn preflight(allow_methods: &str, allow_headers: &str) -> Self {
        let headers = BTreeMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ("Access-Control-Allow-Methods".to_string(), allow_methods.to_string()),
            ("Access-Control-Allow-Headers".to_string(), allow_headers.to_string()),
            ("Access-Control-Max-Age".to_string(), "86400".to_string()),
        ]);
        Self { status_code: StatusCode::OK.as_u16(), headers, is_base64_encoded: false, body: String::new() }
    }
}

impl From<AppError> for ApiResponse {
    fn from(e: AppError) -> Self {
        ApiResponse::json(e.status(), &serde_json::json!({"error": e.message()}))
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers = response.headers_mut();
        headers.remove(header::CONTENT_TYPE);
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("dropping invalid header {name:?}"),
            }
        }
        response
    }
}
