//! Shared HTTP plumbing for the CRM adapters
//!
//! Both CRMs speak JSON over HTTPS. This module owns the pooled
//! `reqwest::Client`, authentication, and the translation of HTTP failures
//! into `PortError`:
//!
//! - 401/403 -> `PortError::Unauthorized`
//! - other non-2xx -> `PortError::Remote` with a normalized message
//! - timeouts -> `PortError::Timeout`
//! - no response -> `PortError::Connection`
//! - undecodable success bodies -> `PortError::Transformation`
//!
//! There is deliberately no retry loop here.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use core_kernel::PortError;

/// How requests authenticate against the CRM
#[derive(Clone)]
pub enum CrmAuth {
    /// `Authorization: Bearer <token>` (HubSpot private apps)
    Bearer(String),
    /// HTTP Basic with the API key as user name and no password (Close.com)
    BasicApiKey(String),
}

impl fmt::Debug for CrmAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrmAuth::Bearer(_) => f.write_str("Bearer(***)"),
            CrmAuth::BasicApiKey(_) => f.write_str("BasicApiKey(***)"),
        }
    }
}

/// JSON client bound to one CRM's base URL and credentials
#[derive(Debug, Clone)]
pub struct CrmHttpClient {
    service: &'static str,
    base_url: String,
    auth: CrmAuth,
    client: reqwest::Client,
}

impl CrmHttpClient {
    /// Builds a client with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `PortError::Internal` if the TLS backend cannot be initialized.
    pub fn new(
        service: &'static str,
        base_url: impl Into<String>,
        auth: CrmAuth,
        timeout: Duration,
    ) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lead-intake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PortError::internal_caused_by(format!("failed to build {} HTTP client", service), e)
            })?;

        Ok(Self {
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            client,
        })
    }

    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, PortError> {
        let request = self.request(Method::GET, path).query(query);
        self.send(request, Method::GET, path).await
    }

    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, PortError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.send(request, Method::POST, path).await
    }

    pub async fn put<T, R>(&self, path: &str, body: &T) -> Result<R, PortError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path).json(body);
        self.send(request, Method::PUT, path).await
    }

    pub async fn patch<T, R>(&self, path: &str, body: &T) -> Result<R, PortError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path).json(body);
        self.send(request, Method::PATCH, path).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.auth {
            CrmAuth::Bearer(token) => request.bearer_auth(token),
            CrmAuth::BasicApiKey(key) => request.basic_auth(key, None::<&str>),
        }
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<R, PortError> {
        let started = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e, &method, path, started))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, &method, path, started))?;

        debug!(
            service = self.service,
            method = %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "CRM request completed"
        );

        if !status.is_success() {
            let message = normalize_error_body(status.as_u16(), &body);
            return Err(match status.as_u16() {
                401 | 403 => PortError::unauthorized(format!("{}: {}", self.service, message)),
                code => PortError::remote(self.service, code, message),
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            PortError::transformation(format!(
                "unexpected {} response to {} {}: {}",
                self.service, method, path, e
            ))
        })
    }

    fn transport_error(
        &self,
        error: reqwest::Error,
        method: &Method,
        path: &str,
        started: Instant,
    ) -> PortError {
        if error.is_timeout() {
            return PortError::timeout(
                format!("{} {} {}", self.service, method, path),
                started.elapsed(),
            );
        }
        if error.is_connect() || error.is_request() {
            return PortError::connection_caused_by(
                format!("No response received from {} API", self.service),
                error,
            );
        }
        PortError::internal_caused_by(format!("{} request failed: {}", self.service, error), error)
    }
}

/// Reduces a CRM error body to the most specific message available
///
/// Precedence: field-level validation errors, then the general error list or
/// top-level message, then the HTTP status.
///
/// ```rust
/// use domain_lead::adapters::http::normalize_error_body;
///
/// let body = r#"{"errors": [], "field-errors": {"name": "This field is required."}}"#;
/// assert_eq!(
///     normalize_error_body(400, body),
///     "Validation Error: name: This field is required."
/// );
/// assert_eq!(normalize_error_body(502, "<html>Bad Gateway</html>"), "HTTP Error 502");
/// ```
pub fn normalize_error_body(status: u16, body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return format!("HTTP Error {}", status);
    };

    if let Some(fields) = field_errors(&value) {
        return format!("Validation Error: {}", fields);
    }
    if let Some(errors) = general_errors(&value) {
        return format!("API Error: {}", errors);
    }
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP Error {}", status))
}

/// Close.com `field-errors` objects, or HubSpot `errors[]` entries that name a property
fn field_errors(value: &Value) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(fields) = value.get("field-errors").and_then(Value::as_object) {
        for (field, errors) in fields {
            parts.push(format!("{}: {}", field, flatten_messages(errors)));
        }
    }

    if let Some(errors) = value.get("errors").and_then(Value::as_array) {
        for error in errors {
            let properties = error
                .pointer("/context/propertyName")
                .and_then(Value::as_array);
            let message = error.get("message").and_then(Value::as_str);
            if let (Some(properties), Some(message)) = (properties, message) {
                for property in properties.iter().filter_map(Value::as_str) {
                    parts.push(format!("{}: {}", property, message));
                }
            }
        }
    }

    (!parts.is_empty()).then(|| parts.join("; "))
}

fn general_errors(value: &Value) -> Option<String> {
    let errors = value.get("errors").and_then(Value::as_array)?;
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|error| match error {
            Value::String(s) => Some(s.clone()),
            other => other.get("message").and_then(Value::as_str).map(str::to_string),
        })
        .filter(|msg| !msg.trim().is_empty())
        .collect();

    (!messages.is_empty()).then(|| messages.join(", "))
}

fn flatten_messages(errors: &Value) -> String {
    match errors {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
