//! Replayable request description
//!
//! `reqwest::RequestBuilder` cannot be re-sent after a 401, so requests
//! are described by [`ApiRequest`] and turned into a builder on every
//! attempt.

use super::ClientError;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, multipart};
use serde::Serialize;
use serde_json::Value;

/// Request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

/// A request as seen by the interceptor pipeline
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, or an absolute URL
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Send cookies. `None` uses the client default.
    pub with_credentials: Option<bool>,
    retried: bool,
    sent_token: Option<String>,
}

impl ApiRequest {
    /// Create a request with an empty body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            with_credentials: None,
            retried: false,
            sent_token: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a multipart body
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Add a header. Invalid names or values are rejected.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Configuration(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Configuration(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Opt in or out of sending cookies
    #[must_use]
    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = Some(enabled);
        self
    }

    /// Whether this request already went through a refresh
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) const fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Access token the request was last sent with
    pub(crate) fn sent_token(&self) -> Option<&str> {
        self.sent_token.as_deref()
    }

    /// Attach `Authorization: Bearer <token>`
    pub(crate) fn set_bearer(&mut self, token: &str) {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
                self.sent_token = Some(token.to_string());
            }
            Err(_) => {
                tracing::warn!("Access token contains characters not allowed in a header");
                self.clear_bearer();
            }
        }
    }

    pub(crate) fn clear_bearer(&mut self) {
        self.headers.remove(AUTHORIZATION);
        self.sent_token = None;
    }
}

/// Multipart body that can be rebuilt for every attempt
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    value: PartValue,
}

#[derive(Debug, Clone)]
enum PartValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime: Option<String>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    /// Append a file field
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::File {
                bytes,
                file_name: file_name.into(),
                mime,
            },
        });
        self
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }

    /// Text value of a field
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            PartValue::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub(crate) fn to_form(&self) -> Result<multipart::Form, ClientError> {
        let mut form = multipart::Form::new();
        for part in &self.parts {
            form = match &part.value {
                PartValue::Text(value) => form.text(part.name.clone(), value.clone()),
                PartValue::File {
                    bytes,
                    file_name,
                    mime,
                } => {
                    let mut file = multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}
