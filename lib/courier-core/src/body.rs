//! Request and response payloads.
//!
//! [`Body`] is the payload carried by a [`RequestConfig`](crate::RequestConfig) and a
//! [`Response`](crate::Response). [`encode_body`] turns it into wire bytes, and
//! [`decode_body`] turns received bytes back into a [`Body`] according to a [`ResponseType`].

use bytes::Bytes;
use serde_json::Value;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type, with an explicit UTF-8 charset.
    Json,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json;charset=utf-8",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request or response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured value, serialized as JSON on the wire.
    Json(Value),
    /// Text, sent verbatim.
    Text(String),
    /// Raw bytes, sent verbatim.
    Bytes(Bytes),
}

impl Body {
    /// Build a JSON body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// The JSON value, if this is a JSON body.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes, if this is a binary body.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Content type implied by the payload kind.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::Json(_) => ContentType::Json,
            Self::Text(_) => ContentType::PlainText,
            Self::Bytes(_) => ContentType::OctetStream,
        }
    }

    /// Deserialize the payload into `T`.
    ///
    /// JSON bodies are converted directly; text and byte bodies are parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Json(value) => serde_path_to_error::deserialize(value).map_err(|e| {
                crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
            }),
            Self::Text(text) => from_json(text.as_bytes()),
            Self::Bytes(bytes) => from_json(bytes),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// How a received payload should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// Parse as JSON, falling back to text when the payload is not valid JSON.
    #[default]
    Json,
    /// Keep as text (invalid UTF-8 falls back to raw bytes).
    Text,
    /// Keep the raw bytes.
    Bytes,
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` to provide detailed error messages that include
/// the exact path to the field that failed to deserialize.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Encode an outgoing payload into wire bytes.
///
/// # Errors
///
/// Returns an error if a JSON payload cannot be serialized.
pub fn encode_body(body: &Body) -> Result<Bytes> {
    match body {
        Body::Json(value) => to_json(value),
        Body::Text(text) => Ok(Bytes::from(text.clone())),
        Body::Bytes(bytes) => Ok(bytes.clone()),
    }
}

/// Decode received bytes according to the expected [`ResponseType`].
#[must_use]
pub fn decode_body(bytes: Bytes, response_type: ResponseType) -> Body {
    match response_type {
        ResponseType::Bytes => Body::Bytes(bytes),
        ResponseType::Text => into_text(bytes),
        ResponseType::Json => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Body::Json(value),
            Err(_) => into_text(bytes),
        },
    }
}

fn into_text(bytes: Bytes) -> Body {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Body::Text(text),
        Err(_) => Body::Bytes(bytes),
    }
}
