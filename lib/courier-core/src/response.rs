//! HTTP responses.
//!
//! [`RawResponse`] is what a [`Transport`](crate::Transport) produces: status, headers and
//! undecoded bytes. [`Response`] is what callers and response interceptors see: the
//! decoded [`Body`] plus the configuration and request that produced it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use bytes::Bytes;

use crate::{Body, Request, RequestConfig};

/// Undecoded response as produced by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    status_text: String,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl RawResponse {
    /// Creates a new raw response.
    ///
    /// Header names are lower-cased; values under names differing only in case are
    /// joined with `, `.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            headers: lower_case_names(headers),
            body,
        }
    }

    /// Override the status text.
    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status text.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into (status, status text, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, String, HashMap<String, String>, Bytes) {
        (self.status, self.status_text, self.headers, self.body)
    }
}

fn lower_case_names(headers: HashMap<String, String>) -> HashMap<String, String> {
    let mut lowered = HashMap::with_capacity(headers.len());
    for (name, value) in headers {
        match lowered.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(mut joined) => {
                let joined: &mut String = joined.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    lowered
}

/// Decoded response handed to response interceptors and callers.
#[derive(Debug, Clone)]
pub struct Response {
    data: Body,
    status: u16,
    status_text: String,
    headers: HashMap<String, String>,
    config: RequestConfig,
    request: Request,
}

impl Response {
    /// Assemble a response from its parts.
    #[must_use]
    pub fn new(
        data: Body,
        status: u16,
        status_text: impl Into<String>,
        headers: HashMap<String, String>,
        config: RequestConfig,
        request: Request,
    ) -> Self {
        Self {
            data,
            status,
            status_text: status_text.into(),
            headers,
            config,
            request,
        }
    }

    /// Decoded payload.
    #[must_use]
    pub const fn data(&self) -> &Body {
        &self.data
    }

    /// Mutable access to the payload.
    #[must_use]
    pub fn data_mut(&mut self) -> &mut Body {
        &mut self.data
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status text.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers.
    ///
    /// Names from the transport are lower-case; interceptors may insert other spellings.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Configuration the request was dispatched with.
    #[must_use]
    pub const fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// The request sent by the transport.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Deserialize the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        self.data.deserialize()
    }

    /// Consume into the payload.
    #[must_use]
    pub fn into_data(self) -> Body {
        self.data
    }
}
