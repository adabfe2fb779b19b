//! Transport-level request.
//!
//! A [`Request`] is what a [`Transport`](crate::Transport) receives once the dispatcher has
//! resolved the address, flattened headers and encoded the body. It is also attached to
//! responses and errors for introspection.
//!
//! ```
//! use courier_core::{Method, Request};
//!
//! let address = url::Url::parse("https://files.example.org/archive").unwrap();
//! let request = Request::builder(Method::Head, address)
//!     .query("rev", "3")
//!     .build();
//! assert_eq!(request.url().query(), Some("rev=3"));
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::{Method, ProgressHandler};

/// A finalized HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    with_credentials: bool,
    on_upload_progress: Option<ProgressHandler>,
    on_download_progress: Option<ProgressHandler>,
}

impl Request {
    /// Start a [`RequestBuilder`] for `method` on `url`.
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Verb sent on the wire.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Fully resolved address, query string included.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Wire headers, already flattened and normalized.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Encoded request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Whether ambient credentials should be sent.
    #[must_use]
    pub const fn with_credentials(&self) -> bool {
        self.with_credentials
    }

    /// Upload progress callback.
    #[must_use]
    pub const fn on_upload_progress(&self) -> Option<&ProgressHandler> {
        self.on_upload_progress.as_ref()
    }

    /// Download progress callback.
    #[must_use]
    pub const fn on_download_progress(&self) -> Option<&ProgressHandler> {
        self.on_download_progress.as_ref()
    }

    /// Split into the pieces a transport sends: verb, address, headers and payload.
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Assembles a [`Request`] piece by piece.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Empty request: no headers, no payload, credentials off.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            request: Request {
                method,
                url,
                headers: HashMap::new(),
                body: None,
                with_credentials: false,
                on_upload_progress: None,
                on_download_progress: None,
            },
        }
    }

    /// Insert one wire header, replacing a previous value under the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name.into(), value.into());
        self
    }

    /// Insert every `(name, value)` pair.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request.headers.extend(headers);
        self
    }

    /// Append `name=value` to the query string.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.request.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Attach the encoded payload.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Ask the transport to send ambient credentials.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.request.with_credentials = with_credentials;
        self
    }

    /// Callback for bytes sent.
    #[must_use]
    pub fn on_upload_progress(mut self, handler: Option<ProgressHandler>) -> Self {
        self.request.on_upload_progress = handler;
        self
    }

    /// Callback for bytes received.
    #[must_use]
    pub fn on_download_progress(mut self, handler: Option<ProgressHandler>) -> Self {
        self.request.on_download_progress = handler;
        self
    }

    /// Finish the request.
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(raw: &str) -> url::Url {
        url::Url::parse(raw).expect("address")
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = Request::builder(Method::Options, address("http://localhost:8080/ping"))
            .header("X-Trace", "t-1")
            .headers([("Accept".to_string(), "*/*".to_string())])
            .build();

        assert_eq!(request.method(), Method::Options);
        assert_eq!(request.header("x-trace"), Some("t-1"));
        assert_eq!(request.header("ACCEPT"), Some("*/*"));
        assert_eq!(request.headers().len(), 2);
        assert!(request.body().is_none());
        assert!(!request.with_credentials());
    }

    #[test]
    fn query_pairs_are_encoded() {
        let request = Request::builder(Method::Get, address("http://localhost/find"))
            .query("q", "a b")
            .query("tag", "x&y")
            .build();

        assert_eq!(request.url().query(), Some("q=a+b&tag=x%26y"));
    }

    #[test]
    fn parts_carry_payload() {
        let payload = Bytes::from_static(b"line one\n");
        let request = Request::builder(Method::Put, address("http://localhost/log"))
            .body(payload.clone())
            .with_credentials(true)
            .build();

        assert!(request.with_credentials());
        assert!(request.on_upload_progress().is_none());

        let (method, url, headers, body) = request.into_parts();
        assert_eq!(method, Method::Put);
        assert_eq!(url.path(), "/log");
        assert!(headers.is_empty());
        assert_eq!(body, Some(payload));
    }
}
