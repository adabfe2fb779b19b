//! Request configuration.
//!
//! [`RequestConfig`] describes the intent of one request. The same shape is used for
//! instance defaults and call-site overrides; [`merge_config`](crate::merge_config)
//! combines the two.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::{Body, CancelToken, Method, ResponseType};

/// Query parameters: names mapped to scalars, arrays or nested objects.
pub type Params = Map<String, Value>;

/// Header configuration.
///
/// Leaf values are header values. Nested objects keyed by `common` or by a lower-case
/// method name (`get`, `post`, ...) are header groups, flattened at dispatch time.
pub type Headers = Map<String, Value>;

/// Predicate deciding whether a status code resolves or fails the request.
#[derive(Clone)]
pub struct StatusValidator(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl StatusValidator {
    /// Wrap a predicate.
    pub fn new(validate: impl Fn(u16) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(validate))
    }

    /// Returns `true` if `status` is acceptable.
    #[must_use]
    pub fn is_valid(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl Default for StatusValidator {
    fn default() -> Self {
        Self::new(|status| (200..300).contains(&status))
    }
}

impl std::fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StatusValidator")
    }
}

/// Custom query-string serializer, replacing the built-in encoding.
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    /// Wrap a serializer function.
    pub fn new(serialize: impl Fn(&Params) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(serialize))
    }

    /// Serialize the parameters to a query string (without the leading `?`).
    #[must_use]
    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl std::fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ParamsSerializer")
    }
}

/// Transfer progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes transferred so far.
    pub loaded: u64,
    /// Total bytes, when known.
    pub total: Option<u64>,
}

/// Callback receiving [`Progress`] events.
#[derive(Clone)]
pub struct ProgressHandler(Arc<dyn Fn(Progress) + Send + Sync>);

impl ProgressHandler {
    /// Wrap a callback.
    pub fn new(on_progress: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        Self(Arc::new(on_progress))
    }

    /// Report a progress event.
    pub fn report(&self, progress: Progress) {
        (self.0)(progress);
    }
}

impl std::fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressHandler")
    }
}

/// Username/password pair sent as an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Configuration of a single request.
///
/// Every field is optional; absent means "not defined here". Unknown fields are kept in
/// [`RequestConfig::extra`] and survive merging.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use courier_core::{Method, RequestConfig};
///
/// let config = RequestConfig::new()
///     .with_url("/users")
///     .with_method(Method::Get)
///     .with_param("page", 2)
///     .with_header("X-Trace", "on")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.url.as_deref(), Some("/users"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Target address, absolute or relative to `base_url`.
    pub url: Option<String>,
    /// HTTP verb.
    pub method: Option<Method>,
    /// Base address prepended to relative `url`s.
    pub base_url: Option<String>,
    /// Request body.
    pub data: Option<Body>,
    /// Query parameters.
    pub params: Option<Params>,
    /// Replaces the built-in query-string encoding.
    pub params_serializer: Option<ParamsSerializer>,
    /// Request headers, possibly grouped by method.
    pub headers: Option<Headers>,
    /// How to interpret the response payload.
    pub response_type: Option<ResponseType>,
    /// Request timeout; absent or zero means unbounded.
    pub timeout: Option<Duration>,
    /// Cancellation handle.
    pub cancel_token: Option<CancelToken>,
    /// Whether the transport should send ambient credentials.
    pub with_credentials: Option<bool>,
    /// Basic authentication credentials.
    pub auth: Option<BasicAuth>,
    /// Decides which statuses resolve the request (default: 200..=299).
    pub validate_status: Option<StatusValidator>,
    /// Upload progress callback.
    pub on_upload_progress: Option<ProgressHandler>,
    /// Download progress callback.
    pub on_download_progress: Option<ProgressHandler>,
    /// Fields not known to this crate.
    pub extra: Map<String, Value>,
}

/// Header group holding headers applied to every method.
pub const COMMON_HEADERS: &str = "common";

impl RequestConfig {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance defaults: `GET` verb and a common `Accept` header.
    #[must_use]
    pub fn defaults() -> Self {
        let mut common = Map::new();
        common.insert(
            "Accept".to_string(),
            Value::from("application/json, text/plain, */*"),
        );
        let mut headers = Headers::new();
        headers.insert(COMMON_HEADERS.to_string(), Value::Object(common));

        Self {
            method: Some(Method::Get),
            headers: Some(headers),
            ..Self::default()
        }
    }

    /// Set the target address.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the verb.
    #[must_use]
    pub const fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the base address.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Body>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Add one query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace the query-string serializer.
    #[must_use]
    pub fn with_params_serializer(
        mut self,
        serialize: impl Fn(&Params) -> String + Send + Sync + 'static,
    ) -> Self {
        self.params_serializer = Some(ParamsSerializer::new(serialize));
        self
    }

    /// Add one top-level header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    /// Add one header to a group (`common` or a lower-case method name).
    #[must_use]
    pub fn with_group_header(
        mut self,
        group: &str,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let headers = self.headers.get_or_insert_with(Headers::new);
        let entry = headers
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(group) = entry {
            group.insert(name.into(), value.into());
        }
        self
    }

    /// Set the expected response payload kind.
    #[must_use]
    pub const fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation handle.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Set the credentials mode.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Set basic authentication credentials.
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Replace the status validator.
    #[must_use]
    pub fn with_validate_status(
        mut self,
        validate: impl Fn(u16) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validate_status = Some(StatusValidator::new(validate));
        self
    }

    /// Set the upload progress callback.
    #[must_use]
    pub fn with_upload_progress(
        mut self,
        on_progress: impl Fn(Progress) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_progress = Some(ProgressHandler::new(on_progress));
        self
    }

    /// Set the download progress callback.
    #[must_use]
    pub fn with_download_progress(
        mut self,
        on_progress: impl Fn(Progress) + Send + Sync + 'static,
    ) -> Self {
        self.on_download_progress = Some(ProgressHandler::new(on_progress));
        self
    }

    /// Set an extra, transport-specific field.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Effective response type.
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        self.response_type.unwrap_or_default()
    }

    /// Effective timeout; `None` when unbounded.
    #[must_use]
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    /// Returns `true` if `status` resolves the request under this configuration.
    #[must_use]
    pub fn accepts_status(&self, status: u16) -> bool {
        self.validate_status
            .as_ref()
            .map_or_else(|| StatusValidator::default().is_valid(status), |v| v.is_valid(status))
    }
}

impl From<&str> for RequestConfig {
    fn from(url: &str) -> Self {
        Self::new().with_url(url)
    }
}

impl From<String> for RequestConfig {
    fn from(url: String) -> Self {
        Self::new().with_url(url)
    }
}

impl<S: Into<String>> From<(S, RequestConfig)> for RequestConfig {
    fn from((url, config): (S, RequestConfig)) -> Self {
        config.with_url(url)
    }
}
