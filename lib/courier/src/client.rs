//! Client facade.
//!
//! A [`Client`] owns instance defaults, its interceptor registries and a transport. Every
//! call merges the call-site configuration over the defaults and hands the result to
//! [`dispatch`](fn@crate::dispatch).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::{
    Body, COMMON_HEADERS, HyperTransport, InterceptorId, Interceptors, Method, RequestConfig,
    Response, Result, Transport, TransportConfig, TransportConfigBuilder, build_url, dispatch,
    merge_config, resolve_url,
};

/// HTTP client with interceptors, cancellation and configuration merging.
///
/// Clones share defaults, interceptors and transport. Use [`Client::create`] for an
/// independent instance.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, RequestConfig};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .timeout(Duration::from_secs(10))
///     .build();
///
/// client.interceptors().request.register(|config| async move {
///     Ok(config.with_header("X-Trace", "on"))
/// });
///
/// let response = client.get("/users/42", None).await?;
/// let user: User = response.json()?;
/// ```
pub struct Client<T = HyperTransport> {
    transport: Arc<T>,
    defaults: Arc<RequestConfig>,
    interceptors: Arc<Interceptors>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            defaults: Arc::clone(&self.defaults),
            interceptors: Arc::clone(&self.interceptors),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over a [`HyperTransport`] with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over `transport` with [`RequestConfig::defaults`].
    pub fn with_transport(transport: T) -> Self {
        Self::from_parts(Arc::new(transport), RequestConfig::defaults())
    }

    fn from_parts(transport: Arc<T>, defaults: RequestConfig) -> Self {
        Self {
            transport,
            defaults: Arc::new(defaults),
            interceptors: Arc::new(Interceptors::default()),
        }
    }

    /// Replace the instance defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    /// Instance defaults merged under every call.
    #[must_use]
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    /// Request and response interceptor registries.
    #[must_use]
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create an independent client.
    ///
    /// The new client's defaults are `config` merged over this client's defaults. It
    /// shares the transport (and its connection pool) but starts with no interceptors.
    #[must_use]
    pub fn create(&self, config: RequestConfig) -> Self {
        Self::from_parts(
            Arc::clone(&self.transport),
            merge_config(&self.defaults, &config),
        )
    }

    /// Dispatch a request.
    ///
    /// Accepts a full [`RequestConfig`], an address (`&str`/`String`), or an
    /// `(address, config)` pair.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn request(&self, config: impl Into<RequestConfig>) -> Result<Response> {
        let config = merge_config(&self.defaults, &config.into());
        dispatch(
            self.transport.as_ref(),
            config,
            &self.interceptors.request,
            &self.interceptors.response,
        )
        .await
    }

    /// Resolve the address a request would be sent to, without dispatching it.
    ///
    /// Base address, address and parameters are combined the same way as for a dispatch.
    #[must_use]
    pub fn get_uri(&self, config: Option<RequestConfig>) -> String {
        let config = merge_config(&self.defaults, &config.unwrap_or_default());
        let full_path = resolve_url(
            config.base_url.as_deref(),
            config.url.as_deref().unwrap_or_default(),
        );
        let uri = build_url(
            &full_path,
            config.params.as_ref(),
            config.params_serializer.as_ref(),
        );
        match uri.strip_prefix('?') {
            Some(query) => query.to_string(),
            None => uri,
        }
    }

    async fn request_without_body(
        &self,
        method: Method,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        let config = config
            .unwrap_or_default()
            .with_method(method)
            .with_url(url);
        self.request(config).await
    }

    async fn request_with_body(
        &self,
        method: Method,
        url: &str,
        data: Option<Body>,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        let mut config = config
            .unwrap_or_default()
            .with_method(method)
            .with_url(url);
        if let Some(data) = data {
            config.data = Some(data);
        }
        self.request(config).await
    }

    /// `GET` request.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn get(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.request_without_body(Method::Get, url, config).await
    }

    /// `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn delete(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.request_without_body(Method::Delete, url, config).await
    }

    /// `HEAD` request.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn head(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.request_without_body(Method::Head, url, config).await
    }

    /// `OPTIONS` request.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn options(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.request_without_body(Method::Options, url, config).await
    }

    /// `POST` request; `data` replaces any body set in `config`.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn post(
        &self,
        url: &str,
        data: Option<Body>,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        self.request_with_body(Method::Post, url, data, config).await
    }

    /// `PUT` request; `data` replaces any body set in `config`.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn put(
        &self,
        url: &str,
        data: Option<Body>,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        self.request_with_body(Method::Put, url, data, config).await
    }

    /// `PATCH` request; `data` replaces any body set in `config`.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](fn@crate::dispatch).
    pub async fn patch(
        &self,
        url: &str,
        data: Option<Body>,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        self.request_with_body(Method::Patch, url, data, config).await
    }

    /// Register a request interceptor; shorthand for `interceptors().request.register`.
    pub fn intercept_request<F, Fut>(&self, on_fulfilled: F) -> InterceptorId
    where
        F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RequestConfig>> + Send + 'static,
    {
        let id = self.interceptors.request.register(on_fulfilled);
        debug!(?id, "request interceptor registered");
        id
    }

    /// Register a response interceptor; shorthand for `interceptors().response.register`.
    pub fn intercept_response<F, Fut>(&self, on_fulfilled: F) -> InterceptorId
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        let id = self.interceptors.response.register(on_fulfilled);
        debug!(?id, "response interceptor registered");
        id
    }
}

/// Builder for [`Client`].
///
/// # Example
///
/// ```ignore
/// use courier::Client;
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .header("Authorization", "Bearer token")
///     .timeout(Duration::from_secs(30))
///     .connect_timeout(Duration::from_secs(5))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    defaults: RequestConfig,
    transport: TransportConfigBuilder,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            defaults: RequestConfig::defaults(),
            transport: TransportConfig::builder(),
        }
    }
}

impl ClientBuilder {
    /// Set the base address.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.defaults.base_url = Some(base_url.into());
        self
    }

    /// Set the default request timeout; zero means unbounded.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    /// Add a header sent with every method.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults = self.defaults.with_group_header(COMMON_HEADERS, name, value);
        self
    }

    /// Merge `config` over the defaults collected so far.
    #[must_use]
    pub fn defaults(mut self, config: &RequestConfig) -> Self {
        self.defaults = merge_config(&self.defaults, config);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.transport = self.transport.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.pool_idle_timeout(timeout);
        self
    }

    /// Build a client over a [`HyperTransport`].
    #[must_use]
    pub fn build(self) -> Client {
        let transport = HyperTransport::with_config(self.transport.build());
        Client::from_parts(Arc::new(transport), self.defaults)
    }

    /// Build a client over a custom transport; connection settings are ignored.
    pub fn build_with<T: Transport>(self, transport: T) -> Client<T> {
        Client::from_parts(Arc::new(transport), self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::{RawResponse, Request, TransportError};

    struct Echo;

    impl Transport for Echo {
        async fn execute(
            &self,
            request: Request,
        ) -> std::result::Result<RawResponse, TransportError> {
            let body = json!({
                "method": request.method().to_string(),
                "url": request.url().as_str(),
                "headers": request.headers(),
            });
            Ok(RawResponse::new(200, HashMap::new(), Bytes::from(body.to_string())))
        }
    }

    fn client() -> Client<Echo> {
        Client::builder()
            .base_url("https://api.test")
            .header("X-Client", "courier")
            .build_with(Echo)
    }

    #[test]
    fn builder_defaults() {
        let client = client();
        assert_eq!(client.defaults().method, Some(Method::Get));
        assert_eq!(client.defaults().base_url.as_deref(), Some("https://api.test"));
        let common = client
            .defaults()
            .headers
            .as_ref()
            .and_then(|headers| headers.get(COMMON_HEADERS));
        assert_eq!(
            common,
            Some(&json!({
                "Accept": "application/json, text/plain, */*",
                "X-Client": "courier",
            }))
        );
    }

    #[test]
    fn get_uri_resolves_without_dispatch() {
        let client = client();
        let uri = client.get_uri(Some(
            RequestConfig::new()
                .with_url("/users")
                .with_param("q", "a b"),
        ));
        assert_eq!(uri, "https://api.test/users?q=a+b");
    }

    #[test]
    fn get_uri_trims_leading_question_mark() {
        let client = Client::with_transport(Echo);
        let uri = client.get_uri(Some(RequestConfig::new().with_param("page", 1)));
        assert_eq!(uri, "page=1");
    }

    #[tokio::test]
    async fn verb_overrides_config_method() {
        let client = client();
        let response = client
            .delete("/items/1", Some(RequestConfig::new().with_method(Method::Post)))
            .await
            .expect("response");

        assert_eq!(response.data().as_json().and_then(|v| v.get("method")), Some(&json!("DELETE")));
        assert_eq!(
            response.data().as_json().and_then(|v| v.get("url")),
            Some(&json!("https://api.test/items/1"))
        );
    }

    #[tokio::test]
    async fn request_accepts_url_and_config_pair() {
        let client = client();
        let response = client
            .request(("/pair", RequestConfig::new().with_header("X-Call", "1")))
            .await
            .expect("response");

        assert_eq!(response.request().url().path(), "/pair");
        assert_eq!(response.request().header("x-call"), Some("1"));
        assert_eq!(response.request().header("x-client"), Some("courier"));
    }

    #[tokio::test]
    async fn create_shares_no_interceptors() {
        let parent = client();
        parent.intercept_request(|config| async move { Ok(config.with_header("X-Parent", "1")) });

        let child = parent.create(RequestConfig::new().with_timeout(Duration::from_secs(1)));
        assert!(child.interceptors().request.is_empty());
        assert_eq!(child.defaults().timeout, Some(Duration::from_secs(1)));
        assert_eq!(child.defaults().base_url.as_deref(), Some("https://api.test"));

        let response = child.get("/child", None).await.expect("response");
        assert_eq!(response.request().header("x-parent"), None);

        let response = parent.get("/parent", None).await.expect("response");
        assert_eq!(response.request().header("x-parent"), Some("1"));
    }

    #[tokio::test]
    async fn clones_share_interceptors() {
        let client = client();
        let clone = client.clone();
        clone.intercept_response(|response| async move { Ok(response) });
        assert_eq!(client.interceptors().response.len(), 1);
    }
}
