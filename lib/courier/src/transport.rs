//! HTTP transport implementation using hyper-util.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use crate::{
    Progress, ProgressHandler, RawResponse, Request, Transport, TransportConfig, TransportError,
    connector::https_connector,
};

/// Request body handed to the connection pool.
type OutgoingBody = BoxBody<Bytes, Infallible>;

/// Future type for the tower [`Service`] implementation.
pub type TransportFuture =
    Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'static>>;

/// [`Transport`] backed by a pooled hyper-util client with rustls.
///
/// Cloning is cheap and clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use courier::{Client, HyperTransport, TransportConfig};
/// use std::time::Duration;
///
/// let transport = HyperTransport::with_config(
///     TransportConfig::builder()
///         .connect_timeout(Duration::from_secs(2))
///         .build(),
/// );
/// let client = Client::with_transport(transport);
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, OutgoingBody>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    /// Create a transport with default connection settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom connection settings.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Connection settings.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build a hyper request whose body reports upload progress as the connection reads it.
    fn build_hyper_request(
        request: Request,
    ) -> Result<http::Request<OutgoingBody>, TransportError> {
        let on_upload = request.on_upload_progress().cloned();
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(Self::outgoing_body(body.unwrap_or_default(), on_upload))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    /// Wrap the payload, reporting each frame as it is pulled by the connection.
    ///
    /// An empty payload yields no frame, so no upload progress is reported for it.
    fn outgoing_body(payload: Bytes, on_upload: Option<ProgressHandler>) -> OutgoingBody {
        let total = u64::try_from(payload.len()).unwrap_or(u64::MAX);
        let body = Full::new(payload);
        let Some(on_upload) = on_upload else {
            return body.boxed();
        };

        let mut loaded = 0_u64;
        body.map_frame(move |frame| {
            if let Some(data) = frame.data_ref() {
                loaded = loaded.saturating_add(u64::try_from(data.len()).unwrap_or(u64::MAX));
                on_upload.report(Progress {
                    loaded,
                    total: Some(total),
                });
            }
            frame
        })
        .boxed()
    }

    /// Extract response headers, one entry per name.
    ///
    /// Repeated values are joined with `, `; `set-cookie` values are joined with a newline
    /// since cookie attributes may contain commas.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .keys()
            .filter_map(|name| {
                let separator = if *name == http::header::SET_COOKIE {
                    "\n"
                } else {
                    ", "
                };
                let values: Vec<&str> = headers
                    .get_all(name)
                    .iter()
                    .filter_map(|value| value.to_str().ok())
                    .collect();
                (!values.is_empty()).then(|| (name.to_string(), values.join(separator)))
            })
            .collect()
    }

    fn content_length(headers: &http::HeaderMap) -> Option<u64> {
        headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    }

    async fn exchange(&self, request: Request) -> Result<RawResponse, TransportError> {
        let on_download = request.on_download_progress().cloned();
        let hyper_request = Self::build_hyper_request(request)?;

        let response = self
            .inner
            .request(hyper_request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());
        let total = Self::content_length(response.headers());
        let body = Self::read_body(response.into_body(), total, on_download.as_ref()).await?;

        Ok(RawResponse::new(status, response_headers, body))
    }

    /// Collect the body frame by frame, reporting download progress after each one.
    async fn read_body<B>(
        mut body: B,
        total: Option<u64>,
        on_download: Option<&ProgressHandler>,
    ) -> Result<Bytes, TransportError>
    where
        B: BodyExt<Data = Bytes> + Unpin,
        B::Error: std::fmt::Display,
    {
        let mut buffer = BytesMut::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| TransportError::body(e.to_string()))?;
            let Ok(data) = frame.into_data() else {
                continue;
            };
            buffer.extend_from_slice(&data);
            if let Some(on_download) = on_download {
                on_download.report(Progress {
                    loaded: u64::try_from(buffer.len()).unwrap_or(u64::MAX),
                    total,
                });
            }
        }
        Ok(buffer.freeze())
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> TransportError {
        let msg = source_chain(&err);

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return TransportError::tls(msg);
        }

        TransportError::connection(msg)
    }
}

/// Render an error followed by its causes, `: `-separated.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut causes = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}

impl Transport for HyperTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse, TransportError> {
        self.exchange(request).await
    }
}

impl Service<Request> for HyperTransport {
    type Response = RawResponse;
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.exchange(request).await })
    }
}
