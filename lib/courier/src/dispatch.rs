//! Request dispatching.
//!
//! One dispatch runs a strictly sequential chain:
//!
//! ```text
//! request interceptors ─▶ transport call ─▶ response interceptors
//! ```
//!
//! Request interceptors run in registration order on the merged [`RequestConfig`], the
//! transport call turns the final configuration into a [`Response`], and response
//! interceptors run in registration order on that response. A failing step skips the
//! fulfilled handlers downstream until a rejected handler recovers it.
//!
//! The transport call races the exchange against the request's cancel token and timeout.
//! The first to finish settles the request and the others are dropped, which aborts an
//! in-flight exchange.

use std::time::{Duration, Instant};

use courier_core::{
    apply_basic_auth, decode_body, encode_body, flatten_headers, process_headers,
    to_header_pairs,
};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{
    Cancel, CancelToken, Error, Interceptor, InterceptorManager, RawResponse, Request,
    RequestConfig, Response, Result, Transport, TransportError, build_url, resolve_url,
};

/// Live interceptors captured when a dispatch starts.
struct Chain {
    request: Vec<Interceptor<RequestConfig>>,
    response: Vec<Interceptor<Response>>,
}

impl Chain {
    /// Snapshot both registries; later registrations only affect later dispatches.
    fn assemble(
        request_interceptors: &InterceptorManager<RequestConfig>,
        response_interceptors: &InterceptorManager<Response>,
    ) -> Self {
        let mut request = Vec::new();
        request_interceptors.for_each(|interceptor| request.push(interceptor.clone()));

        let mut response = Vec::new();
        response_interceptors.for_each(|interceptor| response.push(interceptor.clone()));

        Self { request, response }
    }

    async fn run<T: Transport>(self, transport: &T, config: RequestConfig) -> Result<Response> {
        let mut config = Ok(config);
        for step in &self.request {
            config = step.apply(config).await;
        }

        let mut response = match config {
            Ok(config) => dispatch_request(transport, config).await,
            Err(error) => Err(error),
        };

        for step in &self.response {
            response = step.apply(response).await;
        }
        response
    }
}

/// Dispatch one request through the interceptor chain and `transport`.
///
/// `config` is expected to be merged already. The interceptor registries are snapshotted
/// before the first step runs.
///
/// # Errors
///
/// Returns the error of the last step, unless a rejected handler recovered from it:
/// - [`Error::Canceled`] if the cancel token fired first (or already had)
/// - [`Error::Timeout`] if the timeout elapsed first
/// - [`Error::Network`] if the transport failed
/// - [`Error::Status`] if the status validator rejected the response
/// - [`Error::InvalidRequest`] / [`Error::InvalidUrl`] if the configuration is unusable
pub async fn dispatch<T: Transport>(
    transport: &T,
    config: RequestConfig,
    request_interceptors: &InterceptorManager<RequestConfig>,
    response_interceptors: &InterceptorManager<Response>,
) -> Result<Response> {
    Chain::assemble(request_interceptors, response_interceptors)
        .run(transport, config)
        .await
}

/// Build the transport request for a fully intercepted configuration.
///
/// # Errors
///
/// Fails when the address is missing or unparsable, or the body cannot be encoded.
pub fn prepare_request(config: &RequestConfig) -> Result<Request> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| Error::invalid_request("request url is required"))?;
    let method = config.method.unwrap_or_default();

    let full_path = resolve_url(config.base_url.as_deref(), url);
    let address = build_url(
        &full_path,
        config.params.as_ref(),
        config.params_serializer.as_ref(),
    );
    let url = url::Url::parse(&address)?;

    let mut headers = config
        .headers
        .as_ref()
        .map(|headers| flatten_headers(headers, method))
        .unwrap_or_default();
    if let Some(auth) = &config.auth {
        apply_basic_auth(&mut headers, auth);
    }
    let headers = process_headers(headers, config.data.as_ref());

    let mut builder = Request::builder(method, url)
        .headers(to_header_pairs(&headers))
        .with_credentials(config.with_credentials.unwrap_or(false))
        .on_upload_progress(config.on_upload_progress.clone())
        .on_download_progress(config.on_download_progress.clone());
    if let Some(data) = &config.data {
        builder = builder.body(encode_body(data)?);
    }
    Ok(builder.build())
}

/// How the transport race settled.
#[derive(Debug)]
enum Settled {
    Exchanged(std::result::Result<RawResponse, TransportError>),
    Canceled(Cancel),
    TimedOut(Duration),
}

/// The core step: pre-flight checks, the transport race and status validation.
async fn dispatch_request<T: Transport>(transport: &T, config: RequestConfig) -> Result<Response> {
    if let Some(token) = &config.cancel_token {
        token.check()?;
    }

    let request = prepare_request(&config)?;
    let method = request.method();
    let url = request.url().to_string();
    let span = span!(Level::INFO, "http_request", %method, %url);

    async move {
        let start = Instant::now();
        info!(method = %method, url = %url, "sending request");

        let settled = race(
            transport.execute(request.clone()),
            config.cancel_token.clone(),
            config.effective_timeout(),
        )
        .await;

        // Saturating conversion to u64 (truncates after ~584 million years)
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let raw = match settled {
            Settled::Exchanged(Ok(raw)) => raw,
            Settled::Exchanged(Err(source)) => {
                warn!(error = %source, elapsed_ms, "request failed");
                return Err(Error::Network {
                    source,
                    config: Box::new(config),
                    request: Box::new(request),
                });
            }
            Settled::Canceled(reason) => {
                debug!(reason = %reason, elapsed_ms, "request canceled");
                return Err(Error::Canceled(reason));
            }
            Settled::TimedOut(timeout) => {
                warn!(elapsed_ms, "request timed out");
                return Err(Error::Timeout {
                    timeout,
                    config: Box::new(config),
                    request: Box::new(request),
                });
            }
        };

        let (status, status_text, headers, body) = raw.into_parts();
        let data = decode_body(body, config.response_type());
        let accepted = config.accepts_status(status);
        let response = Response::new(data, status, status_text, headers, config, request);

        if accepted {
            info!(status, elapsed_ms, "request completed");
            Ok(response)
        } else {
            warn!(status, elapsed_ms, "request failed with HTTP error");
            Err(Error::Status {
                status,
                response: Box::new(response),
            })
        }
    }
    .instrument(span)
    .await
}

/// Race the exchange against cancellation and the timeout.
///
/// An exchange that is ready in the same poll as either signal wins. Losing futures are
/// dropped, so an unfinished exchange is aborted exactly once.
async fn race<F>(exchange: F, token: Option<CancelToken>, timeout: Option<Duration>) -> Settled
where
    F: Future<Output = std::result::Result<RawResponse, TransportError>>,
{
    let canceled = async move {
        match token {
            Some(token) => token.canceled().await,
            None => std::future::pending().await,
        }
    };
    let elapsed = async move {
        match timeout {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                timeout
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        outcome = exchange => Settled::Exchanged(outcome),
        reason = canceled => Settled::Canceled(reason),
        timeout = elapsed => Settled::TimedOut(timeout),
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use serde_json::json;

    use super::*;
    use crate::{Body, Method, RequestConfig};

    #[test]
    fn prepares_full_request() {
        let config = RequestConfig::defaults()
            .with_base_url("https://api.test/v1/")
            .with_url("/users")
            .with_method(Method::Post)
            .with_param("page", 2)
            .with_group_header("post", "X-Verb", "post")
            .with_group_header("get", "X-Verb", "get")
            .with_data(json!({"name": "Ada"}))
            .with_auth("user", "pass");

        let request = prepare_request(&config).expect("request");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.url().as_str(), "https://api.test/v1/users?page=2");
        assert_eq!(request.header("x-verb"), Some("post"));
        assert_eq!(request.header("accept"), Some("application/json, text/plain, */*"));
        assert_eq!(request.header("content-type"), Some("application/json;charset=utf-8"));
        assert_eq!(request.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(
            request.body().map(|b| b.as_ref()),
            Some(&br#"{"name":"Ada"}"#[..])
        );
    }

    #[test]
    fn drops_content_type_without_body() {
        let config = RequestConfig::new()
            .with_url("https://api.test/")
            .with_header("content-type", "application/json");

        let request = prepare_request(&config).expect("request");
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.header("content-type"), None);
        assert!(request.body().is_none());
    }

    #[test]
    fn keeps_explicit_content_type() {
        let config = RequestConfig::new()
            .with_url("https://api.test/")
            .with_method(Method::Put)
            .with_header("content-type", "text/plain")
            .with_data(Body::from("plain"));

        let request = prepare_request(&config).expect("request");
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn requires_url() {
        let_assert!(Err(Error::InvalidRequest(_)) = prepare_request(&RequestConfig::new()));
    }

    #[test]
    fn rejects_relative_url_without_base() {
        let_assert!(
            Err(Error::InvalidUrl(_)) = prepare_request(&RequestConfig::from("/relative"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ready_exchange_wins_ties() {
        let source = CancelToken::source();
        source.cancel.cancel();

        let exchange = std::future::ready(Ok::<_, TransportError>(RawResponse::new(
            200,
            std::collections::HashMap::new(),
            bytes::Bytes::new(),
        )));
        let settled = race(exchange, Some(source.token), Some(Duration::from_millis(1))).await;
        assert!(matches!(settled, Settled::Exchanged(Ok(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_settles_pending_exchange() {
        let exchange = std::future::pending::<std::result::Result<RawResponse, TransportError>>();
        let settled = race(exchange, None, Some(Duration::from_secs(3))).await;
        let_assert!(Settled::TimedOut(timeout) = settled);
        assert_eq!(timeout, Duration::from_secs(3));
    }
}
