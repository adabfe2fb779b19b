//! Core types for the courier HTTP client.
//!
//! This crate provides the foundational pieces used by courier:
//! - [`RequestConfig`] - per-request configuration, shared by defaults and call sites
//! - [`merge_config`] - combining defaults with call-site configuration
//! - [`InterceptorManager`] and [`Interceptors`] - ordered interceptor registries
//! - [`CancelToken`] - one-shot, shareable cancellation signal
//! - [`Request`], [`RawResponse`] and [`Transport`] - the transport boundary
//! - [`Response`] - decoded response handed to interceptors and callers
//! - [`Error`] and [`Result`] - error handling
//! - [`Method`], [`Body`] and [`ResponseType`] - payload vocabulary
//! - [`build_url`], [`flatten_headers`], [`process_headers`] - request codecs

mod address;
mod body;
mod cancel;
mod config;
mod error;
mod headers;
mod interceptor;
mod merge;
mod method;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use address::{build_url, combine_url, is_absolute_url, resolve_url, serialize_params};
pub use body::{Body, ContentType, ResponseType, decode_body, encode_body, from_json, to_json};
pub use cancel::{Cancel, CancelToken, CancelTokenSource, Canceler, DEFAULT_CANCEL_MESSAGE};
pub use config::{
    BasicAuth, COMMON_HEADERS, Headers, Params, ParamsSerializer, Progress, ProgressHandler,
    RequestConfig, StatusValidator,
};
pub use error::{CODE_CANCELED, CODE_NETWORK, CODE_TIMEOUT, Error, Result, TransportError};
pub use headers::{
    AUTHORIZATION, CONTENT_TYPE, apply_basic_auth, flatten_headers, insert_header,
    normalize_header_name, process_headers, take_header, to_header_pairs,
};
pub use interceptor::{HandlerFuture, Interceptor, InterceptorId, InterceptorManager, Interceptors};
pub use merge::{deep_merge, merge_config};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{RawResponse, Response};
pub use transport::Transport;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
