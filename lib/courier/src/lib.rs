//! Promise-style HTTP client with interceptors, cancellation and configuration merging.
//!
//! A [`Client`] merges call-site [`RequestConfig`]s over its instance defaults, runs the
//! result through its request interceptors, a [`Transport`] and its response
//! interceptors, and returns a [`Response`] or an [`Error`].
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .base_url("https://api.example.com")
//!     .timeout(Duration::from_secs(5))
//!     .build();
//!
//! let source = CancelToken::source();
//! let config = RequestConfig::new()
//!     .with_param("page", 2)
//!     .with_cancel_token(source.token.clone());
//!
//! match client.get("/users", Some(config)).await {
//!     Ok(response) => println!("{}", response.status()),
//!     Err(err) if courier::is_cancel(&err) => println!("canceled: {err}"),
//!     Err(err) => return Err(err),
//! }
//! ```
//!
//! # Transports
//!
//! [`HyperTransport`] (hyper-util + rustls) is the default. Any [`Transport`]
//! implementation can be plugged in with [`Client::with_transport`], and any tower
//! service stack through [`ServiceTransport`].

mod client;
mod config;
mod connector;
mod dispatch;
mod helpers;
pub mod prelude;
mod service;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use dispatch::{dispatch, prepare_request};
pub use helpers::{Spread, all, is_cancel, spread};
pub use service::ServiceTransport;
pub use transport::{HyperTransport, TransportFuture};

// Re-export tower for service composition
pub use tower;

// Re-export core types
pub use courier_core::{
    BasicAuth, Body, COMMON_HEADERS, Cancel, CancelToken, CancelTokenSource, Canceler,
    ContentType, DEFAULT_CANCEL_MESSAGE, Error, HandlerFuture, Headers, Interceptor,
    InterceptorId, InterceptorManager, Interceptors, Method, Params, ParamsSerializer, Progress,
    ProgressHandler, RawResponse, Request, RequestBuilder, RequestConfig, ResponseType, Response,
    Result, StatusValidator, Transport, TransportError, build_url, combine_url, deep_merge,
    from_json, is_absolute_url, merge_config, resolve_url, to_json,
};
pub use courier_core::{CODE_CANCELED, CODE_NETWORK, CODE_TIMEOUT};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};
