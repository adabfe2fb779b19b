//! Everything a transport or interceptor author usually needs.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Body, Cancel, CancelToken, Error, Interceptor, InterceptorId, InterceptorManager, Method,
    RawResponse, Request, RequestConfig, Response, ResponseType, Result, Transport,
    TransportError, merge_config,
};
