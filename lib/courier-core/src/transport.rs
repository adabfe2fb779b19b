//! Transport trait.
//!
//! A [`Transport`] performs the network exchange for one finalized [`Request`]. It knows
//! nothing about configuration merging, interceptors, timeouts or cancellation: the
//! dispatcher handles those and drops the exchange future to abort it.
//!
//! Implement [`Transport`] directly for custom I/O stacks or test doubles.

use std::future::Future;
use std::sync::Arc;

use crate::{RawResponse, Request, TransportError};

/// Core transport trait.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use bytes::Bytes;
/// use courier_core::{RawResponse, Request, Transport, TransportError};
///
/// struct Echo;
///
/// impl Transport for Echo {
///     async fn execute(&self, request: Request) -> Result<RawResponse, TransportError> {
///         let body = request.body().cloned().unwrap_or_default();
///         Ok(RawResponse::new(200, HashMap::new(), body))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Exchange `request` for a raw response.
    ///
    /// The status code is not interpreted here: any received response is `Ok`.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained:
    /// - Network errors
    /// - TLS errors
    /// - Body read errors
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}
