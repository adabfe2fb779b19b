//! Tower interop.
//!
//! [`ServiceTransport`] lets any tower service stack act as a [`Transport`], so layers such
//! as `tower::limit::ConcurrencyLimitLayer` can sit under the dispatcher.

use tower::{BoxError, ServiceExt};
use tower_service::Service;

use crate::{RawResponse, Request, Transport, TransportError};

/// Adapts a tower [`Service`] into a [`Transport`].
///
/// The service is cloned for each request and driven to readiness before being called.
/// Errors that are not already a [`TransportError`] become [`TransportError::Connection`].
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use bytes::Bytes;
/// use courier::{Client, RawResponse, Request, ServiceTransport, TransportError};
///
/// let service = tower::service_fn(|_request: Request| async {
///     Ok::<_, TransportError>(RawResponse::new(204, HashMap::new(), Bytes::new()))
/// });
/// let client = Client::with_transport(ServiceTransport::new(service));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceTransport<S> {
    service: S,
}

impl<S> ServiceTransport<S> {
    /// Wrap a service.
    pub const fn new(service: S) -> Self {
        Self { service }
    }

    /// The wrapped service.
    pub const fn get_ref(&self) -> &S {
        &self.service
    }

    /// Unwrap the service.
    pub fn into_inner(self) -> S {
        self.service
    }
}

impl<S> Transport for ServiceTransport<S>
where
    S: Service<Request, Response = RawResponse> + Clone + Send + Sync,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    async fn execute(&self, request: Request) -> Result<RawResponse, TransportError> {
        let service = self.service.clone();
        service
            .oneshot(request)
            .await
            .map_err(|error| into_transport_error(error.into()))
    }
}

fn into_transport_error(error: BoxError) -> TransportError {
    match error.downcast::<TransportError>() {
        Ok(error) => *error,
        Err(other) => TransportError::connection(other.to_string()),
    }
}
