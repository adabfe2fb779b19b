//! Interceptor registries.
//!
//! An [`InterceptorManager`] holds (fulfilled, rejected) handler pairs in registration
//! order. Removal leaves a hole instead of shifting entries, so every [`InterceptorId`]
//! stays valid and is never handed out twice.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{Error, RequestConfig, Response, Result};

/// Future returned by interceptor handlers.
pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

type Fulfilled<T> = Arc<dyn Fn(T) -> HandlerFuture<T> + Send + Sync>;
type Rejected<T> = Arc<dyn Fn(Error) -> HandlerFuture<T> + Send + Sync>;

/// Stable handle of a registered interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorId(usize);

/// One step of the dispatch chain.
///
/// `on_fulfilled` transforms the value flowing through the chain. `on_rejected`, when
/// present, receives an upstream error instead and may recover by returning a value.
pub struct Interceptor<T> {
    on_fulfilled: Fulfilled<T>,
    on_rejected: Option<Rejected<T>>,
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            on_fulfilled: Arc::clone(&self.on_fulfilled),
            on_rejected: self.on_rejected.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("on_rejected", &self.on_rejected.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Interceptor<T> {
    /// Interceptor with only a fulfilled handler.
    pub fn new<F, Fut>(on_fulfilled: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            on_fulfilled: Arc::new(move |value| -> HandlerFuture<T> {
                Box::pin(on_fulfilled(value))
            }),
            on_rejected: None,
        }
    }

    /// Add a rejected handler.
    #[must_use]
    pub fn on_rejected<R, RFut>(mut self, on_rejected: R) -> Self
    where
        R: Fn(Error) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<T>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(move |error| -> HandlerFuture<T> {
            Box::pin(on_rejected(error))
        }));
        self
    }

    /// Returns `true` if a rejected handler is set.
    #[must_use]
    pub fn has_rejected_handler(&self) -> bool {
        self.on_rejected.is_some()
    }

    /// Run this step on the upstream outcome.
    ///
    /// A success goes to `on_fulfilled`. A failure goes to `on_rejected` if set and is
    /// passed through unchanged otherwise.
    pub fn apply(&self, input: Result<T>) -> HandlerFuture<T> {
        match input {
            Ok(value) => (self.on_fulfilled)(value),
            Err(error) => match &self.on_rejected {
                Some(on_rejected) => on_rejected(error),
                None => Box::pin(std::future::ready(Err(error))),
            },
        }
    }
}

/// Ordered registry of interceptors.
///
/// # Example
///
/// ```
/// use courier_core::{InterceptorManager, RequestConfig};
///
/// let manager = InterceptorManager::<RequestConfig>::new();
/// let id = manager.register(|config| async move { Ok(config.with_header("X-Trace", "1")) });
/// assert_eq!(manager.len(), 1);
///
/// manager.remove(id);
/// assert!(manager.is_empty());
/// ```
pub struct InterceptorManager<T> {
    entries: Mutex<Vec<Option<Interceptor<T>>>>,
}

impl<T> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T> std::fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("live", &self.len())
            .finish()
    }
}

impl<T> InterceptorManager<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<Interceptor<T>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an interceptor and return its handle.
    pub fn register_interceptor(&self, interceptor: Interceptor<T>) -> InterceptorId {
        let mut entries = self.lock();
        entries.push(Some(interceptor));
        InterceptorId(entries.len() - 1)
    }

    /// Make the interceptor behind `id` inert.
    ///
    /// Removing twice or removing an unknown handle does nothing.
    pub fn remove(&self, id: InterceptorId) {
        if let Some(entry) = self.lock().get_mut(id.0) {
            *entry = None;
        }
    }

    /// Visit live interceptors in registration order.
    ///
    /// The registry is snapshotted first, so `visit` may register or remove entries; those
    /// changes apply to the next visit.
    pub fn for_each(&self, mut visit: impl FnMut(&Interceptor<T>)) {
        let live: Vec<Interceptor<T>> = self.lock().iter().flatten().cloned().collect();
        for interceptor in &live {
            visit(interceptor);
        }
    }

    /// Number of live interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().iter().flatten().count()
    }

    /// Returns `true` if no interceptor is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + 'static> InterceptorManager<T> {
    /// Register a fulfilled handler.
    pub fn register<F, Fut>(&self, on_fulfilled: F) -> InterceptorId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.register_interceptor(Interceptor::new(on_fulfilled))
    }

    /// Register a fulfilled handler together with a rejected handler.
    pub fn register_with_rejection<F, Fut, R, RFut>(
        &self,
        on_fulfilled: F,
        on_rejected: R,
    ) -> InterceptorId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        R: Fn(Error) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<T>> + Send + 'static,
    {
        self.register_interceptor(Interceptor::new(on_fulfilled).on_rejected(on_rejected))
    }
}

/// The request and response registries of one client.
#[derive(Debug, Default)]
pub struct Interceptors {
    /// Run before the transport call, on the request configuration.
    pub request: InterceptorManager<RequestConfig>,
    /// Run after the transport call, on the response.
    pub response: InterceptorManager<Response>,
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;

    use super::*;

    fn tagging(tag: &'static str) -> Interceptor<Vec<&'static str>> {
        Interceptor::new(move |mut tags: Vec<&'static str>| async move {
            tags.push(tag);
            Ok(tags)
        })
    }

    fn visited(manager: &InterceptorManager<Vec<&'static str>>) -> usize {
        let mut count = 0;
        manager.for_each(|_| count += 1);
        count
    }

    #[test]
    fn handles_are_monotonic_and_never_reused() {
        let manager = InterceptorManager::new();
        let first = manager.register_interceptor(tagging("a"));
        let second = manager.register_interceptor(tagging("b"));
        manager.remove(first);
        let third = manager.register_interceptor(tagging("c"));

        assert!(first < second && second < third);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn remove_is_idempotent_and_ignores_unknown_handles() {
        let manager = InterceptorManager::new();
        let id = manager.register_interceptor(tagging("a"));
        let kept = manager.register_interceptor(tagging("b"));

        manager.remove(id);
        manager.remove(id);
        manager.remove(InterceptorId(99));

        assert_eq!(visited(&manager), 1);
        manager.remove(kept);
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn for_each_visits_in_registration_order() {
        let manager = InterceptorManager::new();
        manager.register_interceptor(tagging("a"));
        let removed = manager.register_interceptor(tagging("b"));
        manager.register_interceptor(tagging("c"));
        manager.remove(removed);

        let mut steps = Vec::new();
        manager.for_each(|interceptor| steps.push(interceptor.clone()));

        let mut tags = Ok(Vec::new());
        for step in &steps {
            tags = step.apply(tags).await;
        }
        assert_eq!(tags.expect("tags"), vec!["a", "c"]);
    }

    #[test]
    fn visit_may_register_without_deadlock() {
        let manager = InterceptorManager::new();
        manager.register_interceptor(tagging("a"));

        manager.for_each(|_| {
            manager.register_interceptor(tagging("b"));
        });
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn error_skips_fulfilled_and_reaches_rejected() {
        let passthrough = tagging("never");
        let outcome = passthrough
            .apply(Err(Error::invalid_request("boom")))
            .await;
        let_assert!(Err(Error::InvalidRequest(message)) = outcome);
        assert_eq!(message, "boom");

        let recovering = tagging("never").on_rejected(|_| async { Ok(vec!["recovered"]) });
        assert!(recovering.has_rejected_handler());
        let tags = recovering
            .apply(Err(Error::invalid_request("boom")))
            .await
            .expect("recovered");
        assert_eq!(tags, vec!["recovered"]);
    }
}
