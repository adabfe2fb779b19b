//! Cooperative request cancellation.
//!
//! A [`CancelToken`] is a one-shot broadcast: the first [`Canceler::cancel`] call records
//! a [`Cancel`] reason and wakes every waiter; later calls are ignored. Any number of
//! requests may hold clones of the same token and are canceled together.
//!
//! # Example
//!
//! ```
//! use courier_core::CancelToken;
//!
//! let source = CancelToken::source();
//! source.cancel.cancel_with("user navigated away");
//! source.cancel.cancel_with("ignored");
//!
//! let reason = source.token.reason().expect("canceled");
//! assert_eq!(reason.message(), "user navigated away");
//! ```

use std::sync::Arc;

use derive_more::Display;
use tokio::sync::watch;

use crate::{Error, Result};

/// Message used when a token is canceled without one.
pub const DEFAULT_CANCEL_MESSAGE: &str = "request canceled";

/// Reason recorded when a token is canceled.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{message}")]
pub struct Cancel {
    message: String,
}

impl Cancel {
    /// Create a reason; `None` uses [`DEFAULT_CANCEL_MESSAGE`].
    #[must_use]
    pub fn new(message: Option<String>) -> Self {
        Self {
            message: message.unwrap_or_else(|| DEFAULT_CANCEL_MESSAGE.to_string()),
        }
    }

    /// The cancellation message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Observing side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    reason: watch::Receiver<Option<Cancel>>,
}

/// Triggering side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct Canceler {
    slot: Arc<watch::Sender<Option<Cancel>>>,
}

/// A token paired with the function that cancels it.
#[derive(Debug, Clone)]
pub struct CancelTokenSource {
    /// Token to attach to requests.
    pub token: CancelToken,
    /// Cancels `token`.
    pub cancel: Canceler,
}

impl CancelToken {
    /// Create a token and hand its [`Canceler`] to `executor`.
    pub fn new(executor: impl FnOnce(Canceler)) -> Self {
        let source = Self::source();
        executor(source.cancel);
        source.token
    }

    /// Create a token together with its [`Canceler`].
    #[must_use]
    pub fn source() -> CancelTokenSource {
        let (slot, reason) = watch::channel(None);
        CancelTokenSource {
            token: Self { reason },
            cancel: Canceler {
                slot: Arc::new(slot),
            },
        }
    }

    /// The recorded reason, if the token was canceled.
    #[must_use]
    pub fn reason(&self) -> Option<Cancel> {
        self.reason.borrow().clone()
    }

    /// Returns `true` once the token was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.reason.borrow().is_some()
    }

    /// Fail with the recorded reason if the token was already canceled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canceled`] when the token was canceled.
    pub fn check(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(Error::Canceled(reason)),
            None => Ok(()),
        }
    }

    /// Wait until the token is canceled.
    ///
    /// Resolves immediately if it already was. Never resolves if every [`Canceler`] is
    /// dropped without canceling.
    pub async fn canceled(&self) -> Cancel {
        let mut reason = self.reason.clone();
        let fired = match reason.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        match fired {
            Some(cancel) => cancel,
            None => std::future::pending().await,
        }
    }
}

impl Canceler {
    /// Cancel with the default message.
    pub fn cancel(&self) {
        self.fire(None);
    }

    /// Cancel with `message`.
    pub fn cancel_with(&self, message: impl Into<String>) {
        self.fire(Some(message.into()));
    }

    fn fire(&self, message: Option<String>) {
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(Cancel::new(message));
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert2::let_assert;

    use super::*;

    #[test]
    fn default_message() {
        let source = CancelToken::source();
        source.cancel.cancel();
        assert_eq!(
            source.token.reason().map(|r| r.message().to_string()),
            Some(DEFAULT_CANCEL_MESSAGE.to_string())
        );
    }

    #[test]
    fn first_cancel_wins() {
        let source = CancelToken::source();
        source.cancel.cancel_with("first");
        source.cancel.cancel_with("second");
        source.cancel.cancel();

        assert_eq!(source.token.reason(), Some(Cancel::new(Some("first".to_string()))));
    }

    #[test]
    fn check_before_and_after_cancel() {
        let source = CancelToken::source();
        assert!(source.token.check().is_ok());
        assert!(!source.token.is_canceled());

        source.cancel.cancel_with("stop");

        let_assert!(Err(Error::Canceled(reason)) = source.token.check());
        assert_eq!(reason.message(), "stop");
        assert!(source.token.is_canceled());
    }

    #[test]
    fn executor_constructor_hands_out_canceler() {
        let mut canceler = None;
        let token = CancelToken::new(|cancel| canceler = Some(cancel));

        canceler.expect("executor ran").cancel_with("done");
        assert_eq!(token.reason().map(|r| r.to_string()), Some("done".to_string()));
    }

    #[tokio::test]
    async fn every_waiter_sees_the_same_cancel() {
        let source = CancelToken::source();
        let first = tokio::spawn({
            let token = source.token.clone();
            async move { token.canceled().await }
        });
        let second = tokio::spawn({
            let token = source.token.clone();
            async move { token.canceled().await }
        });

        tokio::task::yield_now().await;
        source.cancel.cancel_with("shutdown");
        source.cancel.cancel_with("late");

        let first = first.await.expect("join");
        let second = second.await.expect("join");
        assert_eq!(first.message(), "shutdown");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn canceled_resolves_immediately_when_already_fired() {
        let source = CancelToken::source();
        source.cancel.cancel();

        let reason = tokio::time::timeout(Duration::from_secs(1), source.token.canceled())
            .await
            .expect("already canceled");
        assert_eq!(reason.message(), DEFAULT_CANCEL_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_canceler_never_fires() {
        let CancelTokenSource { token, cancel } = CancelToken::source();
        drop(cancel);

        let waited = tokio::time::timeout(Duration::from_secs(60), token.canceled()).await;
        assert!(waited.is_err());
    }
}
