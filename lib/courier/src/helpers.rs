//! Free-standing helpers.

use futures_util::future::try_join_all;

use crate::{Error, Result};

/// Returns `true` if `error` is a deliberate cancellation rather than a failure.
#[must_use]
pub const fn is_cancel(error: &Error) -> bool {
    error.is_cancel()
}

/// Await every request concurrently.
///
/// Resolves with all values in input order, or with the first error; the remaining
/// requests are dropped, which aborts them.
///
/// # Errors
///
/// Returns the first error any of the futures produces.
///
/// # Example
///
/// ```ignore
/// let [user, posts] = courier::all([client.get("/user", None), client.get("/posts", None)])
///     .await?
///     .try_into()
///     .expect("two responses");
/// ```
pub async fn all<I, F, T>(requests: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    try_join_all(requests).await
}

/// A handler callable with its arguments packed in a tuple.
///
/// Implemented for every `FnOnce` of one to four arguments.
pub trait Spread<Args> {
    /// Return type of the handler.
    type Output;

    /// Unpack `args` and call the handler.
    fn call_spread(self, args: Args) -> Self::Output;
}

macro_rules! impl_spread {
    ($($arg:ident),+) => {
        impl<F, R, $($arg),+> Spread<($($arg,)+)> for F
        where
            F: FnOnce($($arg),+) -> R,
        {
            type Output = R;

            #[allow(non_snake_case)]
            fn call_spread(self, ($($arg,)+): ($($arg,)+)) -> R {
                self($($arg),+)
            }
        }
    };
}

impl_spread!(A);
impl_spread!(A, B);
impl_spread!(A, B, C);
impl_spread!(A, B, C, D);

/// Turn a handler of several arguments into one taking a tuple.
///
/// # Example
///
/// ```
/// use courier::spread;
///
/// let describe = spread(|status: u16, text: &str| format!("{status} {text}"));
/// assert_eq!(describe((404, "Not Found")), "404 Not Found");
/// ```
pub fn spread<Args, F>(handler: F) -> impl FnOnce(Args) -> F::Output
where
    F: Spread<Args>,
{
    move |args| handler.call_spread(args)
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;

    use super::*;
    use crate::Cancel;

    #[test]
    fn detects_cancellation() {
        assert!(is_cancel(&Error::Canceled(Cancel::new(None))));
        assert!(!is_cancel(&Error::invalid_request("nope")));
    }

    async fn value_after(value: i32, yields: usize) -> Result<i32> {
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        Ok(value)
    }

    #[tokio::test]
    async fn all_keeps_input_order() {
        let values = all(vec![value_after(1, 2), value_after(2, 0), value_after(3, 1)])
            .await
            .expect("all resolved");
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn all_fails_with_first_error() {
        let result = all([
            std::future::ready(Ok(1)),
            std::future::ready(Err(Error::invalid_request("second"))),
        ])
        .await;
        let_assert!(Err(Error::InvalidRequest(message)) = result);
        assert_eq!(message, "second");
    }

    #[test]
    fn spread_unpacks_tuples() {
        assert_eq!(spread(|a: i32| a * 2)((21,)), 42);
        assert_eq!(spread(|a: i32, b: i32, c: i32, d: i32| a + b + c + d)((1, 2, 3, 4)), 10);
    }
}
