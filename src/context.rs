//! Per-invocation execution context.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ProviderError;

/// Carries the deadline of a single provider invocation.
///
/// A context is created by the provider for every lifecycle call and handed
/// down through the executors to the outbound client, so every HTTP request
/// made on behalf of that call shares one deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context with an optional timeout from now.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run `fut` under this context's deadline.
    ///
    /// `what` names the awaited work in the resulting
    /// [`ProviderError::DeadlineExceeded`].
    pub async fn run<F, T>(&self, what: &str, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| ProviderError::DeadlineExceeded(what.to_string()))?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_background_has_no_deadline() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(Context::from_timeout(None).deadline().is_none());
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_is_unbounded() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());

        let ctx = Context::from_timeout(Some(Duration::from_secs(u64::MAX)));
        assert!(ctx.remaining().is_none());
        let value = ctx.run("noop", async { Ok::<_, ProviderError>(1) }).await;
        assert_eq!(value.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_within_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let value = ctx.run("noop", async { Ok::<_, ProviderError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_past_deadline() {
        let ctx = Context::with_timeout(Duration::from_millis(10));
        let result = ctx
            .run("GET /v1/sidecars", async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ProviderError>(())
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert!(err.to_string().contains("GET /v1/sidecars"));
    }
}
