//! Per-request execution context: cancellation, deadline and caller info.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::repository::{StoreError, StoreResult};

/// Carried through every engine and service call.
///
/// Reads and lock waits race the token and the deadline and give up early with
/// [`StoreError::Cancelled`]. Writes only check the token before they start;
/// once issued they run to completion so nothing is left half-applied.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_client_info(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancelled explicitly or past the deadline.
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Await `fut` unless the request is cancelled or times out first.
    pub async fn wait<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = T>,
    {
        if self.is_done() {
            return Err(StoreError::Cancelled);
        }
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            _ = deadline => Err(StoreError::Cancelled),
            value = fut => Ok(value),
        }
    }

    /// Run a read, abandoning it if the request is cancelled or times out.
    pub async fn read<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.wait(fut).await?
    }

    /// Run a write. Refused up front when already cancelled, otherwise always completes.
    pub async fn write<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.is_done() {
            return Err(StoreError::Cancelled);
        }
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_passes_through_when_live() {
        let ctx = RequestContext::new();
        let value = ctx.read(async { Ok::<_, StoreError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_read_cancelled_token() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        token.cancel();

        let result = ctx.read(async { Ok::<_, StoreError>(()) }).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(())
        };
        let result = ctx.read(slow).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_completes_after_cancel_mid_flight() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let canceller = token.clone();
        let write = async move {
            canceller.cancel();
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, StoreError>("written")
        };
        assert_eq!(ctx.write(write).await.unwrap(), "written");
        assert!(ctx.write(async { Ok::<_, StoreError>(()) }).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_held_lock_gives_up_at_deadline() {
        let locks = crate::lifecycle::KeyLocks::new();
        let _held = locks.acquire("LIC-1").await;

        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let result = ctx.wait(locks.acquire("LIC-1")).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_wait_for_held_lock_gives_up_on_cancel() {
        let locks = crate::lifecycle::KeyLocks::new();
        let _held = locks.acquire("LIC-1").await;

        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::task::yield_now().await;
            token.cancel();
        });
        let result = ctx.wait(locks.acquire("LIC-1")).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
        canceller.await.unwrap();
    }
}
