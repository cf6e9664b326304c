use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{AdviceError, AdvicePrompt, AdviceProvider};

/// Single-flight wrapper around a provider: one outstanding request at a
/// time, bounded by `timeout`, cancellable through [`AdviceSession::cancel`].
pub struct AdviceSession {
    provider: Arc<dyn AdviceProvider>,
    timeout: Duration,
    in_flight: Mutex<Option<CancellationToken>>,
}

// Clears the in-flight slot however the request future ends, including drop.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.slot).take();
    }
}

fn lock(slot: &Mutex<Option<CancellationToken>>) -> MutexGuard<'_, Option<CancellationToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AdviceSession {
    pub fn new(provider: Arc<dyn AdviceProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            in_flight: Mutex::new(None),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Cancels the outstanding request. Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.in_flight).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn request(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let token = {
            let mut slot = lock(&self.in_flight);
            if slot.is_some() {
                return Err(AdviceError::InFlight);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };
        let _guard = InFlightGuard {
            slot: &self.in_flight,
        };

        tracing::info!(provider = self.provider.name(), "requesting advice");
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(AdviceError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.provider.request_advice(prompt)) => {
                result.unwrap_or(Err(AdviceError::Timeout(self.timeout)))
            }
        };

        if let Err(err) = &outcome {
            tracing::warn!(provider = self.provider.name(), error = %err, "advice request failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{NoopProvider, StubProvider};
    use async_trait::async_trait;

    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl AdviceProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn request_advice(&self, _prompt: &AdvicePrompt) -> Result<String, AdviceError> {
            tokio::time::sleep(self.delay).await;
            Ok("done".to_string())
        }
    }

    fn slow_session(delay: Duration, timeout: Duration) -> Arc<AdviceSession> {
        Arc::new(AdviceSession::new(Arc::new(SlowProvider { delay }), timeout))
    }

    async fn wait_until_in_flight(session: &AdviceSession) {
        while !session.is_in_flight() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn completed_request_releases_latch() {
        let session = AdviceSession::new(Arc::new(StubProvider::new("fine")), Duration::from_secs(1));
        let prompt = AdvicePrompt::from_text("x");

        assert_eq!(session.request(&prompt).await.expect("stub succeeds"), "fine");
        assert!(!session.is_in_flight());
        assert_eq!(session.request(&prompt).await.expect("second call succeeds"), "fine");
    }

    #[tokio::test]
    async fn failed_request_releases_latch() {
        let session = AdviceSession::new(Arc::new(NoopProvider), Duration::from_secs(1));
        let prompt = AdvicePrompt::from_text("x");

        let err = session.request(&prompt).await.expect_err("noop fails");
        assert!(matches!(err, AdviceError::Disabled));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn concurrent_request_is_rejected_and_first_can_be_cancelled() {
        let session = slow_session(Duration::from_secs(30), Duration::from_secs(60));
        let prompt = AdvicePrompt::from_text("x");

        let first = {
            let session = Arc::clone(&session);
            let prompt = prompt.clone();
            tokio::spawn(async move { session.request(&prompt).await })
        };
        wait_until_in_flight(&session).await;

        let second = session.request(&prompt).await;
        assert!(matches!(second, Err(AdviceError::InFlight)));

        assert!(session.cancel());
        let first = first.await.expect("task should not panic");
        assert!(matches!(first, Err(AdviceError::Cancelled)));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let session = slow_session(Duration::from_secs(30), Duration::from_millis(20));
        let err = session
            .request(&AdvicePrompt::from_text("x"))
            .await
            .expect_err("request must time out");
        assert!(matches!(err, AdviceError::Timeout(limit) if limit == Duration::from_millis(20)));
        assert!(!session.is_in_flight());
    }

    #[tokio::test]
    async fn dropped_request_releases_latch() {
        let session = slow_session(Duration::from_secs(30), Duration::from_secs(60));
        let handle = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.request(&AdvicePrompt::from_text("x")).await })
        };
        wait_until_in_flight(&session).await;

        handle.abort();
        let _ = handle.await;
        assert!(!session.is_in_flight());
    }

    #[test]
    fn cancel_without_request_is_a_no_op() {
        let session = AdviceSession::new(Arc::new(NoopProvider), Duration::from_secs(1));
        assert!(!session.cancel());
        assert_eq!(session.provider_name(), "none");
    }
}
