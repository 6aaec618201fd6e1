//! Per-adapter request pacing.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::trace;

/// One token-bucket limiter per adapter id, sized from the adapter's
/// `rate_limit_delay`. Adapters never wait on each other.
#[derive(Default)]
pub struct AdapterPacer {
    limiters: Mutex<HashMap<String, Arc<DefaultDirectRateLimiter>>>,
}

impl AdapterPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `adapter_id` may issue its next lookup.
    ///
    /// The first call for an adapter returns immediately; later calls are
    /// spaced at least `delay` apart. A zero delay never waits.
    pub async fn wait(&self, adapter_id: &str, delay: Duration) {
        let Some(limiter) = self.limiter(adapter_id, delay) else {
            return;
        };
        trace!("Pacing {} ({:?})", adapter_id, delay);
        limiter.until_ready().await;
    }

    fn limiter(&self, adapter_id: &str, delay: Duration) -> Option<Arc<DefaultDirectRateLimiter>> {
        let quota = Quota::with_period(delay)?;
        let mut limiters = self.limiters.lock().unwrap_or_else(PoisonError::into_inner);
        let limiter = limiters
            .entry(adapter_id.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(quota)));
        Some(limiter.clone())
    }

    /// Forget all limiter state.
    pub fn reset(&self) {
        self.limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for AdapterPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .limiters
            .lock()
            .map(|l| l.len())
            .unwrap_or_default();
        f.debug_struct("AdapterPacer").field("adapters", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_spacing_per_adapter() {
        let pacer = AdapterPacer::new();
        let delay = Duration::from_millis(60);

        let start = Instant::now();
        pacer.wait("slow", delay).await;
        assert!(start.elapsed() < delay);

        pacer.wait("slow", delay).await;
        pacer.wait("slow", delay).await;
        assert!(start.elapsed() >= Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_adapters_do_not_share_budget() {
        let pacer = AdapterPacer::new();
        let long = Duration::from_millis(500);

        pacer.wait("a", long).await;
        let start = Instant::now();
        pacer.wait("b", long).await;
        pacer.wait("c", Duration::ZERO).await;
        pacer.wait("c", Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_millis(250));
    }
}
