//! Background sweep of expired revocation entries

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use super::authority::CredentialAuthority;

/// Run `prune_expired` every `period` until the returned task is aborted
///
/// The first sweep happens one full period after start. A failed sweep is
/// logged and retried on the next tick.
pub fn spawn_pruning_job(authority: CredentialAuthority, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting revocation pruning job");

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() completes its first tick immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match authority.prune_expired().await {
                Ok(pruned) => debug!(pruned, "Pruning sweep finished"),
                Err(e) => error!(error = %e, "Pruning sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use lingua_cache::MemoryRevocationRegistry;
    use lingua_common::JwtService;
    use lingua_core::{RevocationEntry, RevocationReason, RevocationRegistry, SubjectId};

    #[tokio::test(start_paused = true)]
    async fn test_job_prunes_on_each_tick() {
        let registry = MemoryRevocationRegistry::new();
        let authority = CredentialAuthority::new(
            Arc::new(JwtService::new("pruning-test-secret-0123456789abcdef", 900, 3600)),
            Arc::new(registry.clone()),
        );

        let past = Utc::now() - chrono::Duration::seconds(5);
        let future = Utc::now() + chrono::Duration::hours(2);
        for (id, expires_at) in [("dead", past), ("live", future)] {
            let entry =
                RevocationEntry::new(id, SubjectId::generate(), RevocationReason::Rotated, expires_at);
            registry.insert(&entry).await.unwrap();
        }

        let job = spawn_pruning_job(authority, Duration::from_secs(60));

        // Nothing happens before the first full period
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(registry.len(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("live").await.unwrap());

        job.abort();
    }
}
