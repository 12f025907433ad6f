//! Background sync loop.
//!
//! `SyncManager` pushes the full election snapshot on a fixed interval, with
//! an immediate push whenever a ballot lands (wired through the store's
//! event bus). A compare-exchange flag keeps pushes from overlapping; a
//! trigger that arrives mid-push is held by the `Notify` permit and served
//! right after.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, warn};

use pemilu_election::{ElectionError, ElectionEvent, ElectionStore, ExportSnapshot};
use pemilu_types::Timestamp;

use crate::echo::EchoClient;
use crate::envelope::{new_device_id, SyncEnvelope};
use crate::error::SyncError;

/// Anything that can produce a full election snapshot on demand.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Result<ExportSnapshot, ElectionError>;
}

impl SnapshotSource for ElectionStore {
    fn snapshot(&self) -> Result<ExportSnapshot, ElectionError> {
        self.export_voting_data()
    }
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Full URL of the echo endpoint. `None` disables the manager.
    pub endpoint: Option<String>,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// A listener for the store's event bus that requests an immediate sync
/// after every committed ballot.
pub fn cast_listener(trigger: Arc<Notify>) -> Box<dyn Fn(&ElectionEvent) + Send + Sync> {
    Box::new(move |event| {
        if matches!(event, ElectionEvent::VoteCast { .. }) {
            trigger.notify_one();
        }
    })
}

pub struct SyncManager<S> {
    source: Arc<S>,
    client: Option<EchoClient>,
    device_id: String,
    interval: Duration,
    is_syncing: AtomicBool,
    last_sync: Mutex<Option<Timestamp>>,
    trigger: Arc<Notify>,
}

impl<S: SnapshotSource> SyncManager<S> {
    pub fn new(source: Arc<S>, config: SyncConfig) -> Self {
        Self::with_trigger(source, config, Arc::new(Notify::new()))
    }

    /// Build around an existing trigger, for callers that subscribed a
    /// [`cast_listener`] before handing the store over.
    pub fn with_trigger(source: Arc<S>, config: SyncConfig, trigger: Arc<Notify>) -> Self {
        let client = config
            .endpoint
            .as_deref()
            .map(|endpoint| EchoClient::with_timeout(endpoint, config.request_timeout));
        Self {
            source,
            client,
            device_id: new_device_id(),
            interval: config.interval,
            is_syncing: AtomicBool::new(false),
            last_sync: Mutex::new(None),
            trigger,
        }
    }

    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The trigger handle; notifying it requests an immediate sync.
    pub fn trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.trigger)
    }

    pub fn last_sync(&self) -> Option<Timestamp> {
        *self.last_sync.lock().expect("last_sync lock")
    }

    /// Push one snapshot now.
    ///
    /// Returns `Ok(false)` without doing anything when the manager is
    /// disabled or another push is already in flight.
    pub async fn sync_once(&self) -> Result<bool, SyncError> {
        let Some(client) = &self.client else {
            return Ok(false);
        };
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(false);
        }
        let result = self.push_snapshot(client).await;
        self.is_syncing.store(false, Ordering::SeqCst);
        result.map(|()| true)
    }

    async fn push_snapshot(&self, client: &EchoClient) -> Result<(), SyncError> {
        let snapshot = self.source.snapshot()?;
        let envelope = SyncEnvelope {
            device_id: self.device_id.clone(),
            sent_at: pemilu_utils::format_rfc3339(Timestamp::now()),
            total_voters: snapshot.voters.len() as u64,
            total_votes: snapshot.votes.len() as u64,
            snapshot,
        };
        let ack = client.push(&envelope).await?;
        *self.last_sync.lock().expect("last_sync lock") = Some(Timestamp::now());
        debug!(votes = envelope.total_votes, message = %ack.message, "sync acknowledged");
        Ok(())
    }

    /// Run until the shutdown channel fires. Failures are logged and the
    /// loop keeps going; the kiosk must outlive a flaky dashboard.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled() {
            info!("sync disabled, no endpoint configured");
            return;
        }
        info!(
            device = %self.device_id,
            interval_secs = self.interval.as_secs(),
            "sync manager started"
        );
        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("sync manager shutting down");
                    break;
                }
                _ = self.trigger.notified() => {
                    self.sync_and_log().await;
                }
                _ = interval.tick() => {
                    self.sync_and_log().await;
                }
            }
        }
    }

    async fn sync_and_log(&self) {
        if let Err(e) = self.sync_once().await {
            warn!(error = %e, "sync attempt failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pemilu_election::export::{ExportMetadata, EXPORT_FORMAT_VERSION, EXPORT_SYSTEM_NAME};
    use pemilu_election::stats::compute_stats;
    use pemilu_types::{CandidateId, VoteId, VoterId};

    struct EmptySource;

    impl SnapshotSource for EmptySource {
        fn snapshot(&self) -> Result<ExportSnapshot, ElectionError> {
            Ok(ExportSnapshot {
                metadata: ExportMetadata {
                    export_date: "1970-01-01T00:00:00+00:00".to_string(),
                    system: EXPORT_SYSTEM_NAME.to_string(),
                    version: EXPORT_FORMAT_VERSION.to_string(),
                },
                statistics: compute_stats(&[], &[], &[]),
                voters: Vec::new(),
                candidates: Vec::new(),
                votes: Vec::new(),
                admins: Vec::new(),
                audit_logs: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn disabled_manager_skips_quietly() {
        let manager = SyncManager::new(Arc::new(EmptySource), SyncConfig::default());
        assert!(!manager.enabled());
        assert!(!manager.sync_once().await.expect("sync"));
        assert!(manager.last_sync().is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_and_recovers() {
        let config = SyncConfig {
            endpoint: Some("http://127.0.0.1:1/api/sync-vote".to_string()),
            request_timeout: Duration::from_millis(500),
            ..SyncConfig::default()
        };
        let manager = SyncManager::new(Arc::new(EmptySource), config);
        assert!(manager.enabled());

        assert!(manager.sync_once().await.is_err());
        // The in-flight flag was released; a retry attempts the push again
        // instead of reporting a skip.
        assert!(manager.sync_once().await.is_err());
        assert!(manager.last_sync().is_none());
    }

    #[tokio::test]
    async fn cast_listener_requests_a_sync() {
        let trigger = Arc::new(Notify::new());
        let listener = cast_listener(Arc::clone(&trigger));

        listener(&ElectionEvent::VoteCast {
            voter_id: VoterId::new(1),
            candidate_id: CandidateId::new(2),
            vote_id: VoteId::new(3),
        });
        tokio::time::timeout(Duration::from_millis(100), trigger.notified())
            .await
            .expect("cast must leave a permit");
    }

    #[tokio::test]
    async fn other_events_do_not_trigger_sync() {
        let trigger = Arc::new(Notify::new());
        let listener = cast_listener(Arc::clone(&trigger));

        listener(&ElectionEvent::AllVotesReset { votes_cleared: 5 });
        let waited = tokio::time::timeout(Duration::from_millis(50), trigger.notified()).await;
        assert!(waited.is_err(), "reset events must not request a sync");
    }
}
