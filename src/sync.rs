//! Sync service orchestration.
//!
//! The remote backend is the source of truth. A refresh overwrites every
//! local table with the remote collections; local mutations are pushed to
//! the backend as they are published.

use crate::config::SyncConfig;
use crate::db::snapshot;
use crate::error::{AppError, Result};
use crate::events::{ChangeKind, ChangeOrigin, Collection, DataChange, SyncStatus};
use crate::remote::RemoteBackend;
use crate::store::StorageService;
use chrono::Utc;
use sea_orm::TransactionTrait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of a refresh.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub collections: usize,
    pub records: usize,
    pub duration_secs: f64,
}

impl SyncResult {
    /// Get summary message.
    pub fn summary(&self) -> String {
        format!(
            "Refreshed {} collections, {} records (took {:.1}s)",
            self.collections, self.records, self.duration_secs
        )
    }
}

/// Keeps the local store in step with a remote backend.
pub struct SyncService<B: RemoteBackend> {
    store: StorageService,
    backend: Arc<B>,
    config: SyncConfig,
    refresh_lock: Mutex<()>,
}

impl<B: RemoteBackend> SyncService<B> {
    pub fn new(store: StorageService, backend: Arc<B>, config: SyncConfig) -> Self {
        Self {
            store,
            backend,
            config,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &StorageService {
        &self.store
    }

    /// Refetch every collection and overwrite the local tables.
    ///
    /// Either all collections are replaced or none are. A second call while
    /// a refresh is running fails with [`AppError::SyncInProgress`].
    pub async fn force_refresh_data(&self) -> Result<SyncResult> {
        let _guard = self.refresh_lock.try_lock().map_err(|_| AppError::SyncInProgress)?;
        let events = self.store.events();
        events.set_status(SyncStatus::Syncing);

        match self.refresh().await {
            Ok(result) => {
                info!("{}", result.summary());
                events.set_status(SyncStatus::Synced {
                    at: Utc::now(),
                    records: result.records,
                });
                Ok(result)
            }
            Err(e) => {
                error!("Refresh failed: {e}");
                events.set_status(SyncStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn refresh(&self) -> Result<SyncResult> {
        let start = Instant::now();

        let mut fetched = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let records = self.backend.fetch_collection(collection).await?;
            debug!("Fetched {} {collection} records", records.len());
            fetched.push((collection, records));
        }

        let txn = self.store.connection().begin().await?;
        let mut records = 0;
        for (collection, rows) in fetched {
            match snapshot::replace_collection(&txn, collection, rows).await {
                Ok(count) => records += count,
                Err(e) => {
                    txn.rollback().await?;
                    return Err(AppError::remote(format!("Invalid {collection} payload: {e}")));
                }
            }
        }
        txn.commit().await?;

        for collection in Collection::ALL {
            self.store.events().publish(DataChange::reloaded(collection));
        }

        Ok(SyncResult {
            collections: Collection::ALL.len(),
            records,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Push one local mutation to the backend. Remote-origin changes are ignored.
    pub async fn push_change(&self, change: &DataChange) -> Result<()> {
        if change.origin == ChangeOrigin::Remote {
            return Ok(());
        }

        match &change.kind {
            ChangeKind::Upserted(id) => {
                match snapshot::load_record(self.store.connection(), change.collection, id).await? {
                    Some(record) => self.backend.upsert_record(change.collection, id, record).await?,
                    // Deleted again before we got to it; the delete event follows.
                    None => debug!("{} {id} vanished before push", change.collection),
                }
            }
            ChangeKind::Deleted(id) => self.backend.delete_record(change.collection, id).await?,
            ChangeKind::Reloaded => {}
        }
        Ok(())
    }

    /// Push a batch of local mutations, one at a time. Failures are logged
    /// and do not stop the batch; returns how many went through.
    pub async fn push_changes(&self, changes: &[DataChange]) -> usize {
        let mut pushed = 0;
        for change in changes {
            match self.push_change(change).await {
                Ok(()) => pushed += 1,
                Err(e) => warn!("Failed to push {} change: {e}", change.collection),
            }
        }
        if pushed < changes.len() {
            let failed = changes.len() - pushed;
            self.store
                .events()
                .set_status(SyncStatus::Error(format!("{failed} of {} changes not pushed", changes.len())));
        }
        pushed
    }

    /// Test backend connection.
    pub async fn test_connection(&self) -> Result<bool> {
        self.backend.ping().await
    }

    /// Start the background tasks: the polling loop (when auto sync is on)
    /// and the change listener (when push on change is on).
    pub fn spawn(self: Arc<Self>) -> SyncHandle {
        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::new();

        if self.config.auto_enabled {
            let service = Arc::clone(&self);
            let stop = shutdown.subscribe();
            tasks.push(tokio::spawn(async move { service.poll_loop(stop).await }));
        }

        if self.config.push_on_change {
            let service = Arc::clone(&self);
            let stop = shutdown.subscribe();
            let changes = self.store.subscribe_to_data_changes();
            tasks.push(tokio::spawn(async move { service.listen_loop(changes, stop).await }));
        }

        SyncHandle { shutdown, tasks }
    }

    async fn poll_loop(&self, mut stop: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.config.interval_seconds);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Auto sync every {}s", self.config.interval_seconds);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh_in_background().await,
                _ = stop.changed() => break,
            }
        }
        debug!("Polling loop stopped");
    }

    async fn listen_loop(
        &self,
        mut changes: tokio::sync::broadcast::Receiver<DataChange>,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                received = changes.recv() => match received {
                    Ok(change) => {
                        if let Err(e) = self.push_change(&change).await {
                            warn!("Failed to push {} change: {e}", change.collection);
                            self.store.events().set_status(SyncStatus::Error(e.to_string()));
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Change listener missed {missed} events, refreshing");
                        self.refresh_in_background().await;
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.changed() => break,
            }
        }
        debug!("Change listener stopped");
    }

    async fn refresh_in_background(&self) {
        match self.force_refresh_data().await {
            Ok(_) => {}
            Err(AppError::SyncInProgress) => debug!("Refresh already running, skipping"),
            // Already logged and reported through the status channel.
            Err(_) => {}
        }
    }
}

/// Handle to the background sync tasks.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop the tasks and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Sync task ended abnormally: {e}");
            }
        }
    }
}
