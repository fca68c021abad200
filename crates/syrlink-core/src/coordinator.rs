// ── Polling coordinator ──
//
// Owns one API client and drives the poll cycle: discover devices once,
// then fan out a status request per device each interval and publish
// the combined result as an immutable snapshot. Device failures stay
// inside the snapshot; only discovery failures fail a cycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures::future::join_all;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use syrlink_api::SyrClient;
use syrlink_api::parser::{DeviceStatusData, StatisticsSeries};
use syrlink_api::payload::{ActionValue, DeviceAction, StatisticsKind};

use crate::config::AccountConfig;
use crate::error::CoreError;
use crate::model::{Device, DeviceFailure, DeviceState, StatusSnapshot};

struct CoordinatorInner {
    client: SyrClient,
    config: AccountConfig,
    /// Discovered devices, cached until [`Coordinator::invalidate_devices`].
    registry: ArcSwapOption<Vec<Device>>,
    /// Latest snapshot; `None` until the first cycle completes.
    snapshot_tx: watch::Sender<Option<Arc<StatusSnapshot>>>,
    /// Nudges the run loop into an early cycle after a command.
    refresh: Notify,
    cancel: CancellationToken,
}

/// Cheaply cloneable handle to the polling engine.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

impl Coordinator {
    /// Build a coordinator and its API client from account settings.
    pub fn new(config: AccountConfig) -> Result<Self, CoreError> {
        let client = SyrClient::with_transport(config.credentials(), config.transport())?;
        Ok(Self::from_client(client, config))
    }

    /// Wrap an existing client. Lets callers share one session across
    /// the coordinator and ad-hoc requests.
    #[must_use]
    pub fn from_client(client: SyrClient, config: AccountConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                config,
                registry: ArcSwapOption::const_empty(),
                snapshot_tx,
                refresh: Notify::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    #[must_use]
    pub fn client(&self) -> &SyrClient {
        &self.inner.client
    }

    #[must_use]
    pub fn config(&self) -> &AccountConfig {
        &self.inner.config
    }

    /// Latest published snapshot, if any cycle has completed.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that yields every newly published snapshot.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<StatusSnapshot>>> {
        self.inner.snapshot_tx.subscribe()
    }

    // ── Discovery ──

    /// Devices of the account, discovering them on first use.
    pub async fn devices(&self) -> Result<Arc<Vec<Device>>, CoreError> {
        self.ensure_registry().await
    }

    /// Drop the cached registry so the next cycle rediscovers.
    pub fn invalidate_devices(&self) {
        self.inner.registry.store(None);
        debug!("device registry invalidated");
    }

    /// Walk every project and flatten its devices into the registry.
    ///
    /// An account without devices is not an error, but the empty result
    /// is not cached either, so a freshly registered softener shows up
    /// on the next cycle without manual invalidation.
    pub async fn discover(&self) -> Result<Arc<Vec<Device>>, CoreError> {
        let projects = self.inner.client.list_projects().await?;
        let mut devices = Vec::new();
        for project in &projects {
            let records = self.inner.client.list_devices(&project.id).await?;
            devices.extend(
                records
                    .into_iter()
                    .map(|record| Device::from_record(record, project)),
            );
        }
        if devices.is_empty() {
            warn!("account has no registered devices");
            return Ok(Arc::new(Vec::new()));
        }
        let devices = Arc::new(devices);
        self.inner.registry.store(Some(Arc::clone(&devices)));
        info!(
            devices = devices.len(),
            projects = projects.len(),
            "device discovery complete"
        );
        Ok(devices)
    }

    async fn ensure_registry(&self) -> Result<Arc<Vec<Device>>, CoreError> {
        if let Some(devices) = self.inner.registry.load_full() {
            return Ok(devices);
        }
        self.discover().await
    }

    async fn resolve(&self, identifier: &str) -> Result<Device, CoreError> {
        let devices = self.ensure_registry().await?;
        devices
            .iter()
            .find(|device| device.matches(identifier))
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.to_owned(),
            })
    }

    // ── Polling ──

    /// Run one polling cycle and publish its snapshot.
    ///
    /// Status requests for all devices run concurrently. A device that
    /// fails lands in the snapshot as [`DeviceState::Failed`]; the
    /// cycle only errors when discovery itself does.
    pub async fn poll_once(&self) -> Result<Arc<StatusSnapshot>, CoreError> {
        let devices = self.ensure_registry().await?;
        let fetches = devices.iter().map(|device| {
            let client = self.inner.client.clone();
            async move {
                let state = match client.get_device_status(&device.collection_id).await {
                    Ok(status) => DeviceState::Ready(status),
                    Err(err) => {
                        warn!(device = %device.id, error = %err, "device status fetch failed");
                        DeviceState::Failed(DeviceFailure::from_error(&err))
                    }
                };
                (device.id.clone(), state)
            }
        });
        let states: BTreeMap<String, DeviceState> = join_all(fetches).await.into_iter().collect();
        let snapshot = StatusSnapshot::new(states);
        debug!(
            ready = snapshot.ready_count(),
            failed = snapshot.failed_count(),
            "polling cycle complete"
        );
        self.inner.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Poll until [`Coordinator::shutdown`] is called.
    ///
    /// The first cycle starts immediately; afterwards cycles run every
    /// `poll_interval`, or earlier when a command nudges the loop. A
    /// failed cycle is logged and the loop keeps going.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.inner.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "polling loop started"
        );
        loop {
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                () = self.inner.refresh.notified() => {}
                _ = interval.tick() => {}
            }
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                result = self.poll_once() => {
                    if let Err(err) = result {
                        warn!(error = %err, "polling cycle failed");
                    }
                }
            }
        }
        info!("polling loop stopped");
    }

    /// Stop the run loop, cancelling an in-flight cycle.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Commands ──

    /// Dispatch a well-known action to a device named by id, serial or
    /// collection id, then nudge the run loop for a fresh snapshot.
    pub async fn trigger_action(
        &self,
        identifier: &str,
        action: DeviceAction,
    ) -> Result<(), CoreError> {
        let device = self.resolve(identifier).await?;
        self.inner
            .client
            .send_action(&device.collection_id, action)
            .await?;
        info!(device = %device.id, action = %action, "device action accepted");
        self.inner.refresh.notify_one();
        Ok(())
    }

    /// Write one raw command value, for commands without a typed action.
    pub async fn set_value(
        &self,
        identifier: &str,
        command: &str,
        value: ActionValue,
    ) -> Result<(), CoreError> {
        let device = self.resolve(identifier).await?;
        self.inner
            .client
            .set_device_value(&device.collection_id, command, value)
            .await?;
        info!(device = %device.id, command, "device value written");
        self.inner.refresh.notify_one();
        Ok(())
    }

    /// Fetch one device's status outside the polling cycle.
    pub async fn device_status(&self, identifier: &str) -> Result<DeviceStatusData, CoreError> {
        let device = self.resolve(identifier).await?;
        let status = self
            .inner
            .client
            .get_device_status(&device.collection_id)
            .await?;
        Ok(status)
    }

    /// Fetch a usage statistics series on demand. Statistics are not
    /// part of the polling cycle.
    pub async fn statistics(
        &self,
        identifier: &str,
        kind: StatisticsKind,
    ) -> Result<StatisticsSeries, CoreError> {
        let device = self.resolve(identifier).await?;
        let series = self
            .inner
            .client
            .get_statistics(&device.collection_id, kind)
            .await?;
        Ok(series)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("devices", &self.inner.registry.load().as_ref().map(|d| d.len()))
            .field("session", &self.inner.client.state())
            .finish_non_exhaustive()
    }
}
