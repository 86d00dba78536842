//! Scheduled dashboard refresh.
//!
//! A spawned task refreshes on a fixed interval, right away when the
//! parameters change, and on demand. The latest [`Snapshot`] is published
//! through a `watch` channel.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

use crate::{DashboardParams, ParamsError, QueryPlan, Snapshot, WhaleSource, refresh};

/// Builds and starts the refresh task.
#[derive(Debug)]
pub struct Refresher<S: ?Sized> {
    source: Arc<S>,
    interval: Duration,
}

/// Handle to a running refresh task.
///
/// The task stops once the handle is dropped.
#[derive(Debug)]
pub struct RefreshHandle {
    params: watch::Sender<DashboardParams>,
    trigger: Arc<Notify>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    task: JoinHandle<()>,
}

impl<S: WhaleSource + ?Sized + 'static> Refresher<S> {
    /// Refresh from `source` every `interval`.
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval: interval.max(Duration::from_secs(1)) }
    }

    /// Run a first refresh with `params`, then keep refreshing in the
    /// background.
    pub async fn start(self, params: DashboardParams) -> Result<RefreshHandle, ParamsError> {
        let plan = params.plan()?;
        let first = refresh(&*self.source, &plan).await;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(first));
        let (params_tx, params_rx) = watch::channel(params);
        let trigger = Arc::new(Notify::new());

        info!(interval_secs = self.interval.as_secs(), "Starting dashboard refresher");
        let task = tokio::spawn(run(
            self.source,
            self.interval,
            plan,
            params_rx,
            Arc::clone(&trigger),
            snapshot_tx,
        ));

        Ok(RefreshHandle { params: params_tx, trigger, snapshots: snapshot_rx, task })
    }
}

impl RefreshHandle {
    /// Receiver that sees every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Parameters used by the next refresh.
    pub fn params(&self) -> DashboardParams {
        self.params.borrow().clone()
    }

    /// Refresh now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    /// Replace the parameters and refresh with them right away.
    ///
    /// Invalid parameters are rejected and the current ones kept.
    pub fn update_params(&self, params: DashboardParams) -> Result<(), ParamsError> {
        params.validate()?;
        self.params.send_replace(params);
        Ok(())
    }

    /// Whether the background task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run<S: WhaleSource + ?Sized>(
    source: Arc<S>,
    period: Duration,
    mut plan: QueryPlan,
    mut params: watch::Receiver<DashboardParams>,
    trigger: Arc<Notify>,
    snapshots: watch::Sender<Arc<Snapshot>>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => debug!("Scheduled dashboard refresh"),
            _ = trigger.notified() => {
                debug!("Manual dashboard refresh");
                ticker.reset();
            }
            changed = params.changed() => {
                if changed.is_err() {
                    debug!("Refresh handle dropped, stopping refresher");
                    return;
                }
                let next = params.borrow_and_update().clone();
                match next.plan() {
                    Ok(next) => plan = next,
                    Err(e) => {
                        warn!(error = %e, "Ignoring invalid dashboard parameters");
                        continue;
                    }
                }
                ticker.reset();
            }
        }

        let snapshot = refresh(&*source, &plan).await;
        snapshots.send_replace(Arc::new(snapshot));
    }
}
