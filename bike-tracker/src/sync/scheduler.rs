//! Background refresh loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::stations::{BikeSystems, StationFetcher};

use super::orchestrator::Synchronizer;

/// Handle to the background refresh task.
///
/// Dropping the handle also stops the task, at the end of any pass in
/// progress.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the loop and wait for it to exit.
    ///
    /// A pass already running is allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Background refresh task failed");
        }
    }
}

/// Resynchronize every system now and then every `every`, until shut down.
pub fn spawn_background_refresh<F: StationFetcher>(
    systems: Arc<BikeSystems>,
    synchronizer: Arc<Synchronizer<F>>,
    every: Duration,
) -> RefreshHandle {
    let (shutdown, mut stop) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "Starting background station refresh");

        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick fires immediately.
            tokio::select! {
                _ = interval.tick() => {}
                _ = stop.changed() => break,
            }

            for system in systems.iter() {
                synchronizer.synchronize(system).await;
            }

            if *stop.borrow() {
                break;
            }
        }

        info!("Background station refresh stopped");
    });

    RefreshHandle { shutdown, task }
}
