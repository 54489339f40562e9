//! Background task implementations for HealthMonitor

use super::system::{HealthMonitor, ServerTask};
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How often expired metrics are swept for servers that stopped recording
const METRICS_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

impl HealthMonitor {
    /// Spawn the check loop for `server_name`, replacing any previous one
    pub(super) fn spawn_server_loop(&self, server_name: &str) {
        let stop = CancellationToken::new();
        let monitor = self.clone();
        let name = server_name.to_string();
        let loop_stop = stop.clone();

        let handle = tokio::spawn(async move {
            debug!(server = %name, "check loop started");
            loop {
                // Re-read each cycle so reconfiguration applies to the next check.
                let Some(profile) = monitor.profile(&name) else {
                    break;
                };
                monitor.run_check(&profile).await;

                tokio::select! {
                    biased;
                    _ = monitor.shutdown.cancelled() => break,
                    _ = loop_stop.cancelled() => break,
                    _ = tokio::time::sleep(profile.check_interval()) => {}
                }
            }
            debug!(server = %name, "check loop stopped");
        });

        if let Some(previous) = self
            .tasks
            .lock()
            .insert(server_name.to_string(), ServerTask { stop, handle })
        {
            previous.stop.cancel();
        }
    }

    /// Retire `server_name` after the grace period unless it is re-added
    pub(super) fn schedule_retirement(&self, server_name: String) {
        let pending = CancellationToken::new();
        if let Some(earlier) = self.retiring.insert(server_name.clone(), pending.clone()) {
            earlier.cancel();
        }

        let monitor = self.clone();
        let grace = self.defaults.retirement_grace();
        info!(server = %server_name, grace_ms = grace.as_millis() as u64, "server removed, retiring after grace period");

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = monitor.shutdown.cancelled() => return,
                _ = pending.cancelled() => return,
                _ = tokio::time::sleep(grace) => {}
            }
            let _membership = monitor.membership.lock();
            if pending.is_cancelled() || monitor.profile(&server_name).is_some() {
                return;
            }
            monitor.retiring.remove(&server_name);
            monitor.retire(&server_name);
        });
        self.track_background(handle);
    }

    /// Keep `handle` for shutdown, dropping handles of tasks already done
    pub(super) fn track_background(&self, handle: JoinHandle<()>) {
        let mut background = self.background.lock();
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    /// Periodic sweep of expired metrics records
    pub(super) fn start_background_tasks(&self) {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = monitor.shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let pruned = monitor.metrics.prune_expired(Utc::now());
                        if pruned > 0 {
                            debug!(pruned, "expired metrics swept");
                        }
                    }
                }
            }
        });
        self.track_background(handle);
    }
}
