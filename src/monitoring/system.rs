//! Core HealthMonitor implementation

use super::alerts::{AlertDispatcher, AlertEvent};
use super::metrics::{AggregationReport, MetricsCollector, MetricsSummary, TimeWindow};
use crate::config::Validate;
use crate::config::models::{GlobalDefaults, MonitorConfig, ServerProfile};
use crate::core::client::{BreakerEvent, ConnectionStats, ResilientClient};
use crate::core::health::{
    CredentialProvider, DualCheckOrchestrator, DualCheckResult, EndpointTransport,
    ProtocolTransport,
};
use crate::utils::error::recovery::CircuitBreakerRecord;
use crate::utils::error::{MonitorError, Result};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Immutable set of active profiles, keyed by server name
pub type ProfileSet = BTreeMap<String, Arc<ServerProfile>>;

/// Per-server check loop
#[derive(Debug)]
pub(super) struct ServerTask {
    /// Stops the loop between cycles; an in-flight check runs to completion
    pub stop: CancellationToken,
    pub handle: JoinHandle<()>,
}

/// Owns every per-server state container and the check loops driving them
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    pub(super) defaults: Arc<GlobalDefaults>,
    pub(super) profiles: Arc<ArcSwap<ProfileSet>>,
    pub(super) client: Arc<ResilientClient>,
    pub(super) orchestrator: Arc<DualCheckOrchestrator>,
    pub(super) metrics: Arc<MetricsCollector>,
    pub(super) alerts: Arc<AlertDispatcher>,
    pub(super) latest: Arc<DashMap<String, DualCheckResult>>,
    pub(super) breaker_events: Arc<Mutex<mpsc::UnboundedReceiver<BreakerEvent>>>,
    pub(super) shutdown: CancellationToken,
    pub(super) tasks: Arc<Mutex<BTreeMap<String, ServerTask>>>,
    pub(super) retiring: Arc<DashMap<String, CancellationToken>>,
    /// Held while the server set changes and while a server is retired
    pub(super) membership: Arc<Mutex<()>>,
    pub(super) background: Arc<Mutex<Vec<JoinHandle<()>>>>,
    pub(super) started: Arc<AtomicBool>,
}

fn profile_set(profiles: Vec<ServerProfile>, defaults: &GlobalDefaults) -> Result<ProfileSet> {
    let mut set = ProfileSet::new();
    for mut profile in profiles.into_iter().filter(|p| p.enabled) {
        profile.apply_defaults(defaults);
        profile.validate().map_err(MonitorError::Validation)?;
        if set.contains_key(&profile.name) {
            return Err(MonitorError::Validation(format!(
                "duplicate server name '{}'",
                profile.name
            )));
        }
        set.insert(profile.name.clone(), Arc::new(profile));
    }
    Ok(set)
}

impl HealthMonitor {
    /// Build a monitor for `config`; nothing runs until [`start`](Self::start)
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate().map_err(MonitorError::Validation)?;
        info!(servers = config.servers.len(), "initializing health monitor");

        let profiles = profile_set(config.servers.clone(), &config.defaults)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let client = Arc::new(ResilientClient::new().with_event_sender(sender));
        let orchestrator = Arc::new(DualCheckOrchestrator::new(
            client.clone(),
            config.scoring.clone(),
        ));

        Ok(Self {
            defaults: Arc::new(config.defaults),
            profiles: Arc::new(ArcSwap::from_pointee(profiles)),
            client,
            orchestrator,
            metrics: Arc::new(MetricsCollector::new(config.metrics)),
            alerts: Arc::new(AlertDispatcher::new(config.alerts)),
            latest: Arc::new(DashMap::new()),
            breaker_events: Arc::new(Mutex::new(receiver)),
            shutdown: CancellationToken::new(),
            tasks: Arc::new(Mutex::new(BTreeMap::new())),
            retiring: Arc::new(DashMap::new()),
            membership: Arc::new(Mutex::new(())),
            background: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Swap in different probe transports; call before any check runs
    pub fn with_transports(
        mut self,
        protocol: Arc<dyn ProtocolTransport>,
        endpoint: Arc<dyn EndpointTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let scoring = self.orchestrator.scoring().clone();
        self.orchestrator = Arc::new(
            DualCheckOrchestrator::new(self.client.clone(), scoring)
                .with_transports(protocol, endpoint, credentials),
        );
        self
    }

    /// Start one check loop per server plus housekeeping
    pub async fn start(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(MonitorError::Internal(
                "monitor has been shut down".to_string(),
            ));
        }
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("health monitor already started");
            return Ok(());
        }

        info!("starting health monitor");
        for profile in self.profiles.load().values() {
            self.spawn_server_loop(&profile.name);
        }
        self.start_background_tasks();
        info!(servers = self.profiles.load().len(), "health monitor started");
        Ok(())
    }

    /// Cancel in-flight checks, stop all loops and wait for them to exit
    pub async fn shutdown(&self) {
        info!("shutting down health monitor");
        self.shutdown.cancel();

        let server_tasks: Vec<ServerTask> = {
            let mut tasks = self.tasks.lock();
            std::mem::take(&mut *tasks).into_values().collect()
        };
        let background: Vec<JoinHandle<()>> = std::mem::take(&mut *self.background.lock());

        let handles = server_tasks
            .into_iter()
            .map(|t| t.handle)
            .chain(background);
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("monitor task ended abnormally: {}", e);
            }
        }
        info!("health monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.shutdown.is_cancelled()
    }

    /// Current profile snapshot for `server_name`
    pub fn profile(&self, server_name: &str) -> Option<Arc<ServerProfile>> {
        self.profiles.load().get(server_name).cloned()
    }

    pub fn server_names(&self) -> Vec<String> {
        self.profiles.load().keys().cloned().collect()
    }

    /// Run one check cycle for `profile` and record its outcome.
    ///
    /// Cancelled cycles are returned but not recorded.
    pub(super) async fn run_check(&self, profile: &ServerProfile) -> DualCheckResult {
        let result = self
            .orchestrator
            .check_server(profile, &self.shutdown)
            .await;
        self.forward_breaker_events().await;

        if result.is_cancelled() {
            debug!(server = %profile.name, "check cancelled, not recorded");
            return result;
        }

        if let Some(protocol) = &result.protocol {
            self.metrics.record(protocol.clone());
        }
        if let Some(endpoint) = &result.endpoint {
            self.metrics.record(endpoint.clone());
        }
        self.metrics.record(result.clone());

        let previous = self
            .latest
            .insert(profile.name.clone(), result.clone())
            .map(|r| r.overall_status);
        if let Some(previous) = previous.filter(|p| *p != result.overall_status) {
            info!(
                server = %profile.name,
                from = %previous,
                to = %result.overall_status,
                score = result.health_score,
                "server status changed"
            );
            self.raise(AlertEvent::status_changed(
                &profile.name,
                previous,
                result.overall_status,
                result.health_score,
            ))
            .await;
        }
        result
    }

    async fn forward_breaker_events(&self) {
        let events: Vec<BreakerEvent> = {
            let mut receiver = self.breaker_events.lock();
            std::iter::from_fn(|| receiver.try_recv().ok()).collect()
        };
        for event in events {
            if event.transition.is_trip() {
                self.raise(AlertEvent::circuit_opened(event.record)).await;
            } else if event.transition.is_recovery() {
                self.raise(AlertEvent::circuit_recovered(event.record)).await;
            }
        }
    }

    /// Dispatch `event`; a sink still delivering at shutdown is abandoned
    async fn raise(&self, event: AlertEvent) {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!("monitor shutting down, alert delivery abandoned");
            }
            _ = self.alerts.dispatch(event) => {}
        }
    }

    /// Check one server immediately, outside its schedule
    pub async fn check_server_now(&self, server_name: &str) -> Result<DualCheckResult> {
        let profile = self
            .profile(server_name)
            .ok_or_else(|| MonitorError::NotFound(format!("server '{}'", server_name)))?;
        Ok(self.run_check(&profile).await)
    }

    /// Check every server concurrently; results are ordered by server name
    pub async fn check_all_now(&self) -> Vec<DualCheckResult> {
        let profiles: Vec<Arc<ServerProfile>> = self.profiles.load().values().cloned().collect();
        futures::future::join_all(profiles.iter().map(|p| self.run_check(p))).await
    }

    /// Atomically replace the server set.
    ///
    /// In-flight checks finish with the profile they started with. New
    /// servers get a loop, removed ones stop theirs and are retired after
    /// the grace period unless they come back first.
    pub async fn reconfigure(&self, profiles: Vec<ServerProfile>) -> Result<()> {
        let next = profile_set(profiles, &self.defaults)?;
        let membership = self.membership.lock();
        let previous = self.profiles.swap(Arc::new(next.clone()));

        let before: HashSet<&String> = previous.keys().collect();
        let after: HashSet<&String> = next.keys().collect();
        let added: Vec<String> = after.difference(&before).map(|s| s.to_string()).collect();
        let removed: Vec<String> = before.difference(&after).map(|s| s.to_string()).collect();

        info!(
            servers = next.len(),
            added = added.len(),
            removed = removed.len(),
            "monitor reconfigured"
        );

        for name in next.keys() {
            if let Some((_, pending)) = self.retiring.remove(name) {
                info!(server = %name, "server re-added, retirement cancelled");
                pending.cancel();
            }
        }
        for name in removed {
            if let Some(task) = self.tasks.lock().remove(&name) {
                task.stop.cancel();
            }
            self.schedule_retirement(name);
        }
        drop(membership);

        if self.is_running() {
            for name in &added {
                self.spawn_server_loop(name);
            }
        }
        Ok(())
    }

    /// Forget a removed server's breaker, stats, history and latest result
    pub(super) fn retire(&self, server_name: &str) {
        self.client.retire(server_name);
        self.orchestrator.retire(server_name);
        self.metrics.remove_server(server_name);
        self.latest.remove(server_name);
        info!(server = %server_name, "server retired");
    }

    pub fn latest_result(&self, server_name: &str) -> Option<DualCheckResult> {
        self.latest.get(server_name).map(|r| r.value().clone())
    }

    /// Status counts over the configured servers
    pub fn summary(&self) -> MetricsSummary {
        self.metrics.summary_for(&self.server_names())
    }

    pub fn report(&self, server_name: &str, window: TimeWindow) -> Result<AggregationReport> {
        if self.profile(server_name).is_none() && self.metrics.record_count(server_name) == 0 {
            return Err(MonitorError::NotFound(format!("server '{}'", server_name)));
        }
        Ok(self.metrics.get_report(server_name, window))
    }

    pub fn global_report(&self, window: TimeWindow) -> AggregationReport {
        self.metrics.get_global_report(window)
    }

    pub fn connection_stats(&self, server_name: &str) -> Option<ConnectionStats> {
        self.client.stats(server_name)
    }

    pub fn breaker_record(&self, server_name: &str) -> Option<CircuitBreakerRecord> {
        self.client.breaker_record(server_name)
    }

    /// Operator action: zero a server's call statistics
    pub fn reset_stats(&self, server_name: &str) -> Result<()> {
        if self.client.reset_stats(server_name) {
            info!(server = %server_name, "connection stats reset");
            Ok(())
        } else {
            Err(MonitorError::NotFound(format!(
                "no statistics for server '{}'",
                server_name
            )))
        }
    }

    /// Operator action: force a server's breaker closed
    pub fn reset_breaker(&self, server_name: &str) -> Result<()> {
        if self.client.reset_breaker(server_name) {
            info!(server = %server_name, "circuit breaker reset");
            Ok(())
        } else {
            Err(MonitorError::NotFound(format!(
                "no circuit breaker for server '{}'",
                server_name
            )))
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn alerts(&self) -> &AlertDispatcher {
        &self.alerts
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }
}
