//! Alert dispatcher implementation

use super::channels::{AlertSink, LoggingSink};
use super::types::{AlertEvent, AlertStats, AlertStorage};
use crate::config::models::AlertConfig;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fans alert events out to every registered sink and keeps a bounded history
#[derive(Debug)]
pub struct AlertDispatcher {
    config: AlertConfig,
    storage: RwLock<AlertStorage>,
    sinks: RwLock<Vec<Arc<dyn AlertSink>>>,
}

impl AlertDispatcher {
    pub fn new(config: AlertConfig) -> Self {
        let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::new();
        if config.log_events {
            sinks.push(Arc::new(LoggingSink));
        }
        Self {
            config,
            storage: RwLock::new(AlertStorage::default()),
            sinks: RwLock::new(sinks),
        }
    }

    pub fn add_sink(&self, sink: Arc<dyn AlertSink>) {
        debug!(sink = sink.name(), "alert sink registered");
        self.sinks.write().push(sink);
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record `event` and hand it to every sink.
    ///
    /// A failing sink is counted and logged; it never stops the others.
    pub async fn dispatch(&self, event: AlertEvent) {
        if !self.config.enabled {
            return;
        }

        {
            let mut storage = self.storage.write();
            storage.stats.total_alerts += 1;
            *storage
                .stats
                .alerts_by_kind
                .entry(event.kind.as_str().to_string())
                .or_default() += 1;
            *storage
                .stats
                .alerts_by_severity
                .entry(event.severity.to_string())
                .or_default() += 1;
            storage.stats.last_alert = Some(event.timestamp);

            if self.config.history_size > 0 {
                while storage.history.len() >= self.config.history_size {
                    storage.history.pop_front();
                }
                storage.history.push_back(event.clone());
            }
        }

        let sinks: Vec<Arc<dyn AlertSink>> = self.sinks.read().clone();
        for sink in sinks {
            if let Err(e) = sink.deliver(&event).await {
                warn!(sink = sink.name(), server = %event.server_name, "alert delivery failed: {}", e);
                self.storage.write().stats.failed_deliveries += 1;
            }
        }
    }

    /// Alerts so far, oldest first
    pub fn history(&self) -> Vec<AlertEvent> {
        self.storage.read().history.iter().cloned().collect()
    }

    /// The `limit` most recent alerts, newest first
    pub fn recent(&self, limit: usize) -> Vec<AlertEvent> {
        self.storage
            .read()
            .history
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> AlertStats {
        self.storage.read().stats.clone()
    }

    pub fn clear_history(&self) {
        self.storage.write().history.clear();
    }
}
