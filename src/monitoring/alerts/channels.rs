//! Alert sink implementations

use super::types::{AlertEvent, AlertSeverity};
use crate::utils::error::{MonitorError, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

/// Destination for alert events
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync + std::fmt::Debug {
    async fn deliver(&self, event: &AlertEvent) -> Result<()>;

    fn name(&self) -> &str;
}

/// Forwards events into a tokio channel.
///
/// Delivery never waits: an event that finds the channel full is dropped
/// and reported as a failed delivery.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<AlertEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<AlertEvent>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving end, holding up to `capacity` undelivered events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AlertEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

#[async_trait::async_trait]
impl AlertSink for ChannelSink {
    async fn deliver(&self, event: &AlertEvent) -> Result<()> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => MonitorError::Alert("alert channel full".to_string()),
            TrySendError::Closed(_) => MonitorError::Alert("alert receiver dropped".to_string()),
        })
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Writes events to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait::async_trait]
impl AlertSink for LoggingSink {
    async fn deliver(&self, event: &AlertEvent) -> Result<()> {
        match event.severity {
            AlertSeverity::Info => {
                info!(server = %event.server_name, kind = event.kind.as_str(), "{}", event.message)
            }
            AlertSeverity::Warning => {
                warn!(server = %event.server_name, kind = event.kind.as_str(), "{}", event.message)
            }
            AlertSeverity::Critical => {
                error!(server = %event.server_name, kind = event.kind.as_str(), "{}", event.message)
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
