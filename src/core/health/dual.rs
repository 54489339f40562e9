//! Running both probes for a server and combining them

use super::credentials::CredentialProvider;
use super::endpoint::EndpointChecker;
use super::protocol::ProtocolChecker;
use super::scoring::{PathOutcome, evaluate};
use super::transport::{EndpointTransport, ProtocolTransport};
use super::types::{DualCheckResult, EndpointCheckResult, ProtocolCheckResult};
use crate::config::models::{DualCheckConfig, ServerProfile};
use crate::core::client::{CheckError, ResilientClient};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

/// Runs the protocol and endpoint probes of a server concurrently.
///
/// At most one check per server is in flight; a second caller waits for the
/// first to finish and then runs its own.
#[derive(Debug)]
pub struct DualCheckOrchestrator {
    client: Arc<ResilientClient>,
    protocol: ProtocolChecker,
    endpoint: EndpointChecker,
    scoring: DualCheckConfig,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl DualCheckOrchestrator {
    pub fn new(client: Arc<ResilientClient>, scoring: DualCheckConfig) -> Self {
        Self {
            client,
            protocol: ProtocolChecker::default(),
            endpoint: EndpointChecker::default(),
            scoring,
            in_flight: DashMap::new(),
        }
    }

    /// Replace both wire transports
    pub fn with_transports(
        mut self,
        protocol: Arc<dyn ProtocolTransport>,
        endpoint: Arc<dyn EndpointTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        self.protocol = ProtocolChecker::new(protocol, credentials.clone());
        self.endpoint = EndpointChecker::new(endpoint, credentials);
        self
    }

    pub fn client(&self) -> &Arc<ResilientClient> {
        &self.client
    }

    pub fn scoring(&self) -> &DualCheckConfig {
        &self.scoring
    }

    /// Check one server through every enabled path
    pub async fn check_server(
        &self,
        profile: &ServerProfile,
        cancel: &CancellationToken,
    ) -> DualCheckResult {
        let slot = self
            .in_flight
            .entry(profile.name.clone())
            .or_default()
            .clone();
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.not_run(profile, CheckError::Cancelled),
            guard = slot.lock_owned() => guard,
        };

        let span = info_span!("dual_check", server = %profile.name);
        async {
            let protocol = async {
                if profile.protocol_enabled() {
                    Some(
                        self.protocol
                            .check(&self.client, profile, &self.scoring, cancel)
                            .await,
                    )
                } else {
                    None
                }
            };
            let endpoint = async {
                if profile.endpoint_enabled() {
                    Some(self.endpoint.check(&self.client, profile, cancel).await)
                } else {
                    None
                }
            };
            let (protocol, endpoint) = tokio::join!(protocol, endpoint);
            let result = self.combine(profile, protocol, endpoint);
            debug!(
                status = %result.overall_status,
                score = result.health_score,
                "dual check complete"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Score probe results already gathered for `profile`
    pub fn combine(
        &self,
        profile: &ServerProfile,
        protocol: Option<ProtocolCheckResult>,
        endpoint: Option<EndpointCheckResult>,
    ) -> DualCheckResult {
        let protocol_outcome = protocol
            .as_ref()
            .filter(|p| !p.is_cancelled())
            .map(|p| PathOutcome {
                success: p.success,
                credit: p.credit,
            });
        let endpoint_outcome = endpoint
            .as_ref()
            .filter(|e| !e.is_cancelled())
            .map(|e| if e.success { PathOutcome::passed() } else { PathOutcome::failed() });

        let verdict = evaluate(&self.scoring, protocol_outcome, endpoint_outcome);

        let latencies: Vec<f64> = protocol
            .iter()
            .map(|p| p.response_time_ms)
            .chain(endpoint.iter().map(|e| e.response_time_ms))
            .collect();
        let combined_response_time_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        DualCheckResult {
            server_name: profile.name.clone(),
            timestamp: Utc::now(),
            protocol,
            endpoint,
            overall_status: verdict.overall_status,
            overall_success: verdict.overall_success,
            combined_response_time_ms,
            health_score: verdict.health_score,
            available_paths: verdict.available_paths,
        }
    }

    /// Result for a cycle whose probes never started
    fn not_run(&self, profile: &ServerProfile, error: CheckError) -> DualCheckResult {
        let protocol = profile
            .protocol_enabled()
            .then(|| ProtocolChecker::not_run(profile, error.clone()));
        let endpoint = profile
            .endpoint_enabled()
            .then(|| EndpointChecker::not_run(profile, error));
        self.combine(profile, protocol, endpoint)
    }

    /// Forget a server's single-flight slot
    pub fn retire(&self, server_name: &str) {
        self.in_flight.remove(server_name);
    }
}
