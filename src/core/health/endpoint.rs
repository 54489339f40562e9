//! HTTP status endpoint probe

use super::credentials::{CredentialProvider, StaticCredentials};
use super::transport::{EndpointTransport, HttpTransport, StatusResponse};
use super::types::EndpointCheckResult;
use crate::config::models::ServerProfile;
use crate::core::client::{CheckError, FailureSignal, ResilientClient, classify};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// `status` values read as healthy, compared case-insensitively
pub const HEALTHY_MARKERS: &[&str] = &["ok", "healthy", "up", "pass"];

/// Whether a status body declares itself healthy
pub fn has_health_indicator(body: &Map<String, Value>) -> bool {
    if body.get("healthy").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    body.get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| HEALTHY_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)))
}

/// Judge a status response against the profile
pub fn validate_status(profile: &ServerProfile, response: &StatusResponse) -> Result<(), CheckError> {
    if !profile.accepts_status(response.status) {
        return Err(classify(FailureSignal::status(
            response.status,
            format!("status endpoint returned HTTP {}", response.status),
        )));
    }
    if profile.validate_status_body {
        let healthy = response
            .body
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(has_health_indicator);
        if !healthy {
            return Err(CheckError::parsing(
                "status body carries no health indicator",
            ));
        }
    }
    Ok(())
}

/// Fetches a server's status endpoint and validates the reply
#[derive(Debug, Clone)]
pub struct EndpointChecker {
    transport: Arc<dyn EndpointTransport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for EndpointChecker {
    fn default() -> Self {
        Self::new(Arc::new(HttpTransport), Arc::new(StaticCredentials))
    }
}

impl EndpointChecker {
    pub fn new(
        transport: Arc<dyn EndpointTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub async fn check(
        &self,
        client: &ResilientClient,
        profile: &ServerProfile,
        cancel: &CancellationToken,
    ) -> EndpointCheckResult {
        let observed: Mutex<Option<StatusResponse>> = Mutex::new(None);
        let seen = &observed;
        let started = Instant::now();

        let outcome = client
            .execute(profile, cancel, move |_| async move {
                *seen.lock() = None;
                let headers = self.credentials.headers(profile).await?;
                let response = self.transport.fetch(profile, &headers).await?;
                *seen.lock() = Some(response.clone());
                validate_status(profile, &response)
            })
            .await;

        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let observed = observed.into_inner();
        let validation_error = match (&outcome, &observed) {
            (Err(error), Some(_)) if !matches!(error, CheckError::Cancelled) => {
                Some(error.to_string())
            }
            _ => None,
        };

        EndpointCheckResult {
            server_name: profile.name.clone(),
            timestamp: Utc::now(),
            success: outcome.is_ok(),
            reachable: observed.is_some(),
            response_time_ms,
            status_code: observed.as_ref().map(|r| r.status),
            body: observed.and_then(|r| match r.body {
                Some(Value::Object(map)) => Some(map),
                _ => None,
            }),
            error: outcome.err(),
            validation_error,
        }
    }

    /// A status result for a probe that never ran
    pub fn not_run(profile: &ServerProfile, error: CheckError) -> EndpointCheckResult {
        EndpointCheckResult {
            server_name: profile.name.clone(),
            timestamp: Utc::now(),
            success: false,
            reachable: false,
            response_time_ms: 0.0,
            status_code: None,
            body: None,
            error: Some(error),
            validation_error: None,
        }
    }
}
