//! Credentials attached to probe requests

use crate::config::models::ServerProfile;
use crate::core::client::CheckError;
use async_trait::async_trait;

/// Header name/value pairs sent with a probe
pub type HeaderSet = Vec<(String, String)>;

/// Source of the headers attached to every probe of a server.
///
/// Token acquisition and refresh belong to the implementor; a failure here
/// surfaces as an authentication error and is never retried.
#[async_trait]
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    async fn headers(&self, profile: &ServerProfile) -> Result<HeaderSet, CheckError>;
}

/// Static headers and credentials taken from the server profile
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCredentials;

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn headers(&self, profile: &ServerProfile) -> Result<HeaderSet, CheckError> {
        let mut headers: HeaderSet = profile
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.sort();
        if let Some(auth) = profile.auth.header() {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case(&auth.0));
            headers.push(auth);
        }
        Ok(headers)
    }
}
