//! Transport abstraction for CRL and bundle downloads.

use async_trait::async_trait;

/// A failed HTTP exchange, with enough context to log and cache.
#[derive(Debug, Clone, thiserror::Error)]
#[error("request to '{url}' failed: {reason}")]
pub struct HttpError {
    pub url: String,
    pub reason: String,
}

/// Minimal GET-only client the trust store performs its downloads through.
///
/// Object safe so the store can hold `Arc<dyn HttpClient>` and tests can swap
/// in a canned transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// The disabled transport: every request fails. Installed when automatic
/// downloads are turned off.
#[async_trait]
impl HttpClient for () {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        Err(HttpError {
            url: url.to_string(),
            reason: "automatic downloads are disabled".to_string(),
        })
    }
}
