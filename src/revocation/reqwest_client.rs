//! Default [`HttpClient`] backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;

use super::http::{HttpClient, HttpError};

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let error = |reason: String| HttpError {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(error(format!("status {}", response.status())));
        }
        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| error(e.to_string()))
    }
}
