//! Redis-compatible REST client for the external key-value store

use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

/// Client for the store's REST API (GET /get/{key}, POST /set/{key})
#[derive(Clone)]
pub struct KvClient {
    client: Client,
    base_url: String,
    token: String,
}

/// Wire shape of a command response
#[derive(Debug, Deserialize)]
struct CommandResponse {
    result: Option<String>,
}

impl KvClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.kv_rest_url.trim_end_matches('/').to_string(),
            token: config.kv_rest_token.clone(),
        }
    }

    /// Fetch the raw string value stored under `key`, if any
    pub async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = format!("{}/get/{}", self.base_url, key);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(KvError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KvError::Api { status: status.as_u16(), body });
        }

        let parsed: CommandResponse = response.json().await.map_err(KvError::Request)?;
        Ok(parsed.result)
    }

    /// Store `value` under `key`, overwriting any previous value
    pub async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let url = format!("{}/set/{}", self.base_url, key);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .body(value)
            .send()
            .await
            .map_err(KvError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KvError::Api { status: status.as_u16(), body });
        }

        Ok(())
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode stored value: {0}")]
    Decode(#[from] serde_json::Error),
}
