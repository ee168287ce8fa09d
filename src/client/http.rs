//! HTTP client for the transmission simulation service.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{ClientError, SimulationClient};
use crate::models::{SimulationConfig, SimulationResult};

/// Path of the transmit endpoint, relative to the service base URL.
pub const TRANSMIT_PATH: &str = "/api/transmit";

/// Connection settings for [`HttpSimulationClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the service, e.g. `http://localhost:8000`.
    pub api_url: String,
    /// Per-request timeout. `None` waits for the service indefinitely.
    pub timeout_seconds: Option<u64>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Talks to the simulator over `POST /api/transmit`.
pub struct HttpSimulationClient {
    config: HttpClientConfig,
    transmit_url: String,
    http_client: reqwest::Client,
}

impl HttpSimulationClient {
    /// Build a client for the given service.
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http_client = builder
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let transmit_url = format!("{}{}", config.api_url.trim_end_matches('/'), TRANSMIT_PATH);

        Ok(Self {
            config,
            transmit_url,
            http_client,
        })
    }
}

#[async_trait]
impl SimulationClient for HttpSimulationClient {
    fn endpoint(&self) -> &str {
        &self.transmit_url
    }

    async fn transmit(&self, config: &SimulationConfig) -> Result<SimulationResult, ClientError> {
        debug!("POST {} {:?}", self.transmit_url, config);

        let response = self
            .http_client
            .post(&self.transmit_url)
            .json(config)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.config.timeout_seconds.unwrap_or_default())
                } else if e.is_connect() {
                    ClientError::Connect(self.config.api_url.clone())
                } else {
                    ClientError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected { status, body });
        }

        response
            .json::<SimulationResult>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
