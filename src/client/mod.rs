//! Simulation service clients.
//!
//! The session core only sees the [`SimulationClient`] trait; the HTTP
//! implementation talks to the remote transmission simulator.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{SimulationConfig, SimulationResult};

pub use http::{HttpClientConfig, HttpSimulationClient};

/// Errors that end a single simulation round-trip.
///
/// Every variant is terminal for that round-trip only. Callers may submit
/// again; nothing is retried automatically.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Cannot connect to simulation service at {0}")]
    Connect(String),

    #[error("Simulation request timed out after {0}s")]
    Timeout(u64),

    #[error("Simulation failed (HTTP {status})")]
    Rejected { status: u16, body: String },

    #[error("Failed to decode simulation result: {0}")]
    Decode(String),

    #[error("Failed to send simulation request: {0}")]
    Transport(String),
}

/// Anything that can run one transmission for a configuration.
#[async_trait]
pub trait SimulationClient: Send + Sync {
    /// Human-readable description of where requests go.
    fn endpoint(&self) -> &str;

    /// Run one transmission. A single best-effort attempt.
    async fn transmit(&self, config: &SimulationConfig) -> Result<SimulationResult, ClientError>;
}
