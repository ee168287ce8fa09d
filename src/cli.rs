//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. It is also the
//! input boundary where simulation parameters are range-checked; the
//! session core accepts any configuration it is given.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{EccScheme, NoiseType, PAYLOAD_SIZE_RANGE, SNR_DB_RANGE};

/// SatDash - drive a satellite-link transmission simulator and summarize the session
///
/// Submits transmissions to the simulation service one at a time, classifies
/// each frame (ECC success, AI corrected, failed) and reports success rate,
/// BER improvement and latency for the session.
///
/// Examples:
///   satdash --runs 20 --snr 8 --noise burst
///   satdash --runs 41 --snr 0 --snr-step 0.5 --format json -o sweep.json
///   satdash --interactive
///   satdash --runs 10 --dry-run
///   satdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Number of transmissions to submit
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub runs: Option<usize>,

    /// Payload size in bytes (4-223)
    #[arg(long, value_name = "BYTES")]
    pub payload_size: Option<u32>,

    /// Channel SNR in dB (0-20, step 0.5)
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    pub snr: Option<f64>,

    /// Increase the SNR by this much after every run (sweep mode)
    ///
    /// Values are snapped to the 0.5 dB grid and clamped to 0-20 dB.
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    pub snr_step: Option<f64>,

    /// Channel noise model
    #[arg(long, value_name = "TYPE")]
    pub noise: Option<NoiseType>,

    /// ECC scheme to request
    #[arg(long, value_name = "SCHEME")]
    pub ecc: Option<EccScheme>,

    /// Let the service's adaptive controller choose the ECC scheme
    #[arg(long)]
    pub auto_ecc: bool,

    /// Simulation service base URL
    #[arg(long, value_name = "URL", env = "SATDASH_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .satdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the session report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Do not write a report file
    #[arg(long, conflicts_with = "output")]
    pub no_report: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Start an interactive session shell instead of a batch run
    #[arg(short, long, conflicts_with = "dry_run")]
    pub interactive: bool,

    /// Print the planned transmissions without contacting the service
    #[arg(long)]
    pub dry_run: bool,

    /// Abort the batch at the first failed transmission
    #[arg(long)]
    pub stop_on_error: bool,

    /// Exit with code 2 if the session success rate ends below this percentage
    #[arg(long, value_name = "PERCENT")]
    pub fail_below: Option<f64>,

    /// Generate a default .satdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(runs) = self.runs {
            if runs == 0 {
                return Err("Runs must be at least 1".to_string());
            }
        }

        if let Some(size) = self.payload_size {
            if !PAYLOAD_SIZE_RANGE.contains(&size) {
                return Err(format!(
                    "Payload size must be between {} and {} bytes",
                    PAYLOAD_SIZE_RANGE.start(),
                    PAYLOAD_SIZE_RANGE.end()
                ));
            }
        }

        if let Some(snr) = self.snr {
            if !SNR_DB_RANGE.contains(&snr) {
                return Err(format!(
                    "SNR must be between {} and {} dB",
                    SNR_DB_RANGE.start(),
                    SNR_DB_RANGE.end()
                ));
            }
        }

        if let Some(step) = self.snr_step {
            if !step.is_finite() || step == 0.0 {
                return Err("SNR step must be a non-zero number".to_string());
            }
        }

        if let Some(threshold) = self.fail_below {
            if !(0.0..=100.0).contains(&threshold) {
                return Err("Fail-below threshold must be between 0 and 100".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting from the config
    /// file. `--quiet` always wins.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
