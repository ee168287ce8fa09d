//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.satdash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::models::{EccScheme, NoiseType, SimulationConfig};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".satdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Simulation service settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Default transmission parameters.
    #[serde(default)]
    pub simulation: SimulationDefaults,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Abort a batch at the first failed transmission.
    #[serde(default)]
    pub stop_on_error: bool,
}

/// Simulation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the simulation service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

/// Transmission parameters used when the CLI does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDefaults {
    /// Payload size in bytes.
    #[serde(default = "default_payload_size")]
    pub payload_size: u32,

    /// Channel SNR in dB.
    #[serde(default = "default_snr_db")]
    pub snr_db: f64,

    /// Noise model.
    #[serde(default)]
    pub noise_type: NoiseType,

    /// ECC scheme.
    #[serde(default)]
    pub ecc_scheme: EccScheme,

    /// Let the service choose the ECC scheme.
    #[serde(default)]
    pub auto_ecc: bool,

    /// Transmissions per batch.
    #[serde(default = "default_runs")]
    pub runs: usize,

    /// SNR increment between runs of a sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr_step: Option<f64>,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            payload_size: default_payload_size(),
            snr_db: default_snr_db(),
            noise_type: NoiseType::default(),
            ecc_scheme: EccScheme::default(),
            auto_ecc: false,
            runs: default_runs(),
            snr_step: None,
        }
    }
}

fn default_payload_size() -> u32 {
    223
}

fn default_snr_db() -> f64 {
    10.0
}

fn default_runs() -> usize {
    10
}

impl SimulationDefaults {
    /// The base configuration every planned run starts from.
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            payload_size: self.payload_size,
            snr_db: self.snr_db,
            noise_type: self.noise_type,
            ecc_scheme: self.ecc_scheme,
            auto_ecc: self.auto_ecc,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Write a report at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Include the per-frame table.
    #[serde(default = "default_true")]
    pub include_frames: bool,

    /// Exit with code 2 below this success rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_below: Option<f64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            enabled: true,
            include_frames: true,
            fail_below: None,
        }
    }
}

fn default_output() -> String {
    "satdash_report.md".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.satdash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they explicitly provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Server settings
        if let Some(ref url) = args.api_url {
            self.server.api_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = Some(timeout);
        }

        // Simulation parameters
        if let Some(size) = args.payload_size {
            self.simulation.payload_size = size;
        }
        if let Some(snr) = args.snr {
            self.simulation.snr_db = snr;
        }
        if let Some(noise) = args.noise {
            self.simulation.noise_type = noise;
        }
        if let Some(ecc) = args.ecc {
            self.simulation.ecc_scheme = ecc;
        }
        if args.auto_ecc {
            self.simulation.auto_ecc = true;
        }
        if let Some(runs) = args.runs {
            self.simulation.runs = runs;
        }
        if let Some(step) = args.snr_step {
            self.simulation.snr_step = Some(step);
        }

        // Report settings
        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.no_report {
            self.report.enabled = false;
        }
        if let Some(threshold) = args.fail_below {
            self.report.fail_below = Some(threshold);
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.stop_on_error {
            self.general.stop_on_error = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.api_url, "http://localhost:8000");
        assert_eq!(config.simulation.payload_size, 223);
        assert_eq!(config.simulation.snr_db, 10.0);
        assert_eq!(
            config.simulation.to_simulation_config(),
            SimulationConfig::default()
        );
        assert!(config.report.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
api_url = "http://sim.internal:9000"
timeout_seconds = 30

[simulation]
snr_db = 4.5
noise_type = "fading"
ecc_scheme = "hamming"
runs = 25

[report]
format = "json"
fail_below = 80.0
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.api_url, "http://sim.internal:9000");
        assert_eq!(config.server.timeout_seconds, Some(30));
        assert_eq!(config.simulation.snr_db, 4.5);
        assert_eq!(config.simulation.noise_type, NoiseType::Fading);
        assert_eq!(config.simulation.ecc_scheme, EccScheme::Hamming);
        assert_eq!(config.simulation.payload_size, 223);
        assert_eq!(config.simulation.runs, 25);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.fail_below, Some(80.0));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config: Config = toml::from_str(
            r#"
[simulation]
snr_db = 4.5
runs = 25
"#,
        )
        .unwrap();

        let args = Args::try_parse_from(["satdash", "--snr", "12", "--no-report"]).unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.simulation.snr_db, 12.0);
        assert_eq!(config.simulation.runs, 25);
        assert!(!config.report.enabled);
    }

    #[test]
    fn test_file_verbose_survives_merge() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = Args::try_parse_from(["satdash"]).unwrap();
        config.merge_with_args(&args);

        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[simulation]\nauto_ecc = true\n",
        )
        .unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert!(config.simulation.auto_ecc);

        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "not = [valid").unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[simulation]"));
        assert!(toml_str.contains("[report]"));

        let round_trip: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round_trip.simulation.runs, 10);
    }
}
