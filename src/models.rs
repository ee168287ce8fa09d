//! Data models for the simulation dashboard.
//!
//! This module contains the wire records exchanged with the simulation
//! service (configurations and results) and the session-level records
//! built from them (frames, BER history points, reports).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::analysis::SessionStats;

/// Accepted payload sizes in bytes (one Reed-Solomon block at most).
pub const PAYLOAD_SIZE_RANGE: RangeInclusive<u32> = 4..=223;

/// Accepted signal-to-noise ratios in dB.
pub const SNR_DB_RANGE: RangeInclusive<f64> = 0.0..=20.0;

/// Granularity of the SNR control.
pub const SNR_DB_STEP: f64 = 0.5;

/// Channel noise model applied by the simulator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NoiseType {
    /// Additive white Gaussian noise
    #[default]
    Awgn,
    /// AWGN followed by burst errors
    Burst,
    /// Rayleigh fading
    Fading,
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseType::Awgn => write!(f, "awgn"),
            NoiseType::Burst => write!(f, "burst"),
            NoiseType::Fading => write!(f, "fading"),
        }
    }
}

impl FromStr for NoiseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awgn" => Ok(NoiseType::Awgn),
            "burst" => Ok(NoiseType::Burst),
            "fading" | "rayleigh" => Ok(NoiseType::Fading),
            other => Err(format!("Unknown noise type: {}", other)),
        }
    }
}

/// Static error-correcting code requested for a transmission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EccScheme {
    /// Reed-Solomon (255,223)
    #[default]
    #[value(alias = "reed_solomon", alias = "rs")]
    ReedSolomon,
    /// Hamming (7,4)
    Hamming,
    /// CRC-32 (detection only)
    Crc,
}

impl EccScheme {
    /// Returns the wire name of the scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            EccScheme::ReedSolomon => "reed_solomon",
            EccScheme::Hamming => "hamming",
            EccScheme::Crc => "crc",
        }
    }
}

impl fmt::Display for EccScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EccScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reed_solomon" | "reed-solomon" | "rs" => Ok(EccScheme::ReedSolomon),
            "hamming" => Ok(EccScheme::Hamming),
            "crc" | "crc32" | "crc-32" => Ok(EccScheme::Crc),
            other => Err(format!("Unknown ECC scheme: {}", other)),
        }
    }
}

/// One simulation request. Immutable once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Payload size in bytes.
    pub payload_size: u32,
    /// Channel SNR in dB.
    pub snr_db: f64,
    /// Noise model.
    pub noise_type: NoiseType,
    /// Requested ECC scheme (may be overridden when `auto_ecc` is set).
    pub ecc_scheme: EccScheme,
    /// Let the service's adaptive controller pick the scheme.
    #[serde(default)]
    pub auto_ecc: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            payload_size: 223,
            snr_db: 10.0,
            noise_type: NoiseType::Awgn,
            ecc_scheme: EccScheme::ReedSolomon,
            auto_ecc: false,
        }
    }
}

impl SimulationConfig {
    /// Check the ranges accepted by the control surface.
    ///
    /// The session core never calls this; range enforcement belongs to
    /// whatever builds the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !PAYLOAD_SIZE_RANGE.contains(&self.payload_size) {
            return Err(format!(
                "Payload size must be between {} and {} bytes",
                PAYLOAD_SIZE_RANGE.start(),
                PAYLOAD_SIZE_RANGE.end()
            ));
        }

        if !SNR_DB_RANGE.contains(&self.snr_db) {
            return Err(format!(
                "SNR must be between {} and {} dB",
                SNR_DB_RANGE.start(),
                SNR_DB_RANGE.end()
            ));
        }

        if (self.snr_db / SNR_DB_STEP).fract() != 0.0 {
            return Err(format!("SNR must be a multiple of {} dB", SNR_DB_STEP));
        }

        Ok(())
    }

    /// Round an SNR value onto the control grid and clamp it into range.
    pub fn snap_snr(snr_db: f64) -> f64 {
        let snapped = (snr_db / SNR_DB_STEP).round() * SNR_DB_STEP;
        snapped.clamp(*SNR_DB_RANGE.start(), *SNR_DB_RANGE.end())
    }
}

/// Whether (and which) static ECC handled a frame.
///
/// The service reports this field either as a boolean or as the name of
/// the scheme it ran. Both shapes decode into this struct; a non-empty
/// name counts as used even when it is not a scheme we know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EccUsage {
    pub used: bool,
    pub scheme: Option<EccScheme>,
}

impl EccUsage {
    /// ECC ran with a known scheme.
    pub fn scheme(scheme: EccScheme) -> Self {
        Self {
            used: true,
            scheme: Some(scheme),
        }
    }

    /// Plain boolean report without a scheme name.
    pub fn flag(used: bool) -> Self {
        Self { used, scheme: None }
    }

    /// Decode a scheme name as sent on the wire.
    ///
    /// Only the empty string means "not used"; whitespace still counts.
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() {
            return Self::flag(false);
        }

        match name.trim().parse::<EccScheme>() {
            Ok(scheme) => Self::scheme(scheme),
            Err(_) => Self::flag(true),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEccUsage {
    Flag(bool),
    Name(String),
}

impl<'de> Deserialize<'de> for EccUsage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<RawEccUsage>::deserialize(deserializer)? {
            None => EccUsage::default(),
            Some(RawEccUsage::Flag(used)) => EccUsage::flag(used),
            Some(RawEccUsage::Name(name)) => EccUsage::from_name(&name),
        })
    }
}

impl Serialize for EccUsage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.scheme {
            Some(scheme) => serializer.serialize_str(scheme.as_str()),
            None => serializer.serialize_bool(self.used),
        }
    }
}

impl fmt::Display for EccUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.used, self.scheme) {
            (true, Some(scheme)) => write!(f, "{}", scheme),
            (true, None) => write!(f, "yes"),
            (false, _) => write!(f, "none"),
        }
    }
}

/// Outcome of one transmission as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Whether the service completed the round-trip.
    pub success: bool,
    /// Bit error rate before correction.
    pub ber_before: f64,
    /// Bit error rate after correction.
    pub ber_after: f64,
    /// ECC that handled the frame, if any.
    #[serde(default)]
    pub ecc_used: EccUsage,
    /// Noise model the service applied.
    pub noise_type: String,
    /// Whether the AI decoder resolved the frame.
    pub ai_corrected: bool,
    /// Service-side processing time.
    pub latency_ms: f64,
}

/// Unique, monotonically increasing frame identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One completed round-trip: the request and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub config: SimulationConfig,
    pub result: SimulationResult,
}

/// One point on the BER-over-runs chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BerPoint {
    /// 1-based position of the frame in the session.
    pub run: usize,
    pub ber_before: f64,
    pub ber_after: f64,
}

/// Metadata about a saved session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Base URL of the simulation service.
    pub api_url: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Submissions that returned a result.
    pub frames_recorded: usize,
    /// Submissions that failed and left the session untouched.
    pub submissions_failed: usize,
    /// Wall-clock duration of the session in seconds.
    pub duration_seconds: f64,
}

/// A complete session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub metadata: ReportMetadata,
    pub stats: SessionStats,
    pub ber_history: Vec<BerPoint>,
    /// Omitted when the report is configured without the frame table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}
