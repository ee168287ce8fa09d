//! Per-frame outcome classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::SimulationResult;

/// How a frame ended up, as shown on the frame timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Static ECC delivered the frame
    EccSuccess,
    /// The AI decoder had to step in
    AiCorrected,
    /// Neither mechanism recovered the frame
    Failed,
}

impl Outcome {
    /// Everything except `Failed` counts toward the success rate.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed)
    }

    /// Returns an emoji representation of the outcome.
    pub fn emoji(&self) -> &'static str {
        match self {
            Outcome::EccSuccess => "🟢",
            Outcome::AiCorrected => "🟡",
            Outcome::Failed => "🔴",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::EccSuccess => write!(f, "ECC Success"),
            Outcome::AiCorrected => write!(f, "AI Corrected"),
            Outcome::Failed => write!(f, "Failed"),
        }
    }
}

/// Classify a result. Only `ai_corrected` and `ecc_used` are consulted,
/// and AI correction wins over ECC.
pub fn classify(result: &SimulationResult) -> Outcome {
    if result.ai_corrected {
        Outcome::AiCorrected
    } else if result.ecc_used.used {
        Outcome::EccSuccess
    } else {
        Outcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EccScheme, EccUsage};

    fn result(ecc_used: EccUsage, ai_corrected: bool) -> SimulationResult {
        SimulationResult {
            success: true,
            ber_before: 0.1,
            ber_after: 0.01,
            ecc_used,
            noise_type: "awgn".to_string(),
            ai_corrected,
            latency_ms: 1.0,
        }
    }

    #[test]
    fn test_ai_correction_takes_precedence() {
        for ecc in [
            EccUsage::flag(false),
            EccUsage::flag(true),
            EccUsage::scheme(EccScheme::Crc),
            EccUsage::from_name("unknown"),
        ] {
            assert_eq!(classify(&result(ecc, true)), Outcome::AiCorrected);
        }
    }

    #[test]
    fn test_ecc_truthy_in_either_shape() {
        assert_eq!(
            classify(&result(EccUsage::flag(true), false)),
            Outcome::EccSuccess
        );
        assert_eq!(
            classify(&result(EccUsage::scheme(EccScheme::ReedSolomon), false)),
            Outcome::EccSuccess
        );
        assert_eq!(
            classify(&result(EccUsage::from_name(""), false)),
            Outcome::Failed
        );
        assert_eq!(
            classify(&result(EccUsage::flag(false), false)),
            Outcome::Failed
        );
    }

    #[test]
    fn test_other_fields_are_ignored() {
        let mut r = result(EccUsage::flag(true), false);
        r.success = false;
        r.ber_after = 0.9;
        r.latency_ms = 10_000.0;
        assert_eq!(classify(&r), Outcome::EccSuccess);
    }

    #[test]
    fn test_outcome_success_flag() {
        assert!(Outcome::EccSuccess.is_success());
        assert!(Outcome::AiCorrected.is_success());
        assert!(!Outcome::Failed.is_success());
        assert_eq!(Outcome::Failed.emoji(), "🔴");
    }
}
