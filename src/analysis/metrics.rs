//! Session statistics.
//!
//! [`MetricsAggregator`] keeps running sums so that recording a frame is
//! O(1) regardless of session length. [`SessionStats::from_frames`] walks
//! the full history instead and must always agree with the running sums.
//!
//! Frames whose `ber_after` is zero have an unbounded improvement ratio.
//! They are left out of `average_ber_improvement` and counted separately
//! in `unbounded_improvements`.

use serde::{Deserialize, Serialize};

use super::classifier::{classify, Outcome};
use crate::models::{Frame, SimulationResult};

/// Frame counts per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub ecc_success: usize,
    pub ai_corrected: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::EccSuccess => self.ecc_success += 1,
            Outcome::AiCorrected => self.ai_corrected += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Number of frames counted.
    pub fn total(&self) -> usize {
        self.ecc_success + self.ai_corrected + self.failed
    }

    /// Frames whose outcome counts as a success.
    pub fn successes(&self) -> usize {
        [
            (Outcome::EccSuccess, self.ecc_success),
            (Outcome::AiCorrected, self.ai_corrected),
            (Outcome::Failed, self.failed),
        ]
        .into_iter()
        .filter(|(outcome, _)| outcome.is_success())
        .map(|(_, count)| count)
        .sum()
    }
}

/// Summary statistics for the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Percentage of frames not classified as failed, in `[0, 100]`.
    pub success_rate: f64,
    /// Mean `ber_before / ber_after` over frames with a finite ratio.
    pub average_ber_improvement: f64,
    /// Number of frames in the session.
    pub total_frames: usize,
    /// Mean service latency in milliseconds.
    pub average_latency: f64,
    /// Frame counts per outcome.
    pub outcomes: OutcomeCounts,
    /// Frames excluded from the improvement mean because `ber_after` was zero.
    pub unbounded_improvements: usize,
    /// Percent BER reduction of the most recent frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_ber_reduction: Option<f64>,
}

impl SessionStats {
    /// Recompute everything from the full frame history.
    pub fn from_frames(frames: &[Frame]) -> Self {
        let total_frames = frames.len();
        if total_frames == 0 {
            return Self::default();
        }

        let mut outcomes = OutcomeCounts::default();
        for frame in frames {
            outcomes.record(classify(&frame.result));
        }

        let ratios: Vec<f64> = frames
            .iter()
            .filter_map(|f| improvement_ratio(&f.result))
            .collect();
        let average_ber_improvement = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        };

        let average_latency =
            frames.iter().map(|f| f.result.latency_ms).sum::<f64>() / total_frames as f64;

        let latest_ber_reduction = frames
            .last()
            .and_then(|f| reduction_percent(f.result.ber_before, f.result.ber_after));

        Self {
            success_rate: success_rate(outcomes.successes(), total_frames),
            average_ber_improvement,
            total_frames,
            average_latency,
            outcomes,
            unbounded_improvements: frames
                .iter()
                .filter(|f| f.result.ber_after == 0.0)
                .count(),
            latest_ber_reduction,
        }
    }
}

/// Incrementally maintained session statistics.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    outcomes: OutcomeCounts,
    latency_sum: f64,
    improvement_sum: f64,
    improvement_frames: usize,
    unbounded_improvements: usize,
    latest: Option<(f64, f64)>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result into the running sums and return its outcome.
    pub fn record(&mut self, result: &SimulationResult) -> Outcome {
        let outcome = classify(result);
        self.outcomes.record(outcome);
        self.latency_sum += result.latency_ms;

        if let Some(ratio) = improvement_ratio(result) {
            self.improvement_sum += ratio;
            self.improvement_frames += 1;
        } else if result.ber_after == 0.0 {
            self.unbounded_improvements += 1;
        }

        self.latest = Some((result.ber_before, result.ber_after));
        outcome
    }

    /// Forget everything. Used when the session is cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current statistics.
    pub fn stats(&self) -> SessionStats {
        let total_frames = self.outcomes.total();
        if total_frames == 0 {
            return SessionStats::default();
        }

        let average_ber_improvement = if self.improvement_frames == 0 {
            0.0
        } else {
            self.improvement_sum / self.improvement_frames as f64
        };

        SessionStats {
            success_rate: success_rate(self.outcomes.successes(), total_frames),
            average_ber_improvement,
            total_frames,
            average_latency: self.latency_sum / total_frames as f64,
            outcomes: self.outcomes,
            unbounded_improvements: self.unbounded_improvements,
            latest_ber_reduction: self
                .latest
                .and_then(|(before, after)| reduction_percent(before, after)),
        }
    }
}

fn success_rate(successes: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * successes as f64 / total as f64
    }
}

/// `ber_before / ber_after`, or `None` when the ratio is not finite.
pub fn improvement_ratio(result: &SimulationResult) -> Option<f64> {
    if result.ber_after <= 0.0 {
        return None;
    }

    let ratio = result.ber_before / result.ber_after;
    ratio.is_finite().then_some(ratio)
}

/// Percent reduction from `before` to `after`.
pub fn reduction_percent(before: f64, after: f64) -> Option<f64> {
    if before > 0.0 {
        Some((before - after) / before * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EccUsage, FrameId, SimulationConfig};

    fn create_test_result(ber_before: f64, ber_after: f64, latency_ms: f64) -> SimulationResult {
        SimulationResult {
            success: true,
            ber_before,
            ber_after,
            ecc_used: EccUsage::flag(true),
            noise_type: "awgn".to_string(),
            ai_corrected: false,
            latency_ms,
        }
    }

    fn frames_from(results: Vec<SimulationResult>) -> Vec<Frame> {
        results
            .into_iter()
            .enumerate()
            .map(|(i, result)| Frame {
                id: FrameId(i as u64 + 1),
                config: SimulationConfig::default(),
                result,
            })
            .collect()
    }

    #[test]
    fn test_empty_session_is_all_zero() {
        let stats = MetricsAggregator::new().stats();
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_latency, 0.0);
        assert_eq!(stats.average_ber_improvement, 0.0);
        assert_eq!(stats.latest_ber_reduction, None);
        assert_eq!(SessionStats::from_frames(&[]), stats);
    }

    #[test]
    fn test_three_frame_scenario() {
        let results = vec![
            create_test_result(0.25, 0.125, 100.0),
            create_test_result(0.5, 0.125, 200.0),
            create_test_result(0.75, 0.125, 300.0),
        ];

        let mut aggregator = MetricsAggregator::new();
        for r in &results {
            aggregator.record(r);
        }
        let stats = aggregator.stats();

        assert_eq!(stats.success_rate, 100.0);
        assert_eq!(stats.average_latency, 200.0);
        assert_eq!(stats.average_ber_improvement, 4.0);
        assert_eq!(stats.total_frames, 3);
        assert_eq!(stats.outcomes.ecc_success, 3);
    }

    #[test]
    fn test_zero_ber_after_excluded_from_mean() {
        let results = vec![
            create_test_result(0.5, 0.25, 10.0),
            create_test_result(0.5, 0.0, 10.0),
        ];

        let mut aggregator = MetricsAggregator::new();
        for r in &results {
            aggregator.record(r);
        }
        let stats = aggregator.stats();

        assert_eq!(stats.average_ber_improvement, 2.0);
        assert_eq!(stats.unbounded_improvements, 1);
        assert!(stats.average_ber_improvement.is_finite());
        assert_eq!(stats.latest_ber_reduction, Some(100.0));
    }

    #[test]
    fn test_success_rate_counts_ai_corrected() {
        let mut ai = create_test_result(0.2, 0.1, 5.0);
        ai.ai_corrected = true;
        ai.ecc_used = EccUsage::flag(false);
        let mut failed = create_test_result(0.2, 0.2, 5.0);
        failed.ecc_used = EccUsage::flag(false);

        let mut aggregator = MetricsAggregator::new();
        aggregator.record(&create_test_result(0.2, 0.1, 5.0));
        aggregator.record(&ai);
        aggregator.record(&failed);
        aggregator.record(&failed);

        let stats = aggregator.stats();
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(
            stats.outcomes,
            OutcomeCounts {
                ecc_success: 1,
                ai_corrected: 1,
                failed: 2,
            }
        );
    }

    #[test]
    fn test_reset_clears_running_sums() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.record(&create_test_result(0.5, 0.25, 50.0));
        aggregator.reset();

        let stats = aggregator.stats();
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_latency, 0.0);
    }

    #[test]
    fn test_running_sums_match_full_recompute() {
        let mut results = Vec::new();
        for i in 0..25u32 {
            let mut r = create_test_result(
                0.01 * f64::from(i % 7 + 1),
                if i % 5 == 0 { 0.0 } else { 0.001 * f64::from(i % 3 + 1) },
                f64::from(i) * 3.5,
            );
            r.ai_corrected = i % 4 == 0;
            r.ecc_used = EccUsage::flag(i % 3 != 0);
            results.push(r);
        }

        let mut aggregator = MetricsAggregator::new();
        for r in &results {
            aggregator.record(r);
        }

        let running = aggregator.stats();
        let full = SessionStats::from_frames(&frames_from(results));

        assert_eq!(running.total_frames, full.total_frames);
        assert_eq!(running.outcomes, full.outcomes);
        assert_eq!(running.unbounded_improvements, full.unbounded_improvements);
        assert!((running.success_rate - full.success_rate).abs() < 1e-9);
        assert!((running.average_latency - full.average_latency).abs() < 1e-9);
        assert!((running.average_ber_improvement - full.average_ber_improvement).abs() < 1e-9);
        assert_eq!(running.latest_ber_reduction, full.latest_ber_reduction);
        assert!((0.0..=100.0).contains(&running.success_rate));
    }

    #[test]
    fn test_successes_follow_outcome_rule() {
        let counts = OutcomeCounts {
            ecc_success: 3,
            ai_corrected: 2,
            failed: 4,
        };
        assert_eq!(counts.successes(), 5);
        assert_eq!(counts.total(), 9);
    }

    #[test]
    fn test_latest_ber_reduction_tracks_last_frame() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.record(&create_test_result(0.5, 0.5, 1.0));
        aggregator.record(&create_test_result(0.5, 0.125, 1.0));
        assert_eq!(aggregator.stats().latest_ber_reduction, Some(75.0));

        aggregator.record(&create_test_result(0.0, 0.0, 1.0));
        assert_eq!(aggregator.stats().latest_ber_reduction, None);
        assert_eq!(reduction_percent(0.0, 0.0), None);
    }
}
