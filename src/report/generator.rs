//! Session report generation.
//!
//! This module renders a [`SessionReport`] as Markdown or JSON and builds
//! the short text summary printed at the end of a run.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::analysis::{classify, Outcome, SessionStats};
use crate::cli::OutputFormat;
use crate::models::{BerPoint, Frame, ReportMetadata, SessionReport};
use crate::session::SessionView;

/// Assemble a report from a session view.
pub fn build_report(
    view: &SessionView,
    api_url: &str,
    submissions_failed: usize,
    duration_seconds: f64,
    include_frames: bool,
) -> SessionReport {
    SessionReport {
        metadata: ReportMetadata {
            api_url: api_url.to_string(),
            generated_at: Utc::now(),
            frames_recorded: view.frames.len(),
            submissions_failed,
            duration_seconds,
        },
        stats: view.stats.clone(),
        ber_history: view.ber_history.clone(),
        frames: if include_frames {
            view.frames.as_ref().clone()
        } else {
            Vec::new()
        },
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SessionReport) -> String {
    let mut output = String::new();

    output.push_str("# SatDash Session Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_metrics_section(&report.stats));
    output.push_str(&generate_history_section(&report.ber_history));

    if !report.frames.is_empty() {
        output.push_str(&generate_frames_section(&report.frames));
    }

    output.push_str("---\n\n");
    output.push_str("*Report generated by SatDash*\n");

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Service:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Frames Recorded:** {}\n",
        metadata.frames_recorded
    ));
    if metadata.submissions_failed > 0 {
        section.push_str(&format!(
            "- **Failed Submissions:** {}\n",
            metadata.submissions_failed
        ));
    }
    section.push_str(&format!(
        "- **Session Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_metrics_section(stats: &SessionStats) -> String {
    let mut section = String::new();

    section.push_str("## Performance Metrics\n\n");
    section.push_str("| Success Rate | BER Improvement | Total Frames | Avg Latency |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {:.1}% | {:.2}x | {} | {:.1}ms |\n\n",
        stats.success_rate, stats.average_ber_improvement, stats.total_frames, stats.average_latency
    ));

    if stats.unbounded_improvements > 0 {
        section.push_str(&format!(
            "*{} frame(s) reached zero residual BER and are not included in the improvement average.*\n\n",
            stats.unbounded_improvements
        ));
    }

    section.push_str("### Frame Outcomes\n\n");
    section.push_str(&format!(
        "| {} {} | {} {} | {} {} |\n",
        Outcome::EccSuccess.emoji(),
        Outcome::EccSuccess,
        Outcome::AiCorrected.emoji(),
        Outcome::AiCorrected,
        Outcome::Failed.emoji(),
        Outcome::Failed
    ));
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        stats.outcomes.ecc_success, stats.outcomes.ai_corrected, stats.outcomes.failed
    ));

    section
}

fn generate_history_section(history: &[BerPoint]) -> String {
    let mut section = String::new();

    section.push_str("## BER History\n\n");

    if history.is_empty() {
        section.push_str("No frames simulated yet.\n\n");
        return section;
    }

    section.push_str("| Run | BER Before | BER After |\n");
    section.push_str("|---:|---:|---:|\n");
    for point in history {
        section.push_str(&format!(
            "| {} | {:.3e} | {:.3e} |\n",
            point.run, point.ber_before, point.ber_after
        ));
    }
    section.push('\n');

    section
}

fn generate_frames_section(frames: &[Frame]) -> String {
    let mut section = String::new();

    section.push_str("## Frames\n\n");
    section.push_str("| Run | Frame | Payload | SNR | Noise | ECC | Outcome | Latency |\n");
    section.push_str("|---:|:---|---:|---:|:---|:---|:---|---:|\n");

    for (i, frame) in frames.iter().enumerate() {
        let outcome = classify(&frame.result);
        section.push_str(&format!(
            "| {} | {} | {} B | {:.1} dB | {} | {} | {} {} | {:.1}ms |\n",
            i + 1,
            frame.id,
            frame.config.payload_size,
            frame.config.snr_db,
            frame.result.noise_type,
            frame.result.ecc_used,
            outcome.emoji(),
            outcome,
            frame.result.latency_ms
        ));
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render and write a report in the requested format.
pub fn write_report(report: &SessionReport, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Markdown => generate_markdown_report(report),
    };

    std::fs::write(path, content)?;
    Ok(())
}

/// Short multi-line summary for the terminal.
pub fn generate_summary_text(stats: &SessionStats) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Total Frames: {}", stats.total_frames));
    lines.push(format!("Success Rate: {:.1}%", stats.success_rate));
    lines.push(format!(
        "BER Improvement: {:.2}x",
        stats.average_ber_improvement
    ));
    lines.push(format!("Avg Latency: {:.1}ms", stats.average_latency));
    lines.push(format!(
        "{} {}: {} | {} {}: {} | {} {}: {}",
        Outcome::EccSuccess.emoji(),
        Outcome::EccSuccess,
        stats.outcomes.ecc_success,
        Outcome::AiCorrected.emoji(),
        Outcome::AiCorrected,
        stats.outcomes.ai_corrected,
        Outcome::Failed.emoji(),
        Outcome::Failed,
        stats.outcomes.failed
    ));

    if let Some(reduction) = stats.latest_ber_reduction {
        lines.push(format!("Latest BER Reduction: {:.1}%", reduction));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EccScheme, EccUsage, FrameId, SimulationConfig, SimulationResult};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_view() -> SessionView {
        let frames = vec![
            Frame {
                id: FrameId(1),
                config: SimulationConfig::default(),
                result: SimulationResult {
                    success: true,
                    ber_before: 0.04,
                    ber_after: 0.01,
                    ecc_used: EccUsage::scheme(EccScheme::ReedSolomon),
                    noise_type: "awgn".to_string(),
                    ai_corrected: false,
                    latency_ms: 12.0,
                },
            },
            Frame {
                id: FrameId(2),
                config: SimulationConfig::default(),
                result: SimulationResult {
                    success: true,
                    ber_before: 0.2,
                    ber_after: 0.0,
                    ecc_used: EccUsage::flag(false),
                    noise_type: "burst".to_string(),
                    ai_corrected: true,
                    latency_ms: 30.0,
                },
            },
        ];

        let stats = SessionStats::from_frames(&frames);
        let ber_history = frames
            .iter()
            .enumerate()
            .map(|(i, f)| BerPoint {
                run: i + 1,
                ber_before: f.result.ber_before,
                ber_after: f.result.ber_after,
            })
            .collect();

        SessionView {
            frames: Arc::new(frames),
            ber_history,
            stats,
            is_running: false,
            version: 2,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = build_report(&create_test_view(), "http://localhost:8000", 1, 3.5, true);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# SatDash Session Report"));
        assert!(markdown.contains("## Performance Metrics"));
        assert!(markdown.contains("| 100.0% | 4.00x | 2 | 21.0ms |"));
        assert!(markdown.contains("- **Failed Submissions:** 1"));
        assert!(markdown.contains("1 frame(s) reached zero residual BER"));
        assert!(markdown.contains("## BER History"));
        assert!(markdown.contains("| 2 | #2 |"));
        assert!(markdown.contains("AI Corrected"));
    }

    #[test]
    fn test_markdown_without_frames() {
        let report = build_report(&create_test_view(), "http://localhost:8000", 0, 1.0, false);
        let markdown = generate_markdown_report(&report);

        assert!(!markdown.contains("## Frames"));
        assert!(!markdown.contains("Failed Submissions"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report(&create_test_view(), "http://localhost:8000", 0, 1.0, true);
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["stats"]["total_frames"], 2);
        assert_eq!(value["stats"]["outcomes"]["ai_corrected"], 1);
        assert_eq!(value["ber_history"][1]["run"], 2);
        assert_eq!(value["frames"][0]["result"]["ecc_used"], "reed_solomon");
    }

    #[test]
    fn test_write_report_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");
        let report = build_report(&create_test_view(), "http://localhost:8000", 0, 1.0, false);

        write_report(&report, OutputFormat::Json, &path).unwrap();

        let written: SessionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.stats.total_frames, 2);
        assert!(written.frames.is_empty());
    }

    #[test]
    fn test_summary_text() {
        let summary = generate_summary_text(&create_test_view().stats);
        assert!(summary.contains("Total Frames: 2"));
        assert!(summary.contains("Success Rate: 100.0%"));
        assert!(summary.contains("Latest BER Reduction: 100.0%"));
    }
}
