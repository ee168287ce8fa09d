//! Batch planning: the list of configurations a batch run will submit.

use crate::models::SimulationConfig;

/// Build the configurations for a batch of `runs` transmissions.
///
/// Without a step every run reuses `base`. With a step the SNR moves by
/// `step` per run, snapped to the control grid and clamped into range.
pub fn build_plan(base: &SimulationConfig, runs: usize, snr_step: Option<f64>) -> Vec<SimulationConfig> {
    (0..runs)
        .map(|i| match snr_step {
            Some(step) => SimulationConfig {
                snr_db: SimulationConfig::snap_snr(base.snr_db + step * i as f64),
                ..*base
            },
            None => *base,
        })
        .collect()
}

/// One-line description of a planned transmission.
pub fn describe(config: &SimulationConfig) -> String {
    let ecc = if config.auto_ecc {
        format!("{} (auto)", config.ecc_scheme)
    } else {
        config.ecc_scheme.to_string()
    };

    format!(
        "{} bytes @ {:.1} dB, {} noise, ECC {}",
        config.payload_size, config.snr_db, config.noise_type, ecc
    )
}
