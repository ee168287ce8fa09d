//! SatDash - session aggregator for a satellite-link simulation service
//!
//! A CLI tool that submits transmissions to the simulation service one at a
//! time, classifies every returned frame and reports session statistics.
//!
//! Exit codes:
//!   0 - Success (no --fail-below set, or success rate at or above it)
//!   1 - Runtime error (invalid arguments, config, service unreachable, etc.)
//!   2 - Session success rate below the --fail-below threshold

mod analysis;
mod cli;
mod client;
mod config;
mod models;
mod plan;
mod report;
mod session;
mod shell;

use anyhow::{bail, Context, Result};
use cli::Args;
use client::{HttpClientConfig, HttpSimulationClient};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::SimulationConfig;
use session::{SessionController, SessionView, SubmitError};
use shell::{Shell, ShellContext};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the file can raise verbosity
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("SatDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run_session(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Session failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .satdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the service URL, channel parameters, and report.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Report settings shared by batch mode and the shell's `save`.
#[derive(Clone)]
struct ReportTarget {
    api_url: String,
    format: cli::OutputFormat,
    include_frames: bool,
    started: Instant,
}

impl ReportTarget {
    fn write(&self, view: &SessionView, path: &Path, failed: usize) -> Result<()> {
        let report = report::build_report(
            view,
            &self.api_url,
            failed,
            self.started.elapsed().as_secs_f64(),
            self.include_frames,
        );
        report::write_report(&report, self.format, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

/// Run a batch or interactive session. Returns exit code (0 or 2).
async fn run_session(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let base = config.simulation.to_simulation_config();
    if let Err(e) = base.validate() {
        bail!("Invalid simulation parameters: {}", e);
    }

    let plan = plan::build_plan(&base, config.simulation.runs, config.simulation.snr_step);

    // Handle --dry-run: print the plan and exit
    if args.dry_run {
        return handle_dry_run(&config, &plan);
    }

    // Step 1: Connect the client
    println!("🛰️  Simulation service: {}", config.server.api_url);
    match config.server.timeout_seconds {
        Some(timeout) => println!("   Timeout: {}s", timeout),
        None => println!("   Timeout: none"),
    }

    let client = HttpSimulationClient::new(HttpClientConfig {
        api_url: config.server.api_url.clone(),
        timeout_seconds: config.server.timeout_seconds,
    })
    .context("Failed to create simulation client")?;

    let controller = SessionController::new(client);

    let target = ReportTarget {
        api_url: config.server.api_url.clone(),
        format: config.report.format,
        include_frames: config.report.include_frames,
        started: start_time,
    };
    let report_path = PathBuf::from(&config.report.output);

    // Step 2: Run the session
    let (failed, aborted) = if args.interactive {
        let save_target = target.clone();
        let mut shell = Shell::new(
            &controller,
            ShellContext {
                config: base,
                default_report_path: report_path.clone(),
                save: Box::new(move |view: &SessionView, path: &Path, failed: usize| {
                    save_target.write(view, path, failed)
                }),
            },
        );
        shell.run().await?;
        (shell.failed_submissions(), None)
    } else {
        run_batch(
            &controller,
            &plan,
            config.general.stop_on_error,
            args.quiet,
        )
        .await
    };

    let view = controller.snapshot();
    let duration = start_time.elapsed().as_secs_f64();

    // Step 3: Print summary
    println!("\n📊 Session Summary:");
    for line in report::generate_summary_text(&view.stats).lines() {
        println!("   {}", line);
    }
    if failed > 0 {
        println!("   Failed submissions: {}", failed);
    }
    println!("   Duration: {:.1}s", duration);

    // Step 4: Write the report
    if config.report.enabled {
        target.write(&view, &report_path, failed)?;
        println!("\n✅ Session complete! Report saved to: {}", report_path.display());
    } else {
        println!("\n✅ Session complete!");
    }

    if let Some(e) = aborted {
        return Err(anyhow::Error::new(e).context("Batch aborted after a failed transmission"));
    }

    // Check --fail-below threshold
    if let Some(threshold) = config.report.fail_below {
        if view.stats.success_rate < threshold {
            eprintln!(
                "\n⛔ Success rate {:.1}% is below {:.1}%. Failing (exit code 2).",
                view.stats.success_rate, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Submit every planned transmission in order.
///
/// Returns the number of failed submissions and, when `stop_on_error` cut
/// the batch short, the error that did it.
async fn run_batch(
    controller: &SessionController<HttpSimulationClient>,
    plan: &[SimulationConfig],
    stop_on_error: bool,
    quiet: bool,
) -> (usize, Option<SubmitError>) {
    println!("\n📡 Submitting {} transmission(s)...\n", plan.len());

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(plan.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let mut failed = 0;
    for (i, config) in plan.iter().enumerate() {
        progress.set_message(plan::describe(config));

        match controller.submit(*config).await {
            Ok(result) => {
                let outcome = analysis::classify(&result);
                debug!("Run {} -> {}", i + 1, outcome);
            }
            Err(e) => {
                failed += 1;
                warn!("Transmission {} failed: {}", i + 1, e);
                if stop_on_error {
                    progress.abandon_with_message("aborted");
                    return (failed, Some(e));
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("done");
    (failed, None)
}

/// Handle --dry-run: print the planned transmissions, exit.
fn handle_dry_run(config: &Config, plan: &[SimulationConfig]) -> Result<i32> {
    println!("\n🔍 Dry run: planned transmissions (no service calls)...\n");
    println!("   Service: {}", config.server.api_url);
    println!("   Found {} transmission(s) that would be submitted:\n", plan.len());

    for (i, planned) in plan.iter().enumerate() {
        println!("     {:>3}. {}", i + 1, plan::describe(planned));
    }

    println!("\n✅ Dry run complete. No requests were sent.");
    Ok(0)
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(e))),
    }
}
