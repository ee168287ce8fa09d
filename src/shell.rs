//! Interactive session shell.
//!
//! A line-oriented front end over [`SessionController`]: each line is one
//! command, results are printed as they arrive.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::analysis::classify;
use crate::client::SimulationClient;
use crate::models::SimulationConfig;
use crate::plan::describe;
use crate::report::generate_summary_text;
use crate::session::{SessionController, SessionView, SubmitError};

const HELP: &str = "\
Commands:
  run [N]              submit N transmissions (default 1)
  set <field> <value>  change a parameter: payload, snr, noise, ecc, auto
  config               show the current parameters
  stats                show session statistics
  history              show the BER history
  frames               list recorded frames
  clear                drop all frames and reset statistics
  save [FILE]          write a session report
  help                 show this help
  quit                 leave the shell";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Run(usize),
    Set { field: String, value: String },
    Config,
    Stats,
    History,
    Frames,
    Clear,
    Save(Option<PathBuf>),
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Err("Empty command".to_string());
        };
        let rest: Vec<&str> = parts.collect();

        match command.to_lowercase().as_str() {
            "run" | "r" => match rest.as_slice() {
                [] => Ok(ShellCommand::Run(1)),
                [n] => match n.parse::<usize>() {
                    Ok(count) if count > 0 => Ok(ShellCommand::Run(count)),
                    _ => Err(format!("Invalid run count: {}", n)),
                },
                _ => Err("Usage: run [N]".to_string()),
            },
            "set" => match rest.as_slice() {
                [field, value] => Ok(ShellCommand::Set {
                    field: field.to_lowercase(),
                    value: value.to_string(),
                }),
                _ => Err("Usage: set <field> <value>".to_string()),
            },
            "config" => Ok(ShellCommand::Config),
            "stats" => Ok(ShellCommand::Stats),
            "history" => Ok(ShellCommand::History),
            "frames" => Ok(ShellCommand::Frames),
            "clear" => Ok(ShellCommand::Clear),
            "save" => Ok(ShellCommand::Save(rest.first().map(PathBuf::from))),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: {} (try 'help')", other)),
        }
    }
}

/// Apply `set <field> <value>` to a configuration.
///
/// The updated configuration must still pass range checks, otherwise the
/// original is left as it was.
pub fn apply_setting(config: &mut SimulationConfig, field: &str, value: &str) -> Result<(), String> {
    let mut updated = *config;

    match field {
        "payload" | "payload_size" => {
            updated.payload_size = value
                .parse()
                .map_err(|_| format!("Invalid payload size: {}", value))?;
        }
        "snr" | "snr_db" => {
            updated.snr_db = value
                .parse()
                .map_err(|_| format!("Invalid SNR: {}", value))?;
        }
        "noise" | "noise_type" => updated.noise_type = value.parse()?,
        "ecc" | "ecc_scheme" => updated.ecc_scheme = value.parse()?,
        "auto" | "auto_ecc" => {
            updated.auto_ecc = match value.to_lowercase().as_str() {
                "on" | "true" | "yes" | "1" => true,
                "off" | "false" | "no" | "0" => false,
                _ => return Err(format!("Invalid switch value: {}", value)),
            };
        }
        other => return Err(format!("Unknown field: {}", other)),
    }

    updated.validate()?;
    *config = updated;
    Ok(())
}

/// Settings the shell needs beyond the controller.
pub struct ShellContext {
    pub config: SimulationConfig,
    pub default_report_path: PathBuf,
    /// Writes the report for `save`, given the session, target path and
    /// failed submission count.
    pub save: Box<dyn Fn(&SessionView, &Path, usize) -> Result<()> + Send + Sync>,
}

/// Interactive shell state.
pub struct Shell<'a, C> {
    controller: &'a SessionController<C>,
    context: ShellContext,
    failed_submissions: usize,
}

impl<'a, C: SimulationClient> Shell<'a, C> {
    pub fn new(controller: &'a SessionController<C>, context: ShellContext) -> Self {
        Self {
            controller,
            context,
            failed_submissions: 0,
        }
    }

    /// Submissions that failed during this shell session.
    pub fn failed_submissions(&self) -> usize {
        self.failed_submissions
    }

    /// Current transmission parameters.
    #[cfg(test)]
    pub fn config(&self) -> &SimulationConfig {
        &self.context.config
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        println!("🛰️  SatDash interactive session. Type 'help' for commands.");
        println!("   Service: {}", self.controller.client().endpoint());
        println!("   Parameters: {}", describe(&self.context.config));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match line.parse::<ShellCommand>() {
                Ok(command) => command,
                Err(e) => {
                    println!("   {}", e);
                    continue;
                }
            };

            if !self.execute(command).await? {
                break;
            }
        }

        Ok(())
    }

    /// Execute one command. Returns `false` when the shell should exit.
    pub async fn execute(&mut self, command: ShellCommand) -> Result<bool> {
        debug!("Shell command: {:?}", command);

        match command {
            ShellCommand::Run(count) => self.run_batch(count).await,
            ShellCommand::Set { field, value } => {
                match apply_setting(&mut self.context.config, &field, &value) {
                    Ok(()) => println!("   {}", describe(&self.context.config)),
                    Err(e) => println!("   {}", e),
                }
            }
            ShellCommand::Config => println!("   {}", describe(&self.context.config)),
            ShellCommand::Stats => {
                for line in generate_summary_text(&self.controller.stats()).lines() {
                    println!("   {}", line);
                }
            }
            ShellCommand::History => {
                let view = self.controller.snapshot();
                if view.ber_history.is_empty() {
                    println!("   No frames simulated yet");
                }
                for point in &view.ber_history {
                    println!(
                        "   run {:>3}: {:.3e} -> {:.3e}",
                        point.run, point.ber_before, point.ber_after
                    );
                }
            }
            ShellCommand::Frames => {
                let view = self.controller.snapshot();
                if view.frames.is_empty() {
                    println!("   No frames simulated yet");
                }
                for (i, frame) in view.frames.iter().enumerate() {
                    let outcome = classify(&frame.result);
                    println!(
                        "   {:>3} {} {} {} | {} | {:.1}ms",
                        i + 1,
                        frame.id,
                        outcome.emoji(),
                        outcome,
                        describe(&frame.config),
                        frame.result.latency_ms
                    );
                }
            }
            ShellCommand::Clear => match self.controller.clear() {
                Ok(()) => {
                    self.failed_submissions = 0;
                    println!("   Session cleared");
                }
                Err(e) => println!("   {}", e),
            },
            ShellCommand::Save(path) => {
                let path = path.unwrap_or_else(|| self.context.default_report_path.clone());
                let view = self.controller.snapshot();
                match (self.context.save)(&view, &path, self.failed_submissions) {
                    Ok(()) => println!("   Report saved to {}", path.display()),
                    Err(e) => println!("   Failed to save report: {:#}", e),
                }
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(false),
        }

        Ok(true)
    }

    async fn run_batch(&mut self, count: usize) {
        for _ in 0..count {
            match self.controller.submit(self.context.config).await {
                Ok(result) => {
                    let outcome = classify(&result);
                    let run = self.controller.frame_count();
                    println!(
                        "   run {:>3}: {} {} | BER {:.3e} -> {:.3e} | {:.1}ms",
                        run,
                        outcome.emoji(),
                        outcome,
                        result.ber_before,
                        result.ber_after,
                        result.latency_ms
                    );
                }
                Err(SubmitError::Busy) => {
                    println!("   A simulation is already running");
                    break;
                }
                Err(e) => {
                    self.failed_submissions += 1;
                    warn!("Submit failed: {}", e);
                    println!("   ❌ {}", e);
                    break;
                }
            }
        }
    }
}
