//! `junction-cli` – replay recorded drives through the stop-sign planner.
//!
//! ```text
//! junction replay <scenario.json> [--config <path>] [--dump-state]
//! junction config [--config <path>]
//! junction help
//! ```
//!
//! Configuration comes from `--config <path>` or `~/.junction/config.toml`,
//! with `JUNCTION_*` environment overrides applied on top.

mod config;
mod replay;
mod scenario;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use junction_runtime::init_tracing;

use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "junction", about = "Stop-sign decision replay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Run every frame of a recorded scenario through the planner.
    Replay {
        /// Scenario JSON file.
        scenario: PathBuf,
        /// Config file to use instead of `~/.junction/config.toml`.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Print the stop-sign records left after the last frame as JSON.
        #[arg(long)]
        dump_state: bool,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Config file to use instead of `~/.junction/config.toml`.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        None => match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(format!("failed to print help: {e}")),
        },
        Some(Command::Config { config }) => match config::load(config.as_deref()) {
            Ok(cfg) => match toml::to_string_pretty(&cfg) {
                Ok(raw) => {
                    print!("{raw}");
                    ExitCode::SUCCESS
                }
                Err(e) => fail(format!("failed to serialize config: {e}")),
            },
            Err(e) => fail(e.to_string()),
        },
        Some(Command::Replay {
            scenario,
            config,
            dump_state,
        }) => run_replay(&scenario, config.as_deref(), dump_state),
    }
}

fn run_replay(scenario_path: &Path, config_path: Option<&Path>, dump_state: bool) -> ExitCode {
    let cfg = match config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => return fail(e.to_string()),
    };
    let _guard = init_tracing("junction", cfg.log_format);

    let scenario = match Scenario::load(scenario_path) {
        Ok(scenario) => scenario,
        Err(e) => return fail(e.to_string()),
    };

    let outcome = match replay::run(&scenario, cfg.planner) {
        Ok(outcome) => outcome,
        Err(e) => return fail(e.to_string()),
    };

    println!(
        "  Replaying {} ({} frames)",
        scenario
            .name
            .as_deref()
            .unwrap_or_else(|| scenario_path.to_str().unwrap_or("scenario"))
            .bold(),
        scenario.frames.len()
    );
    for report in &outcome.reports {
        for line in replay::render_report(report) {
            println!("{line}");
        }
    }

    let faults = outcome.fault_count();
    if faults == 0 {
        println!("  {}", "✓ replay complete".green());
    } else {
        println!(
            "  {} ({faults} fault(s) reported)",
            "✓ replay complete".yellow()
        );
    }

    if dump_state {
        match serde_json::to_string_pretty(&outcome.final_state) {
            Ok(json) => println!("{json}"),
            Err(e) => return fail(format!("failed to serialize state: {e}")),
        }
    }
    ExitCode::SUCCESS
}

fn fail(message: String) -> ExitCode {
    eprintln!("{}: {}", "error".red().bold(), message);
    ExitCode::FAILURE
}
