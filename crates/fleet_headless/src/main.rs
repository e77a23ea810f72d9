//! Headless fleet planner runner.
//!
//! This binary runs planner factions through a scenario without a host game.
//! Designed for CI testing, balance checks and data validation.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario, report to stdout
//! cargo run -p fleet_headless -- run --scenario scenarios/skirmish.ron
//!
//! # Run with a tick override, saving the report and the command journal
//! cargo run -p fleet_headless -- run --scenario scenarios/skirmish.ron --ticks 500 \
//!     --output results/report.json --journal results/run.journal
//!
//! # Validate a scenario or a bare research catalog
//! cargo run -p fleet_headless -- validate --scenario scenarios/skirmish.ron
//! cargo run -p fleet_headless -- validate --catalog data/research.ron
//!
//! # Verify determinism
//! cargo run -p fleet_headless -- verify --scenario scenarios/skirmish.ron --runs 5
//!
//! # Summarize a saved journal
//! cargo run -p fleet_headless -- journal --file results/run.journal
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleet_core::data::load_catalog;
use fleet_core::replay::CommandJournal;
use fleet_headless::{
    runner::{verify_determinism, HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "fleet_headless")]
#[command(about = "Headless fleet planner runner for testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report what the planners did
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the scenario's tick count
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the command journal
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },

    /// Check a scenario or research catalog for corrupt data
    Validate {
        /// Scenario file to check
        #[arg(short, long, conflicts_with = "catalog", required_unless_present = "catalog")]
        scenario: Option<PathBuf>,

        /// Research catalog file to check
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario several times
    Verify {
        /// Scenario to test
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the scenario's tick count
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Summarize a saved command journal
    Journal {
        /// Journal file path
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for the report)
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            output,
            journal,
        } => cmd_run(scenario, ticks, output, journal),
        Commands::Validate { scenario, catalog } => cmd_validate(scenario, catalog),
        Commands::Verify {
            scenario,
            ticks,
            runs,
        } => cmd_verify(scenario, ticks, runs),
        Commands::Journal { file } => cmd_journal(file),
    }
}

fn load_scenario(path: &Path) -> Scenario {
    match Scenario::load(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to load scenario");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a single scenario
fn cmd_run(
    scenario_path: PathBuf,
    ticks: Option<u64>,
    output: Option<PathBuf>,
    journal: Option<PathBuf>,
) {
    let scenario = load_scenario(&scenario_path);
    let config = HeadlessConfig {
        ticks,
        journal_path: journal,
    };

    let runner = match HeadlessRunner::new(&scenario, config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let result = match runner.run() {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("FATAL: Run failed: {e}");
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = result.metrics.save(&path) {
                tracing::error!(error = %e, path = %path.display(), "Failed to save report");
                eprintln!("FATAL: Failed to save report: {e}");
                std::process::exit(1);
            }
            eprintln!("Report written to {}", path.display());
        }
        None => match serde_json::to_string_pretty(&result.metrics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("FATAL: Failed to encode report: {e}");
                std::process::exit(1);
            }
        },
    }

    // Print summary
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("RUN COMPLETE: {}", result.metrics.scenario);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {}", result.metrics.ticks);
    for (faction, metrics) in &result.metrics.factions {
        eprintln!(
            "  {faction:<12} deployed {:>3}  decommissioned {:>3}  orders {:>4}  failures {:>3}",
            metrics.fleets_deployed,
            metrics.fleets_decommissioned,
            metrics.production_orders,
            metrics.commit_failures
        );
    }
    eprintln!("Final hash: {:016x}", result.metrics.final_state_hash);
}

/// Validate a scenario or a research catalog
fn cmd_validate(scenario: Option<PathBuf>, catalog: Option<PathBuf>) {
    if let Some(path) = catalog {
        match load_catalog(&path) {
            Ok(catalog) => {
                eprintln!("PASS: {} blueprints in {}", catalog.len(), path.display());
            }
            Err(e) => {
                eprintln!("FAIL: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let Some(path) = scenario else {
        eprintln!("FATAL: nothing to validate");
        std::process::exit(2);
    };
    let scenario = load_scenario(&path);
    match scenario.build() {
        Ok(state) => {
            eprintln!(
                "PASS: '{}' with {} blueprints and {} factions",
                scenario.name,
                state.catalog.len(),
                state.factions.len()
            );
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
}

/// Verify determinism by running the same scenario several times
fn cmd_verify(scenario_path: PathBuf, ticks: Option<u64>, runs: u32) {
    tracing::info!(
        "Verifying determinism: {} ({} runs)",
        scenario_path.display(),
        runs
    );

    let scenario = load_scenario(&scenario_path);
    match verify_determinism(&scenario, ticks, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

/// Summarize a saved command journal
fn cmd_journal(file: PathBuf) {
    let journal = match CommandJournal::load(&file) {
        Ok(journal) => journal,
        Err(e) => {
            eprintln!("Failed to load journal: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded journal:");
    eprintln!("  Scenario: {}", journal.scenario_id);
    eprintln!("  Commands: {}", journal.entries.len());
    eprintln!("  Rejected: {}", journal.rejected_count());
    eprintln!("  Duration: {} ticks", journal.final_tick);
    eprintln!("  Final hash: {:016x}", journal.final_hash);

    for entry in &journal.entries {
        println!(
            "{:>6} {:<12} {:<18} {}",
            entry.tick,
            entry.faction.0,
            entry.command.kind(),
            if entry.applied { "applied" } else { "rejected" }
        );
    }
}
