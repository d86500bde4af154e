//! searchcap budget governor demo CLI
//!
//! Runs the canned budget scenarios, or one simulated search under a budget
//! loaded from a TOML file and `key=value` overrides.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- scenario state-ceiling
//!   cargo run -p demo -- run --config budget.toml --set budget.max_state=50 --json

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use searchcap_config::{BudgetConfigLoader, LoadedConfig};
use searchcap_contracts::{
    error::{BudgetError, BudgetResult},
    format::{format_hms, format_megabytes},
};
use searchcap_sim::{catalog, find, run_scenario, run_search, SearchReport, SearchShape};

// ── CLI definition ────────────────────────────────────────────────────────────

/// searchcap: resource budgets for state-space search.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "searchcap budget governor demo",
    long_about = "Runs simulated state-space searches under time, heap, depth,\n\
                  instruction and state-count budgets, and reports which budget\n\
                  stopped each run."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every built-in scenario in sequence.
    RunAll,
    /// Run one built-in scenario by name.
    Scenario {
        /// Scenario name, e.g. `state-ceiling`. Unknown names list the catalog.
        name: String,
    },
    /// Run one simulated search under a configured budget.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// TOML file with a `[budget]` table.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Budget override, e.g. `budget.max_insn=50000`. May be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    /// Children per state.
    #[arg(long, default_value_t = 2)]
    branching: u64,
    /// Depth of the simulated tree.
    #[arg(long, default_value_t = 10)]
    depth: u64,
    /// Instructions executed per transition.
    #[arg(long, default_value_t = 100)]
    insns: u64,
    /// Length of the trace replayed before exploring.
    #[arg(long, default_value_t = 0)]
    replay: u64,
    /// Print the final governor snapshot as JSON.
    #[arg(long)]
    json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all()
        }
        Command::Scenario { name } => {
            print_banner();
            run_named(&name)
        }
        Command::Run(args) => run_configured(args),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> BudgetResult<()> {
    let mut mismatched = Vec::new();
    for scenario in catalog() {
        if !run_and_print(&scenario)? {
            mismatched.push(scenario.name);
        }
    }

    if mismatched.is_empty() {
        println!("All scenarios ended as expected.");
        Ok(())
    } else {
        Err(BudgetError::ConfigError {
            reason: format!("scenarios ended unexpectedly: {}", mismatched.join(", ")),
        })
    }
}

fn run_named(name: &str) -> BudgetResult<()> {
    let scenario = find(name).ok_or_else(|| BudgetError::ConfigError {
        reason: format!(
            "unknown scenario '{}'; available: {}",
            name,
            catalog().iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
        ),
    })?;
    run_and_print(&scenario)?;
    Ok(())
}

/// Run one scenario and print its summary. Returns whether it matched.
fn run_and_print(scenario: &searchcap_sim::Scenario) -> BudgetResult<bool> {
    println!("── {} ──", scenario.name);
    println!("   {}", scenario.description);

    let outcome = run_scenario(scenario)?;
    print_report(&outcome.report);

    let expected = outcome
        .expected
        .map(|k| k.to_string())
        .unwrap_or_else(|| "completion".to_string());
    let verdict = if outcome.matched() { "ok" } else { "MISMATCH" };
    println!("   expected: {}  [{}]", expected, verdict);
    println!();

    Ok(outcome.matched())
}

fn run_configured(args: RunArgs) -> BudgetResult<()> {
    let mut loader = match &args.config {
        Some(path) => BudgetConfigLoader::from_file(path)?,
        None => BudgetConfigLoader::new(),
    };
    loader.apply_overrides(&args.overrides)?;

    let LoadedConfig { config, diagnostics } = loader.resolve()?;
    for d in &diagnostics {
        eprintln!("config: {}: {}", d.key, d.message);
    }

    let shape = SearchShape {
        branching: args.branching,
        max_depth: args.depth,
        instructions_per_transition: args.insns,
        replay_prefix: args.replay,
        ..SearchShape::default()
    };
    debug!(?shape, "running configured search");

    let report = run_search(config, shape);

    if args.json {
        let json = serde_json::to_string_pretty(&report.snapshot).map_err(|e| {
            BudgetError::ConfigError {
                reason: format!("failed to serialize snapshot: {}", e),
            }
        })?;
        println!("{}", json);
    } else {
        print_report(&report);
    }
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_report(report: &SearchReport) {
    let snap = &report.snapshot;
    println!(
        "   run {}  elapsed {}  transitions {}  deepest {}",
        snap.run_id,
        format_hms(snap.elapsed_millis),
        report.transitions,
        report.deepest
    );
    println!(
        "   instructions {}  new states {}  heap growth {}",
        snap.instruction_count,
        snap.new_state_count,
        snap.heap_growth_bytes
            .map(format_megabytes)
            .unwrap_or_else(|| "n/a".to_string())
    );
    match &snap.violation {
        Some(v) => println!("   stopped: {}", v.message),
        None if report.completed => println!("   search completed"),
        None => println!("   search stopped without a violation"),
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("searchcap — Resource Budgets for State-Space Search");
    println!("===================================================");
    println!();
    println!("Governor checks per hook:");
    println!("  [state advanced]       time, heap, then states / depth / new states");
    println!("  [instruction executed] time, heap, instructions every check_interval");
    println!("  First ceiling crossed wins: notify, interrupt (instruction hook), terminate.");
    println!();
}
