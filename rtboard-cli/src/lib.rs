#![warn(missing_docs)]
//! rtboard CLI
//!
//! Argument parsing and dispatch for the `rtboard` binary. The default
//! command runs the full board; `list` enumerates the workload set and
//! `caps` prints the detected real-time capabilities without measuring
//! anything.

mod orchestrator;

pub use orchestrator::{filtered_workloads, run_board, BoardOptions};

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rtboard_core::{Capabilities, MulticoreWindows};
use rtboard_latency::DEFAULT_PROBE_COMMAND;
use rtboard_report::{render_board, save_report};

/// rtboard command line.
#[derive(Parser, Debug)]
#[command(name = "rtboard")]
#[command(author, version, about = "Real-time readiness board: latency, jitter and certification")]
pub struct Cli {
    /// Optional subcommand; defaults to a full board run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter workloads by regex over id or name
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Latency probe duration in seconds
    #[arg(short, long, default_value = "15")]
    pub duration: u64,

    /// Measured runs per workload
    #[arg(short, long, default_value = "15")]
    pub runs: usize,

    /// Core reserved for the latency probe
    #[arg(long, default_value = "3")]
    pub reserved_core: usize,

    /// Thermal target before each run, in degrees Celsius
    #[arg(long, default_value = "62.0")]
    pub target_temp: f64,

    /// Output format: human or json
    #[arg(long, default_value = "human")]
    pub format: String,

    /// Write the rendered output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for the timestamped JSON snapshot
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Skip writing the JSON snapshot
    #[arg(long)]
    pub no_export: bool,

    /// Skip the single-core vs. multicore phase
    #[arg(long)]
    pub skip_multicore: bool,

    /// Skip the latency-under-load pass
    #[arg(long)]
    pub skip_load: bool,

    /// Fail instead of simulating when the latency probe cannot run
    #[arg(long)]
    pub no_fallback: bool,

    /// Latency probe binary
    #[arg(long, default_value = DEFAULT_PROBE_COMMAND)]
    pub probe_command: String,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full board (default)
    Run,
    /// List the workload set
    List,
    /// Print detected real-time capabilities
    Caps,
}

/// Parse arguments and run the CLI.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose {
        "rtboard_cli=debug,rtboard_core=debug,rtboard_latency=debug,rtboard_report=debug"
    } else {
        "rtboard_cli=info,rtboard_core=info,rtboard_latency=info,rtboard_report=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::List) => list_workloads(&cli),
        Some(Commands::Caps) => print_capabilities(&cli),
        Some(Commands::Run) | None => run_full_board(&cli),
    }
}

fn board_options(cli: &Cli) -> BoardOptions {
    BoardOptions {
        probe_duration_s: cli.duration,
        runs: cli.runs,
        reserved_core: cli.reserved_core,
        thermal_target_c: cli.target_temp,
        skip_multicore: cli.skip_multicore,
        skip_load: cli.skip_load,
        no_fallback: cli.no_fallback,
        filter: (cli.filter != ".*").then(|| cli.filter.clone()),
        probe_command: (cli.probe_command != DEFAULT_PROBE_COMMAND)
            .then(|| cli.probe_command.clone()),
        multicore_windows: MulticoreWindows::default(),
        export_dir: (!cli.no_export).then(|| cli.export_dir.clone()),
    }
}

fn run_full_board(cli: &Cli) -> anyhow::Result<()> {
    let options = board_options(cli);
    let report = run_board(&options)?;

    let rendered = match cli.format.as_str() {
        "json" => serde_json::to_string_pretty(&report)?,
        _ => render_board(&report),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if let Some(dir) = &options.export_dir {
        match save_report(&report, dir) {
            Ok(path) => eprintln!("snapshot exported to {}", path.display()),
            Err(err) => eprintln!("snapshot export failed: {err}"),
        }
    }

    Ok(())
}

fn list_workloads(cli: &Cli) -> anyhow::Result<()> {
    let filter = (cli.filter != ".*").then_some(cli.filter.as_str());
    let workloads = filtered_workloads(filter)?;
    println!("rtboard workload set:");
    for workload in &workloads {
        println!("  {:<16} {}", workload.id, workload.name);
    }
    println!("{} workloads.", workloads.len());
    Ok(())
}

fn print_capabilities(cli: &Cli) -> anyhow::Result<()> {
    let caps = Capabilities::detect(&cli.probe_command);
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("rtboard capability probe:");
    println!("  rt scheduling:      {}", yes_no(caps.rt_scheduling));
    println!("  root privileges:    {}", yes_no(caps.root));
    println!("  temperature sensor: {}", yes_no(caps.temperature));
    println!("  latency probe:      {}", yes_no(caps.probe_binary));
    println!("  cache drop:         {}", yes_no(caps.cache_drop));
    println!("  cpu cores:          {}", caps.core_count);
    Ok(())
}
