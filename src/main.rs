//! wasm-bridge-bench CLI.
//!
//! `bench` runs the calling-convention suites against a compiled
//! element-store module (or the in-process fake); `serve` hosts a
//! directory for browser-driven runs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use wasm_bridge_bench::benchmark::workloads::standard_suites;
use wasm_bridge_bench::benchmark::{run_all, RunReport};
use wasm_bridge_bench::config::{DEFAULT_HOST_PORT, DEFAULT_REPEAT_COUNT, RESULTS_DIR};
use wasm_bridge_bench::host::StaticHost;
use wasm_bridge_bench::store::{ElementStore, FakeStore, WasmStore};

/// Micro-benchmarks for host-to-WebAssembly calling conventions.
#[derive(Debug, Parser)]
#[command(name = "wasm-bridge-bench", version, about)]
struct Cli {
    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the benchmark suites against an element-store module.
    Bench(BenchArgs),
    /// Serve a directory over HTTP for browser-driven runs.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct BenchArgs {
    /// Path to the compiled element-store module.
    #[arg(long, required_unless_present = "fake")]
    module: Option<PathBuf>,

    /// Run against the in-process fake store instead of a module.
    #[arg(long, conflicts_with = "module")]
    fake: bool,

    /// Measured repeats per (suite, target) pair.
    #[arg(long, default_value_t = DEFAULT_REPEAT_COUNT)]
    repeat: usize,

    /// Directory for the JSON report.
    #[arg(long, default_value = RESULTS_DIR)]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_HOST_PORT)]
    port: u16,

    /// Directory to serve.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Bench(args) => run_bench(args),
        Commands::Serve(args) => serve(args).await,
    }
}

fn run_bench(args: BenchArgs) -> anyhow::Result<()> {
    let mut store: Box<dyn ElementStore> = if args.fake {
        tracing::info!("using the in-process fake store");
        Box::new(FakeStore::new())
    } else {
        let Some(path) = args.module else {
            anyhow::bail!("either --module or --fake is required");
        };
        tracing::info!(module = %path.display(), "loading element-store module");
        Box::new(WasmStore::from_file(&path)?)
    };

    let mut suites = standard_suites();
    let report = run_all(&mut suites, args.repeat, store.as_mut())?;

    print_summary(&report);

    let path = report.save(&args.out_dir)?;
    tracing::info!(path = %path.display(), "report written");

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "benchmark results ({} repeats per target):",
        report.repeat_count
    );
    for suite in &report.suites {
        println!("  {}", suite.suite);
        for target in &suite.targets {
            println!("    {:<12} {:>10.3} ms", target.target, target.average_ms);
        }
    }
    if report.has_failures() {
        println!(
            "  {} verification mismatches recorded in the report",
            report.failure_count()
        );
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    StaticHost::new(args.root, args.port).run().await?;
    Ok(())
}
