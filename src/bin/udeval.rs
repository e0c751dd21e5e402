//! Command-line front end of the evaluation harness.
//!
//! Takes the three benchmark directories, evaluates every treebank listed in
//! the truth metadata and writes `evaluation.prototext` plus the summary
//! lines. Per-treebank problems are reported inside the run; anything that
//! escapes to this level is an infrastructure failure and aborts with a
//! fixed apology on stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::Level;
use udeval::run_evaluation;

#[derive(Parser)]
#[command(name = "udeval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch evaluation harness for UD parsing benchmarks", long_about = None)]
struct Cli {
    /// Directory of the truth dataset (must contain metadata.json)
    truth: PathBuf,

    /// Directory of the system output
    system: PathBuf,

    /// Directory where evaluation.prototext is written
    output: PathBuf,

    /// Enable diagnostic logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(io::stderr)
            .init();
    }

    run_evaluation(
        &cli.truth,
        &cli.system,
        &cli.output,
        io::stdout().lock(),
        io::stderr().lock(),
    )
    .context("Evaluation run failed")
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("Internal error in the evaluation harness: {:#}", err);
        eprintln!("Please contact the benchmark organizers so that we can fix it together.");
        std::process::exit(1);
    }
}
