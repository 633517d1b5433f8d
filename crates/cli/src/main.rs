//! bulkcheck command-line entry point
//!
//! Builds an in-memory sharded cluster, runs the scenario matrix against it
//! and prints the run report. Exits non-zero on any failure.

use std::io;
use std::process::ExitCode;

use bulkcheck_core::Result;
use bulkcheck_engine::{Harness, RunReport};
use bulkcheck_storage::Cluster;
use clap::Parser;
use tracing::{error, info};

mod args;
mod logging;
mod output;

use args::Cli;

fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.harness_config()?;
    let cluster = Cluster::new(config.cluster.clone())?;
    let mut harness = Harness::new(&cluster, config)?;
    info!(
        seed = harness.seed(),
        shards = cluster.shard_count(),
        collection = %harness.collection(),
        "Starting run"
    );

    harness.run(&cli.filter()).map_err(|err| {
        error!(
            seed = harness.seed(),
            error = %err,
            "Run failed; pass --seed to reproduce"
        );
        err
    })
}

fn print(cli: &Cli, report: &RunReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        output::write_json(&mut out, report)
    } else {
        output::write_table(&mut out, report)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    match run(&cli) {
        Ok(report) => match print(&cli, &report) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("bulkcheck: failed to write report: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("bulkcheck: {err}");
            ExitCode::FAILURE
        }
    }
}
