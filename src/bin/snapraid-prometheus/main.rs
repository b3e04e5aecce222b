#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::args().with_context(|| "parsing CLI args")?;

    init_logging(args.verbose)?;

    let config = args.config();

    snapraid_prometheus::export(args.report, &config)
        .with_context(|| format!("exporting {} report", args.report))?;

    Ok(())
}

/// Logs to **STDERR**, so **STDOUT** stays clean for `--stdout`.
///
/// `RUST_LOG` directives are applied on top of the verbosity flag.
fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()
        .with_context(|| "parsing RUST_LOG")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
