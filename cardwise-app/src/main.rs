mod cli;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::commands::run_cli;
use cli::opts::Cli;

fn main() -> Result<()> {
    let args = Cli::parse();

    // stdout belongs to the prompts, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run_cli(args)
}
