use anyhow::Result;
use clap::Parser;
use gridclear_cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

use commands::clear::ClearArgs;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let builder = FmtSubscriber::builder().with_writer(std::io::stderr);
    match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish()),
        Err(_) => tracing::subscriber::set_global_default(builder.with_max_level(cli.log_level).finish()),
    }
    .expect("setting default subscriber failed");

    match cli.command {
        Commands::Clear {
            case,
            config,
            backend,
            reference,
            timeout_secs,
            prices,
            no_prices,
            out,
        } => commands::clear::handle(&ClearArgs {
            case,
            config,
            backend,
            reference,
            timeout_secs,
            prices: Commands::price_override(prices, no_prices),
            out,
        }),
        Commands::Validate { case } => commands::validate::handle(&case),
        Commands::Backends => commands::backends::handle(),
    }
}
