use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridclear", author, version, about = "Clear electricity markets on a DC network", long_about = None)]
pub struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clear a market case and write the dispatch report as JSON
    Clear {
        /// Case file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,

        /// Clearing configuration (.toml)
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Solver backend id (see `gridclear backends`)
        #[arg(long)]
        backend: Option<String>,

        /// Node whose voltage angle is pinned to zero
        #[arg(long)]
        reference: Option<usize>,

        /// Wall-clock limit for the solve in seconds (0 = none)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Compute locational marginal prices
        #[arg(long, conflicts_with = "no_prices")]
        prices: bool,

        /// Skip locational marginal prices
        #[arg(long)]
        no_prices: bool,

        /// Write the report here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Check a case for errors without solving it
    Validate {
        /// Case file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// List the solver backends compiled into this binary
    Backends,
}

impl Commands {
    /// Tri-state price override: `None` keeps the configured value.
    pub fn price_override(prices: bool, no_prices: bool) -> Option<bool> {
        match (prices, no_prices) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clear_flags() {
        let cli = Cli::parse_from([
            "gridclear",
            "--log-level",
            "debug",
            "clear",
            "case.json",
            "--backend",
            "clarabel",
            "--reference",
            "2",
            "--timeout-secs",
            "10",
            "--no-prices",
        ]);
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
        match cli.command {
            Commands::Clear {
                case,
                backend,
                reference,
                timeout_secs,
                prices,
                no_prices,
                out,
                ..
            } => {
                assert_eq!(case, PathBuf::from("case.json"));
                assert_eq!(backend.as_deref(), Some("clarabel"));
                assert_eq!(reference, Some(2));
                assert_eq!(timeout_secs, Some(10));
                assert_eq!(Commands::price_override(prices, no_prices), Some(false));
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_price_flags_conflict() {
        let err = Cli::try_parse_from(["gridclear", "clear", "c.json", "--prices", "--no-prices"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_price_override() {
        assert_eq!(Commands::price_override(false, false), None);
        assert_eq!(Commands::price_override(true, false), Some(true));
    }
}
