pub mod backends;
pub mod clear;
pub mod validate;

use anyhow::{Context, Result};
use gridclear_core::MarketCase;
use std::path::Path;

/// Read a case file with a readable error chain.
pub(crate) fn load_case(path: &Path) -> Result<MarketCase> {
    MarketCase::from_path(path).with_context(|| format!("loading case {}", path.display()))
}
