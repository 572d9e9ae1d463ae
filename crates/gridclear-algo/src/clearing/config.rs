//! Clearing run configuration, loadable from TOML.

use crate::clearing::extract::ResultExtractor;
use gridclear_core::{CaseError, CaseResult, NodeId};
use gridclear_solver::SolveOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for one clearing run.
///
/// ```toml
/// backend = "clarabel"
/// reference_node = 0
/// tolerance = 1e-6
/// timeout_seconds = 300
/// compute_prices = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingConfig {
    /// Backend id; `None` picks by preference order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Angle reference; `None` uses the case's own or node 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_node: Option<NodeId>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Wall-clock limit per solve (0 = no limit)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_compute_prices")]
    pub compute_prices: bool,
}

impl Default for ClearingConfig {
    fn default() -> Self {
        Self {
            backend: None,
            reference_node: None,
            tolerance: default_tolerance(),
            timeout_seconds: default_timeout(),
            max_iterations: default_max_iterations(),
            compute_prices: default_compute_prices(),
        }
    }
}

fn default_tolerance() -> f64 {
    SolveOptions::default().tolerance
}

fn default_timeout() -> u64 {
    SolveOptions::default().time_limit.as_secs()
}

fn default_max_iterations() -> u32 {
    SolveOptions::default().max_iterations
}

fn default_compute_prices() -> bool {
    true
}

impl ClearingConfig {
    pub fn from_toml_str(text: &str) -> CaseResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CaseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CaseResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(CaseError::Parse(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(CaseError::Parse("max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Duration {
        if self.timeout_seconds == 0 {
            // effectively unlimited
            Duration::from_secs(u64::from(u32::MAX))
        } else {
            Duration::from_secs(self.timeout_seconds)
        }
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            time_limit: self.time_limit(),
            compute_duals: self.compute_prices,
        }
    }

    pub fn extractor(&self) -> ResultExtractor {
        ResultExtractor::new(self.tolerance).with_prices(self.compute_prices)
    }
}
