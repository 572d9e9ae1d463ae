//! # gridclear-algo: DC Market Clearing
//!
//! Builds and solves the welfare-maximizing clearing problem for an
//! electricity market on a DC-linearized network, then reads the optimum back
//! as a dispatch with flows, angles and locational marginal prices.
//!
//! ## Architecture
//!
//! | Stage | Type | Role |
//! |-------|------|------|
//! | Formulation | [`ModelBuilder`] | topology + participants → `LpProblem` |
//! | Backend | [`clearing::backends`] | `LpProblem` → `LpSolution` via good_lp |
//! | Registry | [`BackendRegistry`] | id → backend, with a preference order |
//! | Extraction | [`ResultExtractor`] | `LpSolution` → [`DispatchReport`] |
//! | Orchestration | [`MarketClearing`] | config, backend choice, deadlines, batches |
//!
//! Backends are swappable behind the `SolverAdapter` trait from
//! `gridclear-solver`; neither the builder nor the extractor knows which one
//! ran.
//!
//! ## Example
//!
//! ```ignore
//! use gridclear_algo::{ClearingConfig, MarketClearing};
//! use gridclear_core::MarketCase;
//!
//! let case = MarketCase::from_path("three_node.json")?;
//! let report = MarketClearing::new(ClearingConfig::default()).clear_case(&case)?;
//! println!("welfare = {}", report.welfare);
//! ```
//!
//! ## Features
//!
//! - `solver-clarabel` (default): pure-Rust interior point backend
//! - `solver-highs`: HiGHS simplex backend, preferred when present
//! - `parallel` (default): rayon-powered [`MarketClearing::clear_batch`]

pub mod clearing;
pub mod error;

pub use clearing::{
    clear_batch, extract, BackendRegistry, BindingSummary, ClearingConfig, ClearingModel,
    CongestedPair, DemandDispatch, DispatchReport, GeneratorDispatch, MarketClearing,
    ModelBuilder, NodeResult, ResultExtractor, VariableMap, DEFAULT_REFERENCE_NODE,
};
pub use error::{ClearingError, ClearingResult};
