//! DC market clearing.
//!
//! The pipeline is
//!
//! ```text
//! NetworkTopology + ParticipantRegistry
//!        │
//!        ▼
//!   ModelBuilder ──LpProblem──> SolverAdapter ──LpSolution──> ResultExtractor
//!                                                                   │
//!                                                                   ▼
//!                                                            DispatchReport
//! ```
//!
//! [`MarketClearing`] wires the stages together, picks a backend from a
//! [`BackendRegistry`] and applies a [`ClearingConfig`]. Every run builds
//! its own model, so independent cases can be cleared in parallel with
//! [`MarketClearing::clear_batch`].

pub mod backends;
pub mod config;
pub mod extract;
pub mod formulation;
pub mod registry;

pub use config::ClearingConfig;
pub use extract::{
    extract, BindingSummary, CongestedPair, DemandDispatch, DispatchReport, GeneratorDispatch,
    NodeResult, ResultExtractor,
};
pub use formulation::{ClearingModel, ModelBuilder, VariableMap, DEFAULT_REFERENCE_NODE};
pub use registry::{BackendRegistry, DEFAULT_PREFERENCE};

use crate::error::ClearingResult;
use gridclear_core::{MarketCase, NetworkTopology, NodeId, ParticipantRegistry};
use gridclear_solver::{solve_with_deadline, CancelToken, LpSolution, SolverAdapter};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, info_span};
use web_time::Instant;

/// Runs clearing with a fixed configuration and backend registry.
#[derive(Debug, Clone)]
pub struct MarketClearing {
    backends: BackendRegistry,
    config: ClearingConfig,
}

impl Default for MarketClearing {
    fn default() -> Self {
        Self::new(ClearingConfig::default())
    }
}

impl MarketClearing {
    pub fn new(config: ClearingConfig) -> Self {
        Self {
            backends: BackendRegistry::with_defaults(),
            config,
        }
    }

    pub fn with_backends(mut self, backends: BackendRegistry) -> Self {
        self.backends = backends;
        self
    }

    pub fn config(&self) -> &ClearingConfig {
        &self.config
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    fn reference_for(&self, case_reference: Option<NodeId>) -> NodeId {
        self.config
            .reference_node
            .or(case_reference)
            .unwrap_or(DEFAULT_REFERENCE_NODE)
    }

    fn prepare(
        &self,
        topology: &NetworkTopology,
        participants: &ParticipantRegistry,
        reference: NodeId,
    ) -> ClearingResult<(ClearingModel, Arc<dyn SolverAdapter>)> {
        let model = ModelBuilder::new(topology, participants)
            .with_reference(reference)
            .build()?;
        let adapter = self.backends.select(self.config.backend.as_deref())?;
        Ok((model, adapter))
    }

    fn finish(
        &self,
        model: &ClearingModel,
        solution: &LpSolution,
        topology: &NetworkTopology,
        participants: &ParticipantRegistry,
        backend: &str,
        start: Instant,
    ) -> ClearingResult<DispatchReport> {
        let mut report = self
            .config
            .extractor()
            .extract(model, solution, topology, participants)?;
        report.backend = backend.to_string();
        report.solve_time_ms = start.elapsed().as_millis() as u64;

        info!(
            backend,
            welfare = report.welfare,
            generation_mw = report.total_generation().value(),
            congested_pairs = report.binding.congested_pairs.len(),
            elapsed_ms = report.solve_time_ms,
            "market cleared"
        );
        Ok(report)
    }

    /// Clear with the configured reference node (or node 0).
    pub fn clear(
        &self,
        topology: &NetworkTopology,
        participants: &ParticipantRegistry,
    ) -> ClearingResult<DispatchReport> {
        self.clear_with_reference(topology, participants, self.reference_for(None))
    }

    pub fn clear_with_reference(
        &self,
        topology: &NetworkTopology,
        participants: &ParticipantRegistry,
        reference: NodeId,
    ) -> ClearingResult<DispatchReport> {
        let (model, adapter) = self.prepare(topology, participants, reference)?;
        let _span = info_span!("clear", backend = adapter.id(), nodes = topology.node_count()).entered();

        let start = Instant::now();
        let solution = adapter.solve(&model.problem, &self.config.solve_options())?;
        self.finish(&model, &solution, topology, participants, adapter.id(), start)
    }

    /// Validate and clear a raw case. A reference node in the configuration
    /// wins over the case's own.
    pub fn clear_case(&self, case: &MarketCase) -> ClearingResult<DispatchReport> {
        let reference = self.reference_for(case.reference_node);
        let (topology, participants) = case.clone().into_parts()?;
        self.clear_with_reference(&topology, &participants, reference)
    }

    /// Clear on tokio's blocking pool under the configured time limit.
    ///
    /// On timeout or cancellation the in-flight solve is abandoned and no
    /// partial dispatch is returned.
    pub async fn clear_with_deadline(
        &self,
        topology: &NetworkTopology,
        participants: &ParticipantRegistry,
        cancel: Option<CancelToken>,
    ) -> ClearingResult<DispatchReport> {
        let (model, adapter) = self.prepare(topology, participants, self.reference_for(None))?;
        let backend = adapter.id().to_string();

        let start = Instant::now();
        let solution = solve_with_deadline(
            adapter,
            Arc::new(model.problem.clone()),
            self.config.solve_options(),
            cancel,
        )
        .await?;
        self.finish(&model, &solution, topology, participants, &backend, start)
    }

    /// Clear independent cases, in parallel when the `parallel` feature is
    /// on. Results keep the input order.
    pub fn clear_batch(&self, cases: &[MarketCase]) -> Vec<ClearingResult<DispatchReport>> {
        #[cfg(feature = "parallel")]
        let iter = cases.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = cases.iter();

        iter.map(|case| self.clear_case(case)).collect()
    }
}

/// Clear independent cases with the default configuration.
pub fn clear_batch(cases: &[MarketCase]) -> Vec<ClearingResult<DispatchReport>> {
    MarketClearing::default().clear_batch(cases)
}
