//! Time-bounded and cancellable clearing

#![cfg(feature = "solver-clarabel")]

use gridclear_algo::clearing::backends::ClarabelAdapter;
use gridclear_algo::{BackendRegistry, ClearingConfig, ClearingError, MarketClearing};
use gridclear_core::{
    Demand, DemandId, Generator, GeneratorId, NetworkTopology, NodeId, ParticipantRegistry,
};
use gridclear_solver::{
    cancel_pair, LpProblem, LpSolution, SolveOptions, SolverAdapter, SolverError, SolverResult,
};
use std::sync::Arc;
use std::time::Duration;

/// Delegates to Clarabel after a fixed delay
struct SlowClarabel {
    delay: Duration,
}

impl SolverAdapter for SlowClarabel {
    fn id(&self) -> &str {
        "slow"
    }

    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> SolverResult<LpSolution> {
        std::thread::sleep(self.delay);
        ClarabelAdapter::new().solve(problem, options)
    }
}

fn market() -> (NetworkTopology, ParticipantRegistry) {
    let topology = NetworkTopology::uniform(2, 50.0, 100.0).unwrap();
    let registry = ParticipantRegistry::new(
        &topology,
        vec![Generator::new(GeneratorId::new(0), NodeId::new(0), 100.0, 10.0)],
        vec![Demand::new(DemandId::new(0), NodeId::new(1), 30.0, 25.0)],
    )
    .unwrap();
    (topology, registry)
}

fn clearing_with(delay: Duration, timeout_seconds: u64) -> MarketClearing {
    let mut backends = BackendRegistry::new();
    backends.register(Arc::new(SlowClarabel { delay }));
    let config = ClearingConfig {
        backend: Some("slow".into()),
        timeout_seconds,
        ..Default::default()
    };
    MarketClearing::new(config).with_backends(backends)
}

#[tokio::test]
async fn test_deadline_clear_succeeds_in_time() {
    let (topology, registry) = market();
    let report = clearing_with(Duration::from_millis(1), 30)
        .clear_with_deadline(&topology, &registry, None)
        .await
        .unwrap();

    assert_eq!(report.backend, "slow");
    assert!((report.welfare - 450.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_deadline_clear_times_out() {
    let (topology, registry) = market();
    let err = clearing_with(Duration::from_millis(1500), 1)
        .clear_with_deadline(&topology, &registry, None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClearingError::Solver(SolverError::Timeout(limit)) if limit == Duration::from_secs(1)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_deadline_clear_can_be_cancelled() {
    let (topology, registry) = market();
    let clearing = clearing_with(Duration::from_millis(500), 30);
    let (handle, token) = cancel_pair();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let err = clearing
        .clear_with_deadline(&topology, &registry, Some(token))
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ClearingError::Solver(SolverError::Cancelled)));
}
