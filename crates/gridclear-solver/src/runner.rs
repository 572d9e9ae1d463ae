//! Time-bounded, cancellable execution of a blocking backend.
//!
//! Backends are synchronous and CPU bound, so the solve runs on tokio's
//! blocking pool. The caller awaits it under a deadline and, optionally, a
//! cancel signal. When either fires the caller gets an error straight away
//! and the detached solve's result is dropped when it eventually finishes.

use crate::adapter::{SolveOptions, SolverAdapter};
use crate::error::{SolverError, SolverResult};
use crate::problem::LpProblem;
use crate::solution::LpSolution;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Sending half of a cancel signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half of a cancel signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send fails only when every token is gone, which is fine
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Solve `problem` on the blocking pool, bounded by `options.time_limit`.
pub async fn solve_with_deadline(
    adapter: Arc<dyn SolverAdapter>,
    problem: Arc<LpProblem>,
    options: SolveOptions,
    cancel: Option<CancelToken>,
) -> SolverResult<LpSolution> {
    let limit = options.time_limit;
    let backend = adapter.id().to_string();

    if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
        return Err(SolverError::Cancelled);
    }

    debug!(
        backend = %backend,
        vars = problem.num_vars(),
        constraints = problem.num_constraints(),
        limit_ms = limit.as_millis() as u64,
        "dispatching solve to blocking pool"
    );

    let task = tokio::task::spawn_blocking(move || adapter.solve(&problem, &options));
    let bounded = tokio::time::timeout(limit, task);

    let outcome = match cancel {
        Some(mut token) => {
            tokio::select! {
                res = bounded => res,
                _ = token.cancelled() => {
                    warn!(backend = %backend, "solve cancelled, discarding in-flight model");
                    return Err(SolverError::Cancelled);
                }
            }
        }
        None => bounded.await,
    };

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(SolverError::backend(
            backend,
            format!("solver task aborted: {join_err}"),
        )),
        Err(_) => {
            warn!(backend = %backend, limit_ms = limit.as_millis() as u64, "solve exceeded time limit");
            Err(SolverError::Timeout(limit))
        }
    }
}
