//! Lookup of solver backends by id.

use gridclear_solver::{SolverAdapter, SolverError, SolverResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Backend ids tried in order when the caller does not name one.
pub const DEFAULT_PREFERENCE: &[&str] = &["highs", "clarabel"];

/// Holds every registered backend.
///
/// Create with `BackendRegistry::new()` for empty or
/// `BackendRegistry::with_defaults()` for the compiled-in solvers.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn SolverAdapter>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend enabled by cargo features.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "solver-clarabel")]
        registry.register(Arc::new(super::backends::ClarabelAdapter::new()));
        #[cfg(feature = "solver-highs")]
        registry.register(Arc::new(super::backends::HighsAdapter::new()));
        registry
    }

    /// Register a backend, replacing any previous one with the same id.
    pub fn register(&mut self, backend: Arc<dyn SolverAdapter>) {
        self.backends.insert(backend.id().to_string(), backend);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn SolverAdapter>> {
        self.backends.get(id).cloned()
    }

    /// Sorted ids of all registered backends.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Pick the named backend, or the first available from
    /// [`DEFAULT_PREFERENCE`], or any registered backend.
    pub fn select(&self, preferred: Option<&str>) -> SolverResult<Arc<dyn SolverAdapter>> {
        if let Some(id) = preferred {
            return self
                .get(id)
                .ok_or_else(|| SolverError::UnknownBackend(id.to_string()));
        }
        DEFAULT_PREFERENCE
            .iter()
            .find_map(|id| self.get(id))
            .or_else(|| self.list().first().and_then(|id| self.get(id)))
            .ok_or_else(|| SolverError::UnknownBackend("no backends registered".into()))
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.list())
            .finish()
    }
}
