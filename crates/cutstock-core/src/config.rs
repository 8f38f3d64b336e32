use std::time::Duration;

/// Tunables for the column-generation loop
#[derive(Debug, Clone)]
pub struct ColumnGenerationConfig {
    /// Stop once the reduced cost is above `-tolerance`
    pub tolerance: f64,
    /// Master solves allowed before giving up with `NonConvergence`
    pub max_iterations: usize,
    /// Skip priced patterns that are already in the pattern set
    pub dedup_patterns: bool,
    /// Wall-clock budget for the loop, checked between iterations
    pub time_limit: Option<Duration>,
}

impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 1000,
            dedup_patterns: true,
            time_limit: None,
        }
    }
}

impl ColumnGenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_dedup_patterns(mut self, dedup: bool) -> Self {
        self.dedup_patterns = dedup;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}
