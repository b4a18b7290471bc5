//! Penalization of queries that failed suspiciously fast.
//!
//! A query that failed `n` times but whose total time is below `n` times the penalty budget most
//! likely failed without being timed out fairly (e.g., the connection was refused). Its total time
//! is inflated by the budget for every failure so that fast failures do not look favorable.

/// The penalty that is added per failure, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenaltyPolicy {
    per_failure: f64,
}

impl PenaltyPolicy {
    /// The penalty used by IGUANA if nothing else is configured.
    pub const DEFAULT_PENALTY_MS: u64 = 180_000;

    #[allow(clippy::cast_precision_loss, reason = "Penalties are far below 2^53 ms")]
    pub fn new(per_failure_ms: u64) -> Self {
        Self {
            per_failure: per_failure_ms as f64,
        }
    }

    /// The penalty per failure in milliseconds.
    pub fn per_failure(&self) -> f64 {
        self.per_failure
    }

    /// Returns the penalized total time of a query.
    ///
    /// The result is never smaller than `total_time`.
    #[allow(clippy::cast_precision_loss, reason = "Failure counts are far below 2^53")]
    pub fn penalized_time(&self, total_time: f64, failed: u64) -> f64 {
        let budget = self.per_failure * failed as f64;
        if failed > 0 && total_time < budget {
            total_time + budget
        } else {
            total_time
        }
    }
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PENALTY_MS)
    }
}

/// Accumulates the penalized QPS of the queries of a task.
#[derive(Clone, Copy, Debug, Default)]
pub struct PenalizedAverage {
    sum: f64,
    count: usize,
}

impl PenalizedAverage {
    pub fn add(&mut self, penalized_qps: f64) {
        self.sum += penalized_qps;
        self.count += 1;
    }

    /// Returns the mean over all added values, or zero if nothing was added.
    #[allow(clippy::cast_precision_loss, reason = "Query counts are far below 2^53")]
    pub fn finish(self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl Extend<f64> for PenalizedAverage {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for value in iter {
            self.add(value);
        }
    }
}
