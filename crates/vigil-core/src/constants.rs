/// Local memory bound: most recent interactions kept per engine.
pub const LOCAL_MEMORY_BOUND: usize = 100;

/// Shared memory bound: most recent notable interactions kept across engines.
pub const SHARED_MEMORY_BOUND: usize = 500;

/// Score above which an entry is copied into the shared store.
pub const NOTABLE_THRESHOLD: f64 = 0.7;

/// Score above which the audit logger raises a warning-level alert.
pub const HIGH_SEVERITY_THRESHOLD: f64 = 0.7;

/// Neutral prior for metric fields the caller did not supply.
pub const NEUTRAL_PRIOR: f64 = 0.5;

/// Tolerance when checking that dimension weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-12;

/// Isolation forest: number of trees.
pub const ISOLATION_TREES: usize = 100;

/// Isolation forest: maximum sub-sample drawn per tree.
pub const ISOLATION_MAX_SAMPLES: usize = 256;

/// Isolation forest: fixed seed so repeated fits over the same corpus agree.
pub const ISOLATION_SEED: u64 = 42;

/// Clamp a score into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.3), 0.0);
        assert_eq!(clamp_unit(0.4), 0.4);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
    }
}
