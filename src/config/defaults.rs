//! System-wide default constants.
//!
//! Every configurable value starts here. Grouped by subsystem for easy
//! discovery; `AppConfig::default()` is assembled from these.

// ============================================================================
// Service
// ============================================================================

/// Service name reported by `health` and `info`.
pub const SERVICE_NAME: &str = "alloy-api";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ALLOY_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "alloy_config.toml";

// ============================================================================
// Models
// ============================================================================

/// Mode used when a request does not name one.
pub const DEFAULT_MODE: &str = crate::predictor::BASELINE_MODE;

/// HTTP timeout for artifact downloads (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Constraints
// ============================================================================

/// Allowed deviation of the composition sum from 100 wt%.
pub const SUM_EPSILON: f64 = crate::schema::DEFAULT_SUM_EPSILON;

// ============================================================================
// Search: Random Scan
// ============================================================================

/// Random-scan samples drawn per requested candidate.
///
/// Most draws miss a 10 % band, so the scan oversamples heavily.
pub const OVERSAMPLING_FACTOR: usize = 50;

/// Floor on the random-scan sample count.
pub const MIN_SCAN_SAMPLES: usize = 500;

// ============================================================================
// Search: Optimization
// ============================================================================

/// Pattern-search restarts per requested candidate.
pub const RESTARTS_PER_CANDIDATE: usize = 3;

/// Floor on the restart count.
pub const MIN_RESTARTS: usize = 12;

/// Coordinate sweeps per restart.
pub const MAX_ITERATIONS: usize = 150;

/// Initial pattern step, as a fraction of each bound width.
pub const INITIAL_STEP: f64 = 0.25;

/// A restart ends once its step shrinks below this fraction.
pub const MIN_STEP: f64 = 0.001;

/// Step multiplier after a sweep with no improvement.
pub const STEP_SHRINK: f64 = 0.5;

/// Consecutive sweeps with improvement below `IMPROVEMENT_EPSILON` before
/// a restart stops early.
pub const STALL_ITERATIONS: usize = 5;

/// Smallest objective decrease that counts as progress (MPa).
pub const IMPROVEMENT_EPSILON: f64 = 1e-4;

/// Euclidean radius (wt%) within which converged restarts are collapsed.
pub const OPTIMIZER_MERGE_DISTANCE: f64 = 0.5;

// ============================================================================
// Search: Aggregation
// ============================================================================

/// Manhattan radius (wt%) within which the aggregator treats two
/// compositions as the same alloy.
pub const DEDUP_DISTANCE: f64 = 1.0;

/// Maximum candidates contributed by the training-data lookup.
pub const MAX_TRAINING_MATCHES: usize = 10;

/// Base RNG seed. Restart `r` is seeded with `SEED + 1 + r`.
pub const SEED: u64 = 42;

/// Per-request budget for the generators (ms).
pub const DEADLINE_MS: u64 = 20_000;
