/// Initial Bradley-Terry strength assigned to every candidate at the start of a fit.
pub const INITIAL_BRADLEY_TERRY_RATING: f64 = 1.0;

/// Fixed number of majorization-minimization sweeps.
///
/// Enough for the sparse single-comparison matrices produced here (N up to ~50).
/// A convergence tolerance can be set on top of this to stop earlier.
pub const BRADLEY_TERRY_ITERATIONS: usize = 10;

/// How many candidates a ranking run returns by default.
pub const DEFAULT_TOP_K: usize = 3;

/// With this many candidates or fewer no comparisons are run and every
/// candidate is returned unscored. Does not depend on K.
pub const SHORT_CIRCUIT_THRESHOLD: usize = 3;

/// Tolerance used when checking that a score vector sums to one.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;
