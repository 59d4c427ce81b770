// Price series, indicator frames and snapshots
pub mod market;

// Model contracts and fit metrics
pub mod ml;

// Data quality checks
pub mod validation;

// Domain-specific error types
pub mod errors;
