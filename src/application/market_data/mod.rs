// Market data processing modules
pub mod indicators;
pub mod statistical_features;
