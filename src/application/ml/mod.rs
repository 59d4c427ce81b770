pub mod confidence;
pub mod predictor;
pub mod regression_predictor;
pub mod sequence_predictor;
