// Indicator computation and rolling statistics
pub mod market_data;

// Model inputs: feature matrices, windows, scalers
pub mod feature_engineering_service;

// Forecasting models
pub mod ml;

// Request orchestration
pub mod prediction_service;
