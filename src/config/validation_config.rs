//! Data-quality thresholds parsed from environment variables.

use super::parse_usize;
use anyhow::Result;

/// Validation environment configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationEnvConfig {
    /// Rows with a negative price tolerated before the series is rejected.
    pub max_negative_price_rows: usize,
}

impl ValidationEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            max_negative_price_rows: parse_usize("VALIDATION_MAX_NEGATIVE_PRICE_ROWS", 0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_config_defaults() {
        let config = ValidationEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.max_negative_price_rows, 0);
    }
}
