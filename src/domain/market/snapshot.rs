use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most recent value of each indicator, keyed by its display name
/// (`MA_20`, `RSI`, `BB_Upper`, ...). `None` marks an indicator whose
/// window is not yet filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    values: BTreeMap<String, Option<f64>>,
}

impl IndicatorSnapshot {
    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.values.insert(name.into(), value);
    }

    /// Value of `name`, `None` when unknown or undefined.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_as_flat_map() {
        let mut snapshot = IndicatorSnapshot::default();
        snapshot.insert("RSI", Some(55.5));
        snapshot.insert("MA_50", None);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["RSI"], 55.5);
        assert!(json["MA_50"].is_null());

        assert_eq!(snapshot.get("RSI"), Some(55.5));
        assert_eq!(snapshot.get("MA_50"), None);
        assert!(snapshot.contains("MA_50"));
    }
}
