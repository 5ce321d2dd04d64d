//! History and forecast caches written between pipeline stages.
//!
//! Both share one shape: a `metadata` header plus one array of daily
//! observations per key (history key for the archive, resort id for the
//! forecast).

use crate::observation::DailyObservation;
use serde::{Deserialize, Serialize};
use slope_utils::{cache, error::CacheError};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub date_run: String,
    pub target_period_days: u32,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationCache {
    pub metadata: CacheMetadata,
    #[serde(flatten)]
    pub records: BTreeMap<String, Vec<DailyObservation>>,
}

impl ObservationCache {
    pub fn new(target_period_days: u32, data_source: &str) -> Self {
        ObservationCache {
            metadata: CacheMetadata {
                date_run: cache::timestamp_now(),
                target_period_days,
                data_source: data_source.to_string(),
            },
            records: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, observations: Vec<DailyObservation>) {
        self.records.insert(key.to_string(), observations);
    }

    pub fn get(&self, key: &str) -> Option<&[DailyObservation]> {
        self.records.get(key).map(Vec::as_slice)
    }

    pub fn load(path: &Path) -> Result<Self, CacheError> {
        cache::read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        cache::write_json(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cache_shape_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("past_data.json");
        let mut obs = DailyObservation::empty(NaiveDate::from_ymd_opt(2025, 11, 8).unwrap());
        obs.temp_max_c = Some(2.5);
        obs.snow_depth_max_cm = Some(40.0);

        let mut cache = ObservationCache::new(5, "test source");
        cache.insert("yuzawa", vec![obs.clone()]);
        cache.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["metadata"]["target_period_days"], 5);
        assert_eq!(raw["yuzawa"][0]["temp_max_c"], 2.5);

        let back = ObservationCache::load(&path).unwrap();
        assert_eq!(back.get("yuzawa"), Some(&[obs][..]));
        assert_eq!(back.get("minakami"), None);
        assert_eq!(back.records.len(), 1);
    }

    #[test]
    fn test_malformed_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("past_data.json");
        std::fs::write(&path, r#"{"metadata": {"date_run": "x"}, "yuzawa": "oops"}"#).unwrap();
        assert!(matches!(
            ObservationCache::load(&path),
            Err(CacheError::Malformed { .. })
        ));
    }
}
