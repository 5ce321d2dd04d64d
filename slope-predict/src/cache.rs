use crate::condition::ConditionPrediction;
use serde::{Deserialize, Serialize};
use slope_utils::{cache, error::CacheError};
use std::collections::BTreeMap;
use std::path::Path;

/// Predictions per course key, as read by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCache {
    pub timestamp: String,
    pub predictions: BTreeMap<String, Vec<ConditionPrediction>>,
}

impl PredictionCache {
    pub fn new(predictions: BTreeMap<String, Vec<ConditionPrediction>>) -> Self {
        PredictionCache {
            timestamp: cache::timestamp_now(),
            predictions,
        }
    }

    pub fn load(path: &Path) -> Result<Self, CacheError> {
        cache::read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        cache::write_json(path, self)
    }
}
