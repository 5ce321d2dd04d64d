//! The feature cache handed from feature assembly to prediction.
//!
//! Features are written as the fixed-order 8-element array. On reload the
//! object form keyed by feature name is accepted too; both land in the same
//! [`ModelInput`], so the order survives either way.

use crate::features::{FeatureVector, ModelInput, FEATURE_COUNT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slope_utils::{cache, error::CacheError};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValues {
    Ordered([f64; FEATURE_COUNT]),
    Named(ModelInput),
}

impl From<FeatureValues> for ModelInput {
    fn from(values: FeatureValues) -> Self {
        match values {
            FeatureValues::Ordered(array) => ModelInput::from_array(array),
            FeatureValues::Named(input) => input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(alias = "Course")]
    pub course: u32,
    #[serde(alias = "Features")]
    pub features: FeatureValues,
}

impl From<&FeatureVector> for FeatureRecord {
    fn from(vector: &FeatureVector) -> Self {
        FeatureRecord {
            date: vector.date,
            course: vector.course_elevation_m,
            features: FeatureValues::Ordered(vector.inputs.to_array()),
        }
    }
}

impl From<&FeatureRecord> for FeatureVector {
    fn from(record: &FeatureRecord) -> Self {
        FeatureVector {
            date: record.date,
            course_elevation_m: record.course,
            inputs: record.features.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCache {
    pub timestamp: String,
    pub features: BTreeMap<String, Vec<FeatureRecord>>,
}

impl FeatureCache {
    pub fn from_features(features: &BTreeMap<String, Vec<FeatureVector>>) -> Self {
        FeatureCache {
            timestamp: cache::timestamp_now(),
            features: features
                .iter()
                .map(|(key, vectors)| (key.clone(), vectors.iter().map(FeatureRecord::from).collect()))
                .collect(),
        }
    }

    pub fn to_features(&self) -> BTreeMap<String, Vec<FeatureVector>> {
        self.features
            .iter()
            .map(|(key, records)| (key.clone(), records.iter().map(FeatureVector::from).collect()))
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self, CacheError> {
        cache::read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        cache::write_json(path, self)
    }
}
