//! The classifier seam and the mapping from course features to predictions.

use crate::condition::{ConditionPrediction, CONDITION_COUNT};
use log::{info, warn};
use slope_features::features::{FeatureVector, FEATURE_COUNT};
use std::collections::BTreeMap;
use thiserror::Error;

/// Allowed drift of a probability row's sum from 1 before renormalising.
pub const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("classifier could not be run: {0}")]
    Unavailable(String),
    #[error("classifier exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("classifier output could not be read: {0}")]
    Malformed(String),
    #[error("expected {expected} probability rows, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("row {row}: {reason}")]
    InvalidProbabilities { row: usize, reason: String },
}

/// A trained multi-class model over the eight ordered model inputs.
pub trait Classifier {
    /// One probability row per input row, in class index order.
    fn predict_proba(
        &self,
        rows: &[[f64; FEATURE_COUNT]],
    ) -> Result<Vec<[f64; CONDITION_COUNT]>, PredictionError>;
}

/// Check one probability row and scale it to sum to 1.
pub fn normalize_probabilities(
    row: usize,
    probabilities: [f64; CONDITION_COUNT],
) -> Result<[f64; CONDITION_COUNT], PredictionError> {
    let invalid = |reason: String| PredictionError::InvalidProbabilities { row, reason };
    if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(invalid(format!("probability {p} is not a finite non-negative number")));
    }
    let sum: f64 = probabilities.iter().sum();
    if sum <= 0.0 {
        return Err(invalid("probabilities sum to zero".to_string()));
    }
    if (sum - 1.0).abs() <= SUM_TOLERANCE {
        return Ok(probabilities);
    }
    Ok(probabilities.map(|p| p / sum))
}

/// Classify one course's feature sequence.
pub fn predict_course<C: Classifier + ?Sized>(
    classifier: &C,
    vectors: &[FeatureVector],
) -> Result<Vec<ConditionPrediction>, PredictionError> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<[f64; FEATURE_COUNT]> = vectors.iter().map(|v| v.inputs.to_array()).collect();
    let output = classifier.predict_proba(&rows)?;
    if output.len() != rows.len() {
        return Err(PredictionError::RowCount {
            expected: rows.len(),
            actual: output.len(),
        });
    }
    vectors
        .iter()
        .zip(output)
        .enumerate()
        .map(|(i, (vector, probabilities))| {
            let probabilities = normalize_probabilities(i, probabilities)?;
            Ok(ConditionPrediction::new(
                vector.date,
                vector.course_elevation_m,
                probabilities,
            ))
        })
        .collect()
}

/// Classify every course key; failing courses are logged and left out.
pub fn predict_all<C: Classifier + ?Sized>(
    classifier: &C,
    features: &BTreeMap<String, Vec<FeatureVector>>,
) -> BTreeMap<String, Vec<ConditionPrediction>> {
    let mut predictions = BTreeMap::new();
    for (key, vectors) in features {
        match predict_course(classifier, vectors) {
            Ok(course) => {
                info!("{}: {} predictions", key, course.len());
                predictions.insert(key.clone(), course);
            }
            Err(e) => warn!("{}: prediction failed: {}", key, e),
        }
    }
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use chrono::NaiveDate;
    use slope_features::features::ModelInput;

    /// Scores Slush by course elevation so courses are distinguishable.
    struct ElevationStub;

    impl Classifier for ElevationStub {
        fn predict_proba(
            &self,
            rows: &[[f64; FEATURE_COUNT]],
        ) -> Result<Vec<[f64; CONDITION_COUNT]>, PredictionError> {
            Ok(rows
                .iter()
                .map(|row| {
                    if row[7] < 1000.0 {
                        [1.0, 1.0, 0.0, 2.0]
                    } else {
                        [0.7, 0.1, 0.1, 0.1]
                    }
                })
                .collect())
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn predict_proba(
            &self,
            rows: &[[f64; FEATURE_COUNT]],
        ) -> Result<Vec<[f64; CONDITION_COUNT]>, PredictionError> {
            Ok(rows.iter().map(|_| [f64::NAN, 0.0, 0.0, 0.0]).collect())
        }
    }

    fn vector(d: u32, course: u32) -> FeatureVector {
        FeatureVector {
            date: NaiveDate::from_ymd_opt(2025, 11, d).unwrap(),
            course_elevation_m: course,
            inputs: ModelInput::from_array([150.0, 2.0, 4.0, -8.36, 10.36, 10.0, 24.0, f64::from(course)]),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_probabilities(0, [0.1, 0.2, 0.3, 0.4]).unwrap(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(normalize_probabilities(0, [1.0, 1.0, 0.0, 2.0]).unwrap(), [0.25, 0.25, 0.0, 0.5]);
        assert!(matches!(
            normalize_probabilities(3, [0.0; 4]),
            Err(PredictionError::InvalidProbabilities { row: 3, .. })
        ));
        assert!(normalize_probabilities(0, [-0.1, 0.5, 0.3, 0.3]).is_err());
        assert!(normalize_probabilities(0, [f64::INFINITY, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_predict_course() {
        let predictions = predict_course(&ElevationStub, &[vector(8, 900), vector(9, 900)]).unwrap();
        assert_eq!(predictions.len(), 2);
        for p in &predictions {
            assert!((p.probabilities.iter().sum::<f64>() - 1.0).abs() < SUM_TOLERANCE);
            assert_eq!(p.top_condition, Condition::Slush);
            assert_eq!(p.course_elevation_m, 900);
        }
        assert_eq!(predictions[1].date, NaiveDate::from_ymd_opt(2025, 11, 9).unwrap());
    }

    #[test]
    fn test_predict_course_rejects_short_output() {
        struct Short;
        impl Classifier for Short {
            fn predict_proba(
                &self,
                _rows: &[[f64; FEATURE_COUNT]],
            ) -> Result<Vec<[f64; CONDITION_COUNT]>, PredictionError> {
                Ok(vec![[1.0, 0.0, 0.0, 0.0]])
            }
        }
        assert_eq!(
            predict_course(&Short, &[vector(8, 900), vector(9, 900)]),
            Err(PredictionError::RowCount { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_predict_all() {
        let mut features = BTreeMap::new();
        features.insert("Kandatsu_900m".to_string(), vec![vector(8, 900)]);
        features.insert("Marunuma_1950m".to_string(), vec![vector(8, 1950)]);
        let predictions = predict_all(&ElevationStub, &features);
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions["Kandatsu_900m"][0].top_condition, Condition::Slush);
        assert_eq!(predictions["Marunuma_1950m"][0].top_condition, Condition::Powder);
    }

    #[test]
    fn test_failing_course_is_absent() {
        let mut features = BTreeMap::new();
        features.insert("Kandatsu_900m".to_string(), vec![vector(8, 900)]);
        assert!(predict_all(&Broken, &features).is_empty());
    }
}
