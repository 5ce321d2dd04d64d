//! Offline stages: feature assembly and prediction over cached inputs.

use crate::config::Settings;
use crate::fetch::ensure_parent;
use anyhow::Context;
use log::{info, warn};
use slope_features::assembler::{AssemblyReport, CourseFeatureAssembler};
use slope_features::cache::FeatureCache;
use slope_obs::cache::ObservationCache;
use slope_predict::cache::PredictionCache;
use slope_predict::classifier::predict_all;
use slope_predict::command::CommandClassifier;
use std::path::Path;

/// Assemble course features from the history and forecast caches.
pub fn run_features(
    settings: &Settings,
    history: &Path,
    forecast: &Path,
    output: &Path,
) -> anyhow::Result<AssemblyReport> {
    let history = ObservationCache::load(history)
        .with_context(|| format!("loading history cache {}", history.display()))?;
    let forecast = ObservationCache::load(forecast)
        .with_context(|| format!("loading forecast cache {}", forecast.display()))?;

    let assembler = CourseFeatureAssembler::new(settings.resorts.clone());
    let report = assembler.assemble(&history.records, &forecast.records);
    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.key, skipped.reason);
    }
    info!(
        "{} courses assembled, {} skipped, {} days dropped",
        report.features.len(),
        report.skipped.len(),
        report.dropped_days.len()
    );

    ensure_parent(output)?;
    FeatureCache::from_features(&report.features)
        .save(output)
        .with_context(|| format!("writing feature cache {}", output.display()))?;
    info!("Features complete. Output: {}", output.display());
    Ok(report)
}

/// Score the feature cache and write the prediction cache.
pub fn run_predict(features: &Path, output: &Path, classifier: &str) -> anyhow::Result<PredictionCache> {
    let classifier = CommandClassifier::from_command_line(classifier)
        .context("the classifier command is empty")?;
    let features = FeatureCache::load(features)
        .with_context(|| format!("loading feature cache {}", features.display()))?
        .to_features();

    let predictions = PredictionCache::new(predict_all(&classifier, &features));
    for (key, course) in &predictions.predictions {
        for prediction in course {
            info!("{} {}: {}", key, prediction.date, prediction.top_condition);
        }
    }
    if predictions.predictions.len() < features.len() {
        warn!(
            "{} of {} courses could not be scored",
            features.len() - predictions.predictions.len(),
            features.len()
        );
    }

    ensure_parent(output)?;
    predictions
        .save(output)
        .with_context(|| format!("writing prediction cache {}", output.display()))?;
    info!("Predictions complete. Output: {}", output.display());
    Ok(predictions)
}
