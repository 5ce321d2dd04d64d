//! Fetch stages: archive history and daily forecasts into observation caches.

use crate::config::{http_client, Settings};
use anyhow::Context;
use log::{info, warn};
use slope_obs::cache::ObservationCache;
use slope_obs::normalize::missing_days;
use slope_obs::{jma, owm};
use slope_utils::dates::{horizon_window, lookback_window};
use std::path::Path;

/// Fetch history for every distinct history station and write the cache.
///
/// A station whose source fails is logged and left out of the cache.
pub async fn run_history(settings: &Settings, days: u32, output: &Path) -> anyhow::Result<()> {
    let client = http_client()?;
    let (start, end) = lookback_window(settings.today, days);
    info!("Fetching archive history {} to {}", start, end);

    let mut cache = ObservationCache::new(days, jma::DATA_SOURCE);
    for resort in settings.resorts.resorts() {
        if cache.get(&resort.history_key).is_some() {
            continue;
        }
        match jma::fetch_history(&client, resort, settings.today, days).await {
            Ok(observations) => {
                let gaps = missing_days(&observations, start, end);
                if !gaps.is_empty() {
                    warn!("{}: no archive rows for {:?}", resort.history_key, gaps);
                }
                info!("{}: {} archive days", resort.history_key, observations.len());
                cache.insert(&resort.history_key, observations);
            }
            Err(e) => warn!("Skipping history for {}: {}", resort.history_key, e),
        }
    }

    ensure_parent(output)?;
    cache
        .save(output)
        .with_context(|| format!("writing history cache {}", output.display()))?;
    info!("History complete. Output: {}", output.display());
    Ok(())
}

/// Fetch the forecast horizon for every resort and write the cache.
pub async fn run_forecast(
    settings: &Settings,
    days: u32,
    api_key: &str,
    output: &Path,
) -> anyhow::Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!("a forecast API key is required (--api-key or OPENWEATHER_API_KEY)");
    }
    let client = http_client()?;
    let (start, end) = horizon_window(settings.today, days);
    info!("Fetching forecasts {} to {}", start, end);

    let mut cache = ObservationCache::new(days, owm::DATA_SOURCE);
    for resort in settings.resorts.resorts() {
        match owm::fetch_forecast(&client, resort, api_key, settings.today, days).await {
            Ok(observations) => {
                let gaps = missing_days(&observations, start, end);
                if !gaps.is_empty() {
                    warn!("{}: forecast does not cover {:?}", resort.resort_id, gaps);
                }
                info!("{}: {} forecast days", resort.resort_id, observations.len());
                cache.insert(&resort.resort_id, observations);
            }
            Err(e) => warn!("Skipping forecast for {}: {}", resort.resort_id, e),
        }
    }

    ensure_parent(output)?;
    cache
        .save(output)
        .with_context(|| format!("writing forecast cache {}", output.display()))?;
    info!("Forecast complete. Output: {}", output.display());
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}
