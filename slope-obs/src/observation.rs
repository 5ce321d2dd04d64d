use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while fetching or parsing a weather source.
///
/// Every variant means the source is unavailable for this run; callers log
/// it and skip the affected resort.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },
}

/// One calendar day of weather at an observation point.
///
/// Both the archive scraper and the forecast aggregator produce this shape;
/// fields a source cannot supply are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    #[serde(rename = "precipitation_total_mm", alias = "precipitation_mm")]
    pub precipitation_mm: Option<f64>,
    pub temp_avg_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub wind_avg_ms: Option<f64>,
    pub wind_max_ms: Option<f64>,
    /// Not provided by the forecast source.
    pub sunshine_h: Option<f64>,
    /// Accumulation for the day, centimetres.
    pub snowfall_cm: Option<f64>,
    /// Not provided by the forecast source.
    pub snow_depth_max_cm: Option<f64>,
}

impl DailyObservation {
    /// An observation for `date` with every measurement unknown.
    pub fn empty(date: NaiveDate) -> Self {
        DailyObservation {
            date,
            precipitation_mm: None,
            temp_avg_c: None,
            temp_max_c: None,
            temp_min_c: None,
            wind_avg_ms: None,
            wind_max_ms: None,
            sunshine_h: None,
            snowfall_cm: None,
            snow_depth_max_cm: None,
        }
    }

    /// `min <= avg <= max` for whichever of the three temperatures are present.
    pub fn temperatures_consistent(&self) -> bool {
        let ordered = |low: Option<f64>, high: Option<f64>| match (low, high) {
            (Some(low), Some(high)) => low <= high,
            _ => true,
        };
        ordered(self.temp_min_c, self.temp_avg_c)
            && ordered(self.temp_avg_c, self.temp_max_c)
            && ordered(self.temp_min_c, self.temp_max_c)
    }
}

/// One sub-daily sample from the forecast source (3-hour window).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Start of the window in the resort's local offset.
    pub timestamp: DateTime<FixedOffset>,
    pub temp_c: Option<f64>,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub wind_speed_ms: f64,
    pub precipitation_mm: Option<f64>,
    /// Snowfall volume for the window in millimetres.
    pub snowfall_mm: Option<f64>,
}

/// One day row of the archive site's daily table, cells still as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawHistoryRow {
    pub month: u32,
    pub day: u32,
    pub precipitation: String,
    pub temp_avg: String,
    pub temp_max: String,
    pub temp_min: String,
    pub wind_avg: String,
    pub wind_max: String,
    pub sunshine: String,
    pub snowfall: String,
    pub snow_depth: String,
}

#[cfg(test)]
mod tests {
    use super::DailyObservation;
    use chrono::NaiveDate;

    fn day() -> DailyObservation {
        DailyObservation::empty(NaiveDate::from_ymd_opt(2025, 11, 8).unwrap())
    }

    #[test]
    fn test_temperature_ordering() {
        let mut obs = day();
        assert!(obs.temperatures_consistent());
        obs.temp_min_c = Some(-3.0);
        obs.temp_avg_c = Some(0.5);
        obs.temp_max_c = Some(4.0);
        assert!(obs.temperatures_consistent());
        obs.temp_avg_c = Some(5.0);
        assert!(!obs.temperatures_consistent());
    }

    #[test]
    fn test_serde_uses_cache_field_names() {
        let mut obs = day();
        obs.precipitation_mm = Some(1.5);
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["date"], "2025-11-08");
        assert_eq!(json["precipitation_total_mm"], 1.5);
        assert!(json["sunshine_h"].is_null());

        let back: DailyObservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, obs);
    }
}
