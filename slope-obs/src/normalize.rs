//! Conversion of raw source rows into [`DailyObservation`]s.
//!
//! The archive scraper yields one text row per day; the forecast API yields
//! 3-hourly samples that are folded into one record per local calendar day.

use crate::date_range::DateRange;
use crate::observation::{DailyObservation, ForecastSample, RawHistoryRow};
use chrono::NaiveDate;
use log::{debug, warn};
use slope_utils::dates::{horizon_window, infer_year, lookback_window};
use std::collections::BTreeMap;

/// Archive marker for "phenomenon did not occur".
pub const NO_PHENOMENON: &str = "--";

/// Forecast snowfall arrives in millimetres; features use centimetres.
pub const SNOWFALL_MM_PER_CM: f64 = 10.0;

/// Parse one archive cell.
///
/// Quality suffixes (`)` and `]`) are dropped, `--` reads as zero, and any
/// other non-numeric content (`×`, `///`, `#`, empty) is unknown.
pub fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == NO_PHENOMENON {
        return Some(0.0);
    }
    trimmed
        .trim_end_matches([')', ']', ' '])
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Normalize scraped archive rows to the `days`-long window ending at `today`.
///
/// Years are inferred from `today`. Rows outside the window are dropped and
/// the result is sorted ascending with one record per date.
pub fn normalize_history(
    rows: &[RawHistoryRow],
    today: NaiveDate,
    days: u32,
) -> Vec<DailyObservation> {
    let window = DateRange::from(lookback_window(today, days));
    let mut observations: Vec<DailyObservation> = rows
        .iter()
        .filter_map(|row| {
            let date = match infer_year(row.month, row.day, today) {
                Ok(date) => date,
                Err(e) => {
                    warn!("Skipping archive row {}/{}: {}", row.month, row.day, e);
                    return None;
                }
            };
            if !window.contains(&date) {
                return None;
            }
            let observation = DailyObservation {
                date,
                precipitation_mm: parse_cell(&row.precipitation),
                temp_avg_c: parse_cell(&row.temp_avg),
                temp_max_c: parse_cell(&row.temp_max),
                temp_min_c: parse_cell(&row.temp_min),
                wind_avg_ms: parse_cell(&row.wind_avg),
                wind_max_ms: parse_cell(&row.wind_max),
                sunshine_h: parse_cell(&row.sunshine),
                snowfall_cm: parse_cell(&row.snowfall),
                snow_depth_max_cm: parse_cell(&row.snow_depth),
            };
            if !observation.temperatures_consistent() {
                warn!("Archive temperatures out of order on {}", date);
            }
            Some(observation)
        })
        .collect();
    observations.sort_by_key(|o| o.date);
    observations.dedup_by_key(|o| o.date);
    observations
}

#[derive(Debug)]
struct DayAccumulator {
    temp_max: f64,
    temp_min: f64,
    temp_sum: f64,
    temp_count: u32,
    wind_sum: f64,
    wind_max: f64,
    sample_count: u32,
    precipitation_mm: f64,
    snowfall_mm: f64,
}

impl Default for DayAccumulator {
    fn default() -> Self {
        DayAccumulator {
            temp_max: f64::NEG_INFINITY,
            temp_min: f64::INFINITY,
            temp_sum: 0.0,
            temp_count: 0,
            wind_sum: 0.0,
            wind_max: f64::NEG_INFINITY,
            sample_count: 0,
            precipitation_mm: 0.0,
            snowfall_mm: 0.0,
        }
    }
}

impl DayAccumulator {
    fn add(&mut self, sample: &ForecastSample) {
        self.temp_max = self.temp_max.max(sample.temp_max_c);
        self.temp_min = self.temp_min.min(sample.temp_min_c);
        if let Some(temp) = sample.temp_c {
            self.temp_sum += temp;
            self.temp_count += 1;
        }
        self.wind_sum += sample.wind_speed_ms;
        self.wind_max = self.wind_max.max(sample.wind_speed_ms);
        self.sample_count += 1;
        self.precipitation_mm += sample.precipitation_mm.unwrap_or(0.0);
        self.snowfall_mm += sample.snowfall_mm.unwrap_or(0.0);
    }

    fn finish(self, date: NaiveDate) -> DailyObservation {
        let count = f64::from(self.sample_count);
        let temp_avg = if self.temp_count > 0 {
            self.temp_sum / f64::from(self.temp_count)
        } else {
            (self.temp_max + self.temp_min) / 2.0
        };
        DailyObservation {
            date,
            precipitation_mm: Some(self.precipitation_mm),
            temp_avg_c: Some(temp_avg),
            temp_max_c: Some(self.temp_max),
            temp_min_c: Some(self.temp_min),
            wind_avg_ms: Some(self.wind_sum / count),
            wind_max_ms: Some(self.wind_max),
            sunshine_h: None,
            snowfall_cm: Some(self.snowfall_mm / SNOWFALL_MM_PER_CM),
            snow_depth_max_cm: None,
        }
    }
}

/// Fold 3-hourly forecast samples into one observation per local calendar day.
///
/// Only days in `today ..= today + days - 1` are kept. Temperatures take the
/// max of maxes and min of mins, wind is averaged, precipitation and
/// snowfall are summed (snowfall converted from mm to cm).
pub fn aggregate_forecast(
    samples: &[ForecastSample],
    today: NaiveDate,
    days: u32,
) -> Vec<DailyObservation> {
    let window = DateRange::from(horizon_window(today, days));
    let mut daily: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    let mut discarded = 0usize;
    for sample in samples {
        let date = sample.timestamp.date_naive();
        if !window.contains(&date) {
            discarded += 1;
            continue;
        }
        daily.entry(date).or_default().add(sample);
    }
    if discarded > 0 {
        debug!("Discarded {} forecast samples outside {:?}", discarded, window);
    }
    daily
        .into_iter()
        .map(|(date, accumulator)| accumulator.finish(date))
        .collect()
}

/// Dates in `start..=end` that have no observation.
pub fn missing_days(
    observations: &[DailyObservation],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    DateRange(start, end)
        .filter(|date| !observations.iter().any(|o| o.date == *date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn row(month: u32, day: u32, temp_max: &str, snow_depth: &str) -> RawHistoryRow {
        RawHistoryRow {
            month,
            day,
            precipitation: "0.5".into(),
            temp_avg: "1.0".into(),
            temp_max: temp_max.into(),
            temp_min: "-2.0".into(),
            wind_avg: "1.8".into(),
            wind_max: "4.1".into(),
            sunshine: "3.2".into(),
            snowfall: "--".into(),
            snow_depth: snow_depth.into(),
        }
    }

    fn sample(hour: u32, day: u32, min: f64, max: f64, wind: f64, snow: Option<f64>) -> ForecastSample {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        ForecastSample {
            timestamp: jst.with_ymd_and_hms(2025, 11, day, hour, 0, 0).unwrap(),
            temp_c: Some((min + max) / 2.0),
            temp_min_c: min,
            temp_max_c: max,
            wind_speed_ms: wind,
            precipitation_mm: Some(0.2),
            snowfall_mm: snow,
        }
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("3.5"), Some(3.5));
        assert_eq!(parse_cell(" -1.2 "), Some(-1.2));
        assert_eq!(parse_cell("12.0 )"), Some(12.0));
        assert_eq!(parse_cell("7]"), Some(7.0));
        assert_eq!(parse_cell("--"), Some(0.0));
        assert_eq!(parse_cell("×"), None);
        assert_eq!(parse_cell("///"), None);
        assert_eq!(parse_cell(""), None);
    }

    #[test]
    fn test_normalize_history_window_and_order() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 8).unwrap();
        let rows = vec![
            row(11, 8, "3.0", "12"),
            row(11, 2, "9.9", "0"), // outside a 5-day window
            row(11, 5, "1.0", "×"),
            row(11, 4, "2.0", "--"),
        ];
        let observations = normalize_history(&rows, today, 5);
        let dates: Vec<u32> = observations
            .iter()
            .map(|o| chrono::Datelike::day(&o.date))
            .collect();
        assert_eq!(dates, vec![4, 5, 8]);
        assert_eq!(observations[0].snow_depth_max_cm, Some(0.0));
        assert_eq!(observations[1].snow_depth_max_cm, None);
        assert_eq!(observations[2].temp_max_c, Some(3.0));
        assert_eq!(observations[2].snowfall_cm, Some(0.0));
    }

    #[test]
    fn test_normalize_history_across_new_year() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let rows = vec![row(1, 2, "0.0", "80"), row(12, 31, "1.0", "75")];
        let observations = normalize_history(&rows, today, 5);
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(observations[1].date, today);
    }

    #[test]
    fn test_aggregate_forecast() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 8).unwrap();
        let samples = vec![
            sample(3, 7, -9.0, -8.0, 1.0, None), // before today
            sample(0, 8, -4.0, -1.0, 2.0, Some(5.0)),
            sample(12, 8, -1.0, 3.0, 4.0, Some(10.0)),
            sample(21, 8, -6.0, -2.0, 6.0, None),
            sample(9, 9, -3.0, 0.5, 3.0, Some(2.0)),
            sample(9, 13, -3.0, 0.5, 3.0, None), // beyond the horizon
        ];
        let daily = aggregate_forecast(&samples, today, 5);
        assert_eq!(daily.len(), 2);

        let first = &daily[0];
        assert_eq!(first.date, today);
        assert_eq!(first.temp_max_c, Some(3.0));
        assert_eq!(first.temp_min_c, Some(-6.0));
        assert_eq!(first.wind_avg_ms, Some(4.0));
        assert_eq!(first.wind_max_ms, Some(6.0));
        assert!((first.snowfall_cm.unwrap() - 1.5).abs() < 1e-9);
        assert!((first.precipitation_mm.unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(first.sunshine_h, None);
        assert_eq!(first.snow_depth_max_cm, None);
        assert!(first.temperatures_consistent());

        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2025, 11, 9).unwrap());
        assert!((daily[1].snowfall_cm.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_uses_local_calendar_day() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 8).unwrap();
        // 2025-11-07T18:00Z is already the 8th in JST
        let utc_evening = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 11, 7, 18, 0, 0)
            .unwrap();
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let mut s = sample(0, 8, -2.0, 1.0, 2.0, None);
        s.timestamp = utc_evening.with_timezone(&jst);
        let daily = aggregate_forecast(&[s], today, 1);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, today);
    }

    #[test]
    fn test_missing_days() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 8).unwrap();
        let samples = vec![sample(0, 8, -4.0, -1.0, 2.0, None), sample(0, 10, -4.0, -1.0, 2.0, None)];
        let daily = aggregate_forecast(&samples, today, 3);
        let gaps = missing_days(&daily, today, NaiveDate::from_ymd_opt(2025, 11, 10).unwrap());
        assert_eq!(gaps, vec![NaiveDate::from_ymd_opt(2025, 11, 9).unwrap()]);
    }
}
