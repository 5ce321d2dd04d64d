//! Per-resort seeding and per-course feature assembly.
//!
//! Every resort seeds one [`CarriedState`] from its archive history. The
//! seed's elevation correction uses the resort's highest course; the same
//! seed is then handed to every course, and each course applies its own
//! correction once the forecast recurrence starts.

use crate::elevation::{adjusted_temp, correction};
use crate::features::{CarriedState, FeatureVector};
use crate::recurrence::{daily_heat, required, run_recurrence, FeatureError};
use log::{debug, info, warn};
use slope_obs::observation::DailyObservation;
use slope_obs::resort::{Resort, ResortTable};
use std::collections::BTreeMap;

/// History days needed to seed the carried state.
pub const MIN_HISTORY_DAYS: usize = 2;

/// Correction at the resort's primary (highest) course.
pub fn resort_level_correction(resort: &Resort) -> Option<f64> {
    resort
        .primary_course_elevation_m()
        .map(|top| correction(resort.station_elevation_m, f64::from(top)))
}

/// Seed the carried state from archive history.
///
/// History is ordered by date first. The previous-day peak comes from the
/// second-to-last day, cumulative heat sums the whole history, and snow depth
/// comes from the last day that reported one.
pub fn seed_state(
    history: &[DailyObservation],
    reference_elevation_m: f64,
    seed_course_elevation_m: f64,
) -> Result<CarriedState, FeatureError> {
    if history.len() < MIN_HISTORY_DAYS {
        return Err(FeatureError::InsufficientHistory {
            available: history.len(),
            required: MIN_HISTORY_DAYS,
        });
    }
    let mut ordered: Vec<&DailyObservation> = history.iter().collect();
    ordered.sort_by_key(|o| o.date);
    let delta_seed = correction(reference_elevation_m, seed_course_elevation_m);

    let second_to_last = ordered[ordered.len() - 2];
    let prev_max = required(second_to_last.temp_max_c, second_to_last.date, "temp_max_c")?;

    let cumulative_heat_c: f64 = ordered
        .iter()
        .map(|o| match o.temp_max_c {
            Some(max) if max.is_finite() => daily_heat(adjusted_temp(max, delta_seed)),
            _ => {
                debug!("No archive maximum on {}; no heat counted", o.date);
                0.0
            }
        })
        .sum();

    let max_snow_depth_cm = match ordered.iter().rev().find_map(|o| o.snow_depth_max_cm) {
        Some(depth) => {
            if ordered.last().and_then(|o| o.snow_depth_max_cm).is_none() {
                warn!("Latest archive day has no snow depth; using an earlier reading");
            }
            depth
        }
        None => {
            warn!("Archive history has no snow depth; seeding 0 cm");
            0.0
        }
    };

    Ok(CarriedState {
        prev_day_max_adj_c: adjusted_temp(prev_max, delta_seed),
        cumulative_heat_c,
        max_snow_depth_cm,
    })
}

/// A course key left out of the output, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCourse {
    pub key: String,
    pub reason: String,
}

/// A forecast day dropped from one course's sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedDay {
    pub key: String,
    pub error: FeatureError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssemblyReport {
    /// `"{resort}_{course}m"` to features in ascending date order.
    pub features: BTreeMap<String, Vec<FeatureVector>>,
    pub skipped: Vec<SkippedCourse>,
    pub dropped_days: Vec<DroppedDay>,
}

impl AssemblyReport {
    fn skip_resort(&mut self, resort: &Resort, reason: String) {
        warn!("Skipping {}: {}", resort.resort_id, reason);
        for key in resort.course_keys() {
            self.skipped.push(SkippedCourse {
                key,
                reason: reason.clone(),
            });
        }
    }
}

/// Builds course feature sequences for every configured resort.
#[derive(Debug, Clone)]
pub struct CourseFeatureAssembler {
    resorts: ResortTable,
}

impl CourseFeatureAssembler {
    pub fn new(resorts: ResortTable) -> Self {
        CourseFeatureAssembler { resorts }
    }

    pub fn resorts(&self) -> &ResortTable {
        &self.resorts
    }

    /// Seed one resort's carried state from its history.
    pub fn seed_resort(
        &self,
        resort: &Resort,
        history: &[DailyObservation],
    ) -> Result<CarriedState, FeatureError> {
        let seed_course = resort
            .primary_course_elevation_m()
            .map(f64::from)
            .unwrap_or(resort.station_elevation_m);
        seed_state(history, resort.station_elevation_m, seed_course)
    }

    /// Run every course of one resort over its forecast horizon.
    pub fn assemble_resort(
        &self,
        resort: &Resort,
        history: &[DailyObservation],
        forecast: &[DailyObservation],
        report: &mut AssemblyReport,
    ) {
        let seed = match self.seed_resort(resort, history) {
            Ok(seed) => seed,
            Err(e) => {
                report.skip_resort(resort, e.to_string());
                return;
            }
        };
        debug!("Seed for {}: {:?}", resort.resort_id, seed);
        for course in &resort.course_elevations_m {
            let key = resort.course_key(*course);
            let output = run_recurrence(forecast, seed, resort.station_elevation_m, *course);
            for error in output.dropped {
                warn!("{}: dropped day: {}", key, error);
                report.dropped_days.push(DroppedDay {
                    key: key.clone(),
                    error,
                });
            }
            info!("{}: {} feature days", key, output.features.len());
            report.features.insert(key, output.features);
        }
    }

    /// Assemble features for every resort.
    ///
    /// `history` is keyed by each resort's history key and `forecasts` by
    /// resort id. Resorts missing either input, or with too little history,
    /// are absent from the features and listed in `skipped`.
    pub fn assemble(
        &self,
        history: &BTreeMap<String, Vec<DailyObservation>>,
        forecasts: &BTreeMap<String, Vec<DailyObservation>>,
    ) -> AssemblyReport {
        let mut report = AssemblyReport::default();
        for resort in self.resorts.resorts() {
            let Some(past) = history.get(&resort.history_key) else {
                report.skip_resort(resort, format!("no history for {}", resort.history_key));
                continue;
            };
            let Some(future) = forecasts.get(&resort.resort_id).filter(|f| !f.is_empty()) else {
                report.skip_resort(resort, "no forecast data".to_string());
                continue;
            };
            self.assemble_resort(resort, past, future, &mut report);
        }
        report
    }
}
