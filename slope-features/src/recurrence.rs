//! The day-by-day feature recurrence for one course.

use crate::elevation::{adjusted_temp, correction};
use crate::features::{CarriedState, FeatureVector, ModelInput};
use chrono::NaiveDate;
use slope_obs::observation::DailyObservation;
use thiserror::Error;

/// Weight applied to the hardening risk when the adjusted minimum is below 0 °C.
pub const SUBZERO_HARDENING_WEIGHT: f64 = 1.5;

/// Heat only accrues above this adjusted maximum, °C.
pub const FREEZING_POINT_C: f64 = 0.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    #[error("{date}: required field {field} is missing")]
    MissingField { date: NaiveDate, field: &'static str },
    #[error("need at least {required} history days, found {available}")]
    InsufficientHistory { available: usize, required: usize },
}

pub(crate) fn required(
    value: Option<f64>,
    date: NaiveDate,
    field: &'static str,
) -> Result<f64, FeatureError> {
    value
        .filter(|v| v.is_finite())
        .ok_or(FeatureError::MissingField { date, field })
}

/// Daily heat contribution: the adjusted maximum above freezing, floored at 0.
pub fn daily_heat(adj_max_c: f64) -> f64 {
    (adj_max_c - FREEZING_POINT_C).max(0.0)
}

/// Wind-driven crust formation proxy.
pub fn hardening_risk(wind_avg_ms: f64, adj_min_c: f64) -> f64 {
    let weight = if adj_min_c < FREEZING_POINT_C {
        SUBZERO_HARDENING_WEIGHT
    } else {
        1.0
    };
    wind_avg_ms.powi(2) * weight
}

/// Recurrence state for one course: its elevation pair and carried state.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecurrence {
    course_elevation_m: u32,
    delta_c: f64,
    state: CarriedState,
}

impl CourseRecurrence {
    pub fn new(reference_elevation_m: f64, course_elevation_m: u32, seed: CarriedState) -> Self {
        CourseRecurrence {
            course_elevation_m,
            delta_c: correction(reference_elevation_m, f64::from(course_elevation_m)),
            state: seed,
        }
    }

    /// Correction between the history station and this course.
    pub fn correction(&self) -> f64 {
        self.delta_c
    }

    pub fn state(&self) -> &CarriedState {
        &self.state
    }

    /// Compute one day's features and advance the carried state.
    ///
    /// On error the state is left untouched.
    pub fn step(&mut self, observation: &DailyObservation) -> Result<FeatureVector, FeatureError> {
        let date = observation.date;
        let temp_min = required(observation.temp_min_c, date, "temp_min_c")?;
        let temp_max = required(observation.temp_max_c, date, "temp_max_c")?;
        let wind_avg = required(observation.wind_avg_ms, date, "wind_avg_ms")?;
        let snowfall = required(observation.snowfall_cm, date, "snowfall_cm")?;

        let adj_min = adjusted_temp(temp_min, self.delta_c);
        let adj_max = adjusted_temp(temp_max, self.delta_c);
        let night_chill = self.state.prev_day_max_adj_c - adj_min;
        self.state.cumulative_heat_c += daily_heat(adj_max);

        let features = FeatureVector {
            date,
            course_elevation_m: self.course_elevation_m,
            inputs: ModelInput {
                max_snow_depth: self.state.max_snow_depth_cm,
                snowfall,
                avg_wind_speed: wind_avg,
                adj_temp_min: adj_min,
                night_chill_factor: night_chill,
                cumulative_heat_history: self.state.cumulative_heat_c,
                surface_hardening_risk: hardening_risk(wind_avg, adj_min),
                course_elev: f64::from(self.course_elevation_m),
            },
        };

        self.state.max_snow_depth_cm += snowfall;
        self.state.prev_day_max_adj_c = adj_max;
        Ok(features)
    }
}

/// Result of running the recurrence over a forecast horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceOutput {
    pub features: Vec<FeatureVector>,
    /// Days omitted from `features`, with the reason.
    pub dropped: Vec<FeatureError>,
    pub final_state: CarriedState,
}

/// Run the recurrence over `observations` in ascending date order.
///
/// A day missing a required field is reported in `dropped` and skipped; the
/// following days continue from the unchanged state.
pub fn run_recurrence(
    observations: &[DailyObservation],
    seed: CarriedState,
    reference_elevation_m: f64,
    course_elevation_m: u32,
) -> RecurrenceOutput {
    let mut ordered: Vec<&DailyObservation> = observations.iter().collect();
    ordered.sort_by_key(|o| o.date);

    let mut recurrence = CourseRecurrence::new(reference_elevation_m, course_elevation_m, seed);
    let mut features = Vec::with_capacity(ordered.len());
    let mut dropped = Vec::new();
    for observation in ordered {
        match recurrence.step(observation) {
            Ok(vector) => features.push(vector),
            Err(e) => dropped.push(e),
        }
    }
    RecurrenceOutput {
        features,
        dropped,
        final_state: recurrence.state,
    }
}
