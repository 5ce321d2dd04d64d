use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 8;

/// The eight classifier inputs for one course and day.
///
/// The classifier is order-sensitive and was trained on exactly the order of
/// [`ModelInput::NAMES`]; [`ModelInput::to_array`] is the only way features
/// leave this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    #[serde(rename = "MaxSnowDepth")]
    pub max_snow_depth: f64,
    #[serde(rename = "Snowfall")]
    pub snowfall: f64,
    #[serde(rename = "AvgWindSpeed")]
    pub avg_wind_speed: f64,
    #[serde(rename = "Adj_Temp_Min")]
    pub adj_temp_min: f64,
    #[serde(rename = "Night_Chill_Factor")]
    pub night_chill_factor: f64,
    #[serde(rename = "Cumulative_Heat_History")]
    pub cumulative_heat_history: f64,
    #[serde(rename = "Surface_Hardening_Risk")]
    pub surface_hardening_risk: f64,
    #[serde(rename = "Course_Elev")]
    pub course_elev: f64,
}

impl ModelInput {
    pub const NAMES: [&'static str; FEATURE_COUNT] = [
        "MaxSnowDepth",
        "Snowfall",
        "AvgWindSpeed",
        "Adj_Temp_Min",
        "Night_Chill_Factor",
        "Cumulative_Heat_History",
        "Surface_Hardening_Risk",
        "Course_Elev",
    ];

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.max_snow_depth,
            self.snowfall,
            self.avg_wind_speed,
            self.adj_temp_min,
            self.night_chill_factor,
            self.cumulative_heat_history,
            self.surface_hardening_risk,
            self.course_elev,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [max_snow_depth, snowfall, avg_wind_speed, adj_temp_min, night_chill_factor, cumulative_heat_history, surface_hardening_risk, course_elev] =
            values;
        ModelInput {
            max_snow_depth,
            snowfall,
            avg_wind_speed,
            adj_temp_min,
            night_chill_factor,
            cumulative_heat_history,
            surface_hardening_risk,
            course_elev,
        }
    }
}

/// Model inputs tagged with the course and day they describe.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub date: NaiveDate,
    pub course_elevation_m: u32,
    pub inputs: ModelInput,
}

/// Accumulator threaded from the last archive day through every forecast day.
///
/// `cumulative_heat_c` and `max_snow_depth_cm` only ever grow: the model
/// tracks heat exposure and snow accumulation, never melt or settling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarriedState {
    /// Previous day's elevation-adjusted maximum temperature.
    pub prev_day_max_adj_c: f64,
    pub cumulative_heat_c: f64,
    pub max_snow_depth_cm: f64,
}
