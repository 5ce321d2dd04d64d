use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded CSV data for the configured resorts.
pub static CSV_OBJECT: &str = include_str!("../../fixtures/resorts.csv");

/// Expected number of columns in a resort CSV row.
pub const CSV_ROW_LENGTH: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ResortError {
    #[error("resort csv could not be read: {0}")]
    Csv(String),
    #[error("resort csv row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// A ski resort, the archive station used for its history, and its courses.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Resort {
    /// Key used for forecasts and course keys (e.g., "Kandatsu")
    pub resort_id: String,
    pub name: String,
    /// Key used for the history cache (e.g., "yuzawa")
    pub history_key: String,
    pub station_name: String,
    /// Archive prefecture number of the history station
    pub prec_no: u32,
    /// Archive block number; kept as text because of leading zeros
    pub block_no: String,
    /// Elevation of the history station in metres
    pub station_elevation_m: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Course elevations in metres, as configured
    pub course_elevations_m: Vec<u32>,
}

impl Resort {
    /// The highest configured course.
    pub fn primary_course_elevation_m(&self) -> Option<u32> {
        self.course_elevations_m.iter().copied().max()
    }

    /// Output key for one course, e.g. "Kandatsu_900m".
    pub fn course_key(&self, course_elevation_m: u32) -> String {
        format!("{}_{}m", self.resort_id, course_elevation_m)
    }

    /// Output keys for every configured course.
    pub fn course_keys(&self) -> Vec<String> {
        self.course_elevations_m
            .iter()
            .map(|elevation| self.course_key(*elevation))
            .collect()
    }

    fn parse_courses(field: &str) -> Result<Vec<u32>, String> {
        let courses = field
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<u32>().map_err(|_| format!("bad course elevation {s:?}")))
            .collect::<Result<Vec<u32>, String>>()?;
        if courses.is_empty() {
            return Err("no course elevations".to_string());
        }
        Ok(courses)
    }

    /// Parse a CSV string of resort data into a vector of Resorts.
    ///
    /// Expected CSV columns: resort_id, name, history_key, station_name,
    /// prec_no, block_no, station_elevation_m, latitude, longitude,
    /// course_elevations_m (semicolon separated)
    pub fn parse_resort_csv(csv_object: &str) -> Result<Vec<Resort>, ResortError> {
        let mut resort_list: Vec<Resort> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(csv_object.as_bytes());
        for (index, row) in rdr.records().enumerate() {
            let record = row.map_err(|e| ResortError::Csv(e.to_string()))?;
            let row_number = index + 1;
            let invalid = |reason: String| ResortError::InvalidRow {
                row: row_number,
                reason,
            };
            if record.len() != CSV_ROW_LENGTH {
                return Err(invalid(format!(
                    "expected {} columns, found {}",
                    CSV_ROW_LENGTH,
                    record.len()
                )));
            }
            let text = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            let number = |i: usize| {
                text(i)
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("column {} is not a number", i + 1)))
            };
            let resort = Resort {
                resort_id: text(0),
                name: text(1),
                history_key: text(2),
                station_name: text(3),
                prec_no: text(4)
                    .parse::<u32>()
                    .map_err(|_| invalid("prec_no is not an integer".to_string()))?,
                block_no: text(5),
                station_elevation_m: number(6)?,
                latitude: number(7)?,
                longitude: number(8)?,
                course_elevations_m: Resort::parse_courses(&text(9)).map_err(invalid)?,
            };
            if resort.resort_id.is_empty() || resort.history_key.is_empty() {
                return Err(invalid("resort_id and history_key are required".to_string()));
            }
            resort_list.push(resort);
        }
        Ok(resort_list)
    }
}

/// The immutable resort configuration handed to every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ResortTable(Vec<Resort>);

impl ResortTable {
    pub fn new(resorts: Vec<Resort>) -> Self {
        ResortTable(resorts)
    }

    /// The resort table compiled into the binary.
    pub fn embedded() -> Result<Self, ResortError> {
        Self::from_csv(CSV_OBJECT)
    }

    pub fn from_csv(csv_object: &str) -> Result<Self, ResortError> {
        Resort::parse_resort_csv(csv_object).map(ResortTable)
    }

    pub fn resorts(&self) -> &[Resort] {
        &self.0
    }

    pub fn get(&self, resort_id: &str) -> Option<&Resort> {
        self.0.iter().find(|r| r.resort_id == resort_id)
    }

    pub fn by_history_key(&self, history_key: &str) -> Option<&Resort> {
        self.0.iter().find(|r| r.history_key == history_key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Resort, ResortError, ResortTable};

    #[test]
    fn test_embedded_table() {
        let table = ResortTable::embedded().unwrap();
        assert_eq!(table.len(), 2);
        let kandatsu = table.get("Kandatsu").unwrap();
        assert_eq!(kandatsu.history_key, "yuzawa");
        assert_eq!(kandatsu.block_no, "0544");
        assert_eq!(kandatsu.station_elevation_m, 340.0);
        assert_eq!(kandatsu.course_elevations_m, vec![900, 700, 500]);
        assert_eq!(kandatsu.primary_course_elevation_m(), Some(900));
        let marunuma = table.by_history_key("minakami").unwrap();
        assert_eq!(marunuma.resort_id, "Marunuma");
        assert_eq!(marunuma.primary_course_elevation_m(), Some(1950));
    }

    #[test]
    fn test_course_keys() {
        let table = ResortTable::embedded().unwrap();
        let kandatsu = table.get("Kandatsu").unwrap();
        assert_eq!(
            kandatsu.course_keys(),
            vec!["Kandatsu_900m", "Kandatsu_700m", "Kandatsu_500m"]
        );
    }

    #[test]
    fn test_primary_course_is_highest_not_first() {
        let csv_data = "\
resort_id,name,history_key,station_name,prec_no,block_no,station_elevation_m,latitude,longitude,course_elevations_m
Test,Test Resort,test,Test Station,1,0001,100,36.0,138.0,500;1200;800
";
        let resorts = Resort::parse_resort_csv(csv_data).unwrap();
        assert_eq!(resorts[0].primary_course_elevation_m(), Some(1200));
    }

    #[test]
    fn test_rejects_bad_rows() {
        let csv_data = "\
resort_id,name,history_key,station_name,prec_no,block_no,station_elevation_m,latitude,longitude,course_elevations_m
Test,Test Resort,test,Test Station,1,0001,high,36.0,138.0,500
";
        let result = Resort::parse_resort_csv(csv_data);
        assert!(matches!(result, Err(ResortError::InvalidRow { row: 1, .. })));

        let csv_data = "\
resort_id,name,history_key,station_name,prec_no,block_no,station_elevation_m,latitude,longitude,course_elevations_m
Test,Test Resort,test,Test Station,1,0001,100,36.0,138.0,
";
        assert!(Resort::parse_resort_csv(csv_data).is_err());
    }

    #[test]
    fn test_parse_empty_csv() {
        let csv_data = "resort_id,name,history_key,station_name,prec_no,block_no,station_elevation_m,latitude,longitude,course_elevations_m\n";
        let table = ResortTable::from_csv(csv_data).unwrap();
        assert!(table.is_empty());
    }
}
