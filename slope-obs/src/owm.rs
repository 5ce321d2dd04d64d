//! OpenWeatherMap 5 day / 3 hour forecast.

use crate::observation::{ForecastSample, SourceError};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::{normalize::aggregate_forecast, observation::DailyObservation, resort::Resort};
#[cfg(feature = "api")]
use chrono::NaiveDate;
#[cfg(feature = "api")]
use log::info;
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};

pub const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

pub const DATA_SOURCE: &str = "OpenWeatherMap API Forecast";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
    city: Option<City>,
}

#[derive(Debug, Deserialize)]
struct City {
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: MainBlock,
    wind: WindBlock,
    rain: Option<VolumeBlock>,
    snow: Option<VolumeBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct VolumeBlock {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

fn parse_error(reason: impl ToString) -> SourceError {
    SourceError::Parse {
        what: "forecast response",
        reason: reason.to_string(),
    }
}

/// Parse a forecast response body into samples stamped in the city's offset.
pub fn parse_forecast_response(body: &str) -> Result<Vec<ForecastSample>, SourceError> {
    let response: ForecastResponse = serde_json::from_str(body).map_err(parse_error)?;
    let shift = response.city.map(|c| c.timezone).unwrap_or(0);
    let offset = FixedOffset::east_opt(shift)
        .ok_or_else(|| parse_error(format!("timezone shift {shift} out of range")))?;
    response
        .list
        .into_iter()
        .map(|item| {
            let timestamp = DateTime::from_timestamp(item.dt, 0)
                .ok_or_else(|| parse_error(format!("timestamp {} out of range", item.dt)))?
                .with_timezone(&offset);
            Ok(ForecastSample {
                timestamp,
                temp_c: item.main.temp,
                temp_min_c: item.main.temp_min,
                temp_max_c: item.main.temp_max,
                wind_speed_ms: item.wind.speed,
                precipitation_mm: item.rain.and_then(|r| r.three_hours),
                snowfall_mm: item.snow.and_then(|s| s.three_hours),
            })
        })
        .collect()
}

/// Fetch the raw forecast samples for a resort's coordinates.
#[cfg(feature = "api")]
pub async fn fetch_samples(
    client: &Client,
    resort: &Resort,
    api_key: &str,
) -> Result<Vec<ForecastSample>, SourceError> {
    let request_error = |e: reqwest::Error| SourceError::Request {
        url: BASE_URL.to_string(),
        reason: e.without_url().to_string(),
    };
    let query = [
        ("lat", resort.latitude.to_string()),
        ("lon", resort.longitude.to_string()),
        ("units", "metric".to_string()),
        ("appid", api_key.to_string()),
    ];
    let response = client
        .get(BASE_URL)
        .query(&query)
        .send()
        .await
        .map_err(request_error)?;
    if response.status() != StatusCode::OK {
        return Err(SourceError::Status {
            url: BASE_URL.to_string(),
            status: response.status().as_u16(),
        });
    }
    let body = response.text().await.map_err(request_error)?;
    parse_forecast_response(&body)
}

/// Fetch and aggregate the forecast horizon `today ..= today + days - 1`.
#[cfg(feature = "api")]
pub async fn fetch_forecast(
    client: &Client,
    resort: &Resort,
    api_key: &str,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailyObservation>, SourceError> {
    let samples = fetch_samples(client, resort, api_key).await?;
    info!("{} forecast samples for {}", samples.len(), resort.resort_id);
    Ok(aggregate_forecast(&samples, today, days))
}

#[cfg(test)]
mod tests {
    use super::parse_forecast_response;
    use chrono::{NaiveDate, Timelike};

    // Trimmed from a real /data/2.5/forecast response
    const BODY: &str = r#"{
        "cod": "200",
        "cnt": 3,
        "list": [
            {"dt": 1762560000, "main": {"temp": -1.2, "temp_min": -2.0, "temp_max": -0.5},
             "wind": {"speed": 3.4, "deg": 300}, "snow": {"3h": 1.8}},
            {"dt": 1762570800, "main": {"temp": 0.4, "temp_min": 0.1, "temp_max": 0.9},
             "wind": {"speed": 2.1}, "rain": {"3h": 0.6}},
            {"dt": 1762581600, "main": {"temp_min": 1.0, "temp_max": 2.0},
             "wind": {"speed": 1.0}, "rain": {}}
        ],
        "city": {"name": "Minakami", "timezone": 32400}
    }"#;

    #[test]
    fn test_parse_forecast_response() {
        let samples = parse_forecast_response(BODY).unwrap();
        assert_eq!(samples.len(), 3);
        // 1762560000 = 2025-11-08T00:00:00Z = 09:00 JST
        assert_eq!(
            samples[0].timestamp.date_naive(),
            NaiveDate::from_ymd_opt(2025, 11, 8).unwrap()
        );
        assert_eq!(samples[0].timestamp.hour(), 9);
        assert_eq!(samples[0].snowfall_mm, Some(1.8));
        assert_eq!(samples[0].precipitation_mm, None);
        assert_eq!(samples[1].precipitation_mm, Some(0.6));
        assert_eq!(samples[2].temp_c, None);
        assert_eq!(samples[2].precipitation_mm, None);
    }

    #[test]
    fn test_missing_city_defaults_to_utc() {
        let body = r#"{"list": [{"dt": 1762560000, "main": {"temp_min": 0.0, "temp_max": 1.0}, "wind": {"speed": 1.0}}]}"#;
        let samples = parse_forecast_response(body).unwrap();
        assert_eq!(samples[0].timestamp.hour(), 0);
    }

    #[test]
    fn test_malformed_response() {
        assert!(parse_forecast_response("{\"list\": [{\"dt\": \"soon\"}]}").is_err());
        assert!(parse_forecast_response("<html>").is_err());
    }
}
