//! Daily archive pages of the Japan Meteorological Agency (AMeDAS stations).
//!
//! The page for one station and month carries a table `#tablefix1` with one
//! row per day. Only the table parsing is always compiled; the fetch helpers
//! need the `api` feature.

use crate::observation::{RawHistoryRow, SourceError};
use crate::resort::Resort;
use log::debug;
use scraper::{ElementRef, Html, Selector};

#[cfg(feature = "api")]
use crate::{normalize::normalize_history, observation::DailyObservation};
#[cfg(feature = "api")]
use chrono::NaiveDate;
#[cfg(feature = "api")]
use log::{info, warn};
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "api")]
use slope_utils::dates::{lookback_window, months_spanned};

pub const BASE_URL: &str = "https://www.data.jma.go.jp/stats/etrn/view/daily_a1.php";

/// The archive serves EUC-JP without always declaring it.
pub const PAGE_ENCODING: &str = "EUC-JP";

pub const DATA_SOURCE: &str = "JMA Past Weather Data (Web Scraping)";

/// Header rows before the first day row.
const HEADER_ROWS: usize = 2;

// Column positions within a day row.
const COL_DAY: usize = 0;
const COL_PRECIPITATION: usize = 1;
const COL_TEMP_AVG: usize = 4;
const COL_TEMP_MAX: usize = 5;
const COL_TEMP_MIN: usize = 6;
const COL_WIND_AVG: usize = 9;
const COL_WIND_MAX: usize = 10;
const COL_SUNSHINE: usize = 15;
const COL_SNOWFALL: usize = 16;
const COL_SNOW_DEPTH: usize = 17;

/// Query parameters for one station month; the page always starts at day 1.
pub fn daily_query(resort: &Resort, year: i32, month: u32) -> Vec<(&'static str, String)> {
    vec![
        ("prec_no", resort.prec_no.to_string()),
        ("block_no", resort.block_no.clone()),
        ("year", year.to_string()),
        ("month", month.to_string()),
        ("day", "1".to_string()),
        ("view", "p1".to_string()),
    ]
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse {
        what: "archive selector",
        reason: e.to_string(),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Extract the day rows of one month page.
///
/// A page without the data table (station closed, month not published yet)
/// yields no rows rather than an error.
pub fn parse_daily_table(html: &str, month: u32) -> Result<Vec<RawHistoryRow>, SourceError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table#tablefix1")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td, th")?;

    let Some(table) = document.select(&table_selector).next() else {
        debug!("No daily table on archive page for month {}", month);
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for tr in table.select(&row_selector).skip(HEADER_ROWS) {
        let cells: Vec<String> = tr.select(&cell_selector).map(cell_text).collect();
        let Some(first) = cells.get(COL_DAY) else {
            continue;
        };
        if first.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if cells.len() <= COL_SNOW_DEPTH {
            debug!("Short archive row for day {}: {} cells", first, cells.len());
            continue;
        }
        let day = first.parse::<u32>().map_err(|e| SourceError::Parse {
            what: "archive day number",
            reason: e.to_string(),
        })?;
        rows.push(RawHistoryRow {
            month,
            day,
            precipitation: cells[COL_PRECIPITATION].clone(),
            temp_avg: cells[COL_TEMP_AVG].clone(),
            temp_max: cells[COL_TEMP_MAX].clone(),
            temp_min: cells[COL_TEMP_MIN].clone(),
            wind_avg: cells[COL_WIND_AVG].clone(),
            wind_max: cells[COL_WIND_MAX].clone(),
            sunshine: cells[COL_SUNSHINE].clone(),
            snowfall: cells[COL_SNOWFALL].clone(),
            snow_depth: cells[COL_SNOW_DEPTH].clone(),
        });
    }
    Ok(rows)
}

/// Fetch and parse one month page for the resort's history station.
#[cfg(feature = "api")]
pub async fn fetch_month(
    client: &Client,
    resort: &Resort,
    year: i32,
    month: u32,
) -> Result<Vec<RawHistoryRow>, SourceError> {
    let request_error = |e: reqwest::Error| SourceError::Request {
        url: BASE_URL.to_string(),
        reason: e.to_string(),
    };
    let response = client
        .get(BASE_URL)
        .query(&daily_query(resort, year, month))
        .send()
        .await
        .map_err(request_error)?;
    if response.status() != StatusCode::OK {
        return Err(SourceError::Status {
            url: BASE_URL.to_string(),
            status: response.status().as_u16(),
        });
    }
    let body = response
        .text_with_charset(PAGE_ENCODING)
        .await
        .map_err(request_error)?;
    parse_daily_table(&body, month)
}

/// Fetch the `days`-long history window ending at `today` for one resort.
///
/// Every month overlapping the window is requested. A month that fails is
/// logged and contributes nothing; the call only fails when every month did.
#[cfg(feature = "api")]
pub async fn fetch_history(
    client: &Client,
    resort: &Resort,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailyObservation>, SourceError> {
    let (start, end) = lookback_window(today, days);
    let months = months_spanned(start, end);
    let mut rows = Vec::new();
    let mut last_error = None;
    let mut fetched = 0usize;
    for (year, month) in months {
        info!(
            "Fetching archive {} ({}) for {}-{:02}",
            resort.station_name, resort.history_key, year, month
        );
        match fetch_month(client, resort, year, month).await {
            Ok(month_rows) => {
                fetched += 1;
                rows.extend(month_rows);
            }
            Err(e) => {
                warn!("Archive month {}-{:02} for {} failed: {}", year, month, resort.history_key, e);
                last_error = Some(e);
            }
        }
    }
    match (fetched, last_error) {
        (0, Some(e)) => Err(e),
        _ => Ok(normalize_history(&rows, today, days)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resort::ResortTable;

    fn day_row(day: &str, max: &str, depth: &str) -> String {
        // 18 columns: day, precip, 2 precip maxima, avg/max/min temp, 2 humidity,
        // avg/max wind, 4 wind detail, sunshine, snowfall, snow depth
        format!(
            "<tr><td>{day}</td><td>1.5</td><td>0.5</td><td>0.0</td><td>0.4</td>\
             <td>{max}</td><td>-3.1</td><td>80</td><td>60</td><td>2.2</td><td>7.4</td>\
             <td>北</td><td>12.0</td><td>北西</td><td>--</td><td>4.5</td><td>3</td><td>{depth}</td></tr>"
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table id=\"tablefix1\" class=\"data2_s\">\
             <tr><th>日</th><th>降水量</th></tr><tr><th>合計</th><th>最大</th></tr>{}\
             </table></body></html>",
            rows.join("")
        )
    }

    #[test]
    fn test_parse_daily_table() {
        let html = page(&[day_row("1", "4.0", "10"), day_row("2", "2.5 )", "12]")]);
        let rows = parse_daily_table(&html, 11).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, 11);
        assert_eq!(rows[0].day, 1);
        assert_eq!(rows[0].precipitation, "1.5");
        assert_eq!(rows[0].temp_avg, "0.4");
        assert_eq!(rows[0].temp_max, "4.0");
        assert_eq!(rows[0].temp_min, "-3.1");
        assert_eq!(rows[0].wind_avg, "2.2");
        assert_eq!(rows[0].wind_max, "7.4");
        assert_eq!(rows[0].sunshine, "4.5");
        assert_eq!(rows[0].snowfall, "3");
        assert_eq!(rows[0].snow_depth, "10");
        assert_eq!(rows[1].temp_max, "2.5 )");
    }

    #[test]
    fn test_parse_skips_summary_and_short_rows() {
        let html = page(&[
            day_row("1", "4.0", "10"),
            "<tr><td>上旬</td><td>9.0</td></tr>".to_string(),
            "<tr><td>3</td><td>1.0</td></tr>".to_string(),
        ]);
        let rows = parse_daily_table(&html, 12).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_page_without_table_is_empty() {
        let rows = parse_daily_table("<html><body><p>no data</p></body></html>", 11).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_daily_query_keeps_block_zeroes() {
        let table = ResortTable::embedded().unwrap();
        let kandatsu = table.get("Kandatsu").unwrap();
        let query = daily_query(kandatsu, 2025, 11);
        assert!(query.contains(&("block_no", "0544".to_string())));
        assert!(query.contains(&("prec_no", "54".to_string())));
        assert!(query.contains(&("day", "1".to_string())));
    }
}
