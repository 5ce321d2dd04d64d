//! Run settings resolved from command-line options.

use crate::CommonArgs;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use log::info;
use slope_obs::resort::ResortTable;
use slope_utils::dates::parse_date;
use std::time::Duration;

/// Days of history and of forecast per run.
pub const DEFAULT_DAYS: u32 = 5;

/// Per-request timeout for both weather sources.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Settings {
    pub today: NaiveDate,
    pub resorts: ResortTable,
}

impl Settings {
    pub fn resolve(common: &CommonArgs) -> anyhow::Result<Self> {
        let today = match &common.today {
            Some(text) => parse_date(text).context("invalid --today")?,
            None => Local::now().date_naive(),
        };
        let resorts = match &common.resorts {
            Some(path) => {
                let body = std::fs::read_to_string(path)
                    .with_context(|| format!("reading resort table {}", path.display()))?;
                ResortTable::from_csv(&body)
                    .with_context(|| format!("parsing resort table {}", path.display()))?
            }
            None => ResortTable::embedded().context("parsing built-in resort table")?,
        };
        if resorts.is_empty() {
            anyhow::bail!("resort table has no resorts");
        }
        info!("Reference date {} with {} resorts", today, resorts.len());
        Ok(Settings { today, resorts })
    }
}

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("building HTTP client")
}
