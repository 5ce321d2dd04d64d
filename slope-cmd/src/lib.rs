//! Command implementations for the slope CLI.
//!
//! Each pipeline stage reads the previous stage's cache and writes its own:
//! archive history and forecasts are fetched first, then features are
//! assembled and finally scored.

use clap::{Args, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod fetch;
pub mod pipeline;

/// Options shared by every stage.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Reference date (YYYY-MM-DD); defaults to the local date
    #[arg(long)]
    pub today: Option<String>,

    /// Resort table CSV replacing the built-in one
    #[arg(long)]
    pub resorts: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch archive history for every resort's history station
    History {
        /// Output path for the history cache
        #[arg(short = 'o', long, default_value = "data/history.json")]
        output: PathBuf,

        /// Days of history, ending today
        #[arg(long, default_value_t = config::DEFAULT_DAYS)]
        days: u32,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Fetch the daily forecast for every resort
    Forecast {
        /// Output path for the forecast cache
        #[arg(short = 'o', long, default_value = "data/forecast.json")]
        output: PathBuf,

        /// Forecast days, starting today
        #[arg(long, default_value_t = config::DEFAULT_DAYS)]
        days: u32,

        /// Forecast API key
        #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
        api_key: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Assemble course features from the history and forecast caches
    Features {
        #[arg(long, default_value = "data/history.json")]
        history: PathBuf,

        #[arg(long, default_value = "data/forecast.json")]
        forecast: PathBuf,

        /// Output path for the feature cache
        #[arg(short = 'o', long, default_value = "data/features.json")]
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Score the feature cache with an external classifier
    Predict {
        #[arg(long, default_value = "data/features.json")]
        features: PathBuf,

        /// Output path for the prediction cache
        #[arg(short = 'o', long, default_value = "data/predictions.json")]
        output: PathBuf,

        /// Scoring command, e.g. "python3 score.py"
        #[arg(short = 'c', long, env = "SLOPE_CLASSIFIER")]
        classifier: String,
    },

    /// Run every stage, writing all caches into one directory
    Run {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, default_value_t = config::DEFAULT_DAYS)]
        days: u32,

        #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
        api_key: String,

        #[arg(short = 'c', long, env = "SLOPE_CLASSIFIER")]
        classifier: String,

        #[command(flatten)]
        common: CommonArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::History {
            output,
            days,
            common,
        } => {
            let settings = config::Settings::resolve(&common)?;
            fetch::run_history(&settings, days, &output).await
        }
        Command::Forecast {
            output,
            days,
            api_key,
            common,
        } => {
            let settings = config::Settings::resolve(&common)?;
            fetch::run_forecast(&settings, days, &api_key, &output).await
        }
        Command::Features {
            history,
            forecast,
            output,
            common,
        } => {
            let settings = config::Settings::resolve(&common)?;
            pipeline::run_features(&settings, &history, &forecast, &output).map(|_| ())
        }
        Command::Predict {
            features,
            output,
            classifier,
        } => pipeline::run_predict(&features, &output, &classifier).map(|_| ()),
        Command::Run {
            data_dir,
            days,
            api_key,
            classifier,
            common,
        } => {
            let settings = config::Settings::resolve(&common)?;
            let history = data_dir.join("history.json");
            let forecast = data_dir.join("forecast.json");
            let features = data_dir.join("features.json");
            let predictions = data_dir.join("predictions.json");
            fetch::run_history(&settings, days, &history).await?;
            fetch::run_forecast(&settings, days, &api_key, &forecast).await?;
            pipeline::run_features(&settings, &history, &forecast, &features)?;
            pipeline::run_predict(&features, &predictions, &classifier)?;
            Ok(())
        }
    }
}
