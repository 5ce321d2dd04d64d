//! slope-cli - Command line tool for forecasting ski-slope surface conditions.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "slope-cli",
    version,
    about = "Ski-slope condition forecasting toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: slope_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    slope_cmd::run(cli.command).await
}
