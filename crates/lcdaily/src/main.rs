mod config;
mod discord;
mod report;
mod scheduler;
mod version;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use lcdaily_core::{LeetCodeClient, Tracker};
use tracing::info;

use crate::{
    config::{Config, open_config, write_default_config},
    version::{long_version, short_version, user_agent},
};

#[derive(Parser)]
#[command(version = short_version())]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// デフォルトの設定ファイルを書き出して終了する
    #[arg(long)]
    init: bool,

    /// Discord に接続せず、評価パスを 1 回だけ実行して結果を表示する
    #[arg(long)]
    once: bool,

    /// `--once` の結果を JSON で出力する
    #[arg(long, requires = "once")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.init {
        write_default_config(&args.config)?;
        info!(path = ?args.config, "Created default configuration");
        return Ok(());
    }

    info!(version = long_version(), "lcdaily version");

    let config = open_config(&args.config).context("Failed to load configuration")?;
    info!(
        roster = ?config.roster.path,
        schedule = %config.schedule.daily_schedule(),
        "Configuration loaded"
    );

    let tracker = Arc::new(build_tracker(&config)?);

    if args.once {
        let report = tracker.run_pass().await.context("Daily check failed")?;
        if args.json {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        } else {
            println!("{}", report::text(&report));
        }
        return Ok(());
    }

    discord::run(config, tracker).await
}

fn build_tracker(config: &Config) -> Result<Tracker> {
    let client = LeetCodeClient::new(
        &config.leetcode.base_url,
        config.leetcode.timeout,
        user_agent(),
    )
    .context("Failed to create LeetCode client")?;

    Ok(Tracker::new(client, config.roster.path.clone()))
}
