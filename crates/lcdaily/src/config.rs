use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use lcdaily_core::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::scheduler::DailySchedule;

/// Bot トークンを上書きする環境変数。
pub const TOKEN_ENV: &str = "BOT_TOKEN";
/// 通知先チャンネルを上書きする環境変数。
pub const CHANNEL_ID_ENV: &str = "CHANNEL_ID";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub leetcode: LeetCodeConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscordConfig {
    pub token: String,
    /// 定期レポートの投稿先
    pub channel_id: u64,
    /// 空の場合は誰でもコマンドを使える
    #[serde(default)]
    pub admins: Vec<u64>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: "YOUR_DISCORD_BOT_TOKEN".to_string(),
            channel_id: 0,
            admins: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LeetCodeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// 現地時刻 (HH:MM)
    #[serde_as(as = "DisplayFromStr")]
    pub time: NaiveTime,
    /// IANA タイムゾーン名
    #[serde_as(as = "DisplayFromStr")]
    pub timezone: Tz,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time: NaiveTime::from_hms_opt(23, 55, 0).unwrap_or_default(),
            timezone: chrono_tz::US::Pacific,
        }
    }
}

impl ScheduleConfig {
    pub fn daily_schedule(&self) -> DailySchedule {
        DailySchedule::new(self.time, self.timezone)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RosterConfig {
    pub path: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("user_data.json"),
        }
    }
}

impl Config {
    /// 環境変数の値で Discord 設定を上書きする。
    pub fn apply_overrides(&mut self, token: Option<String>, channel_id: Option<String>) -> Result<()> {
        if let Some(token) = token {
            self.discord.token = token;
        }
        if let Some(channel_id) = channel_id {
            self.discord.channel_id = channel_id
                .trim()
                .parse()
                .with_context(|| format!("Invalid {CHANNEL_ID_ENV}: {channel_id}"))?;
        }
        Ok(())
    }

    /// ユーザーがコマンドを使えるかどうか。
    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.discord.admins.is_empty() || self.discord.admins.contains(&user_id)
    }
}

pub fn open_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
    let mut config: Config =
        toml::from_str(&content).context("Failed to parse configuration file")?;
    config.apply_overrides(
        std::env::var(TOKEN_ENV).ok(),
        std::env::var(CHANNEL_ID_ENV).ok(),
    )?;
    Ok(config)
}

pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let content =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize configuration")?;
    fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_example_config() {
        let content = include_str!("../../../config.example.toml");
        let config: Config = toml::from_str(content).expect("Failed to parse config.example.toml");

        let expected = Config {
            discord: DiscordConfig {
                token: "YOUR_DISCORD_BOT_TOKEN".to_string(),
                channel_id: 123456789012345678,
                admins: vec![],
            },
            leetcode: LeetCodeConfig {
                base_url: "https://alfa-leetcode-api.onrender.com".to_string(),
                timeout: Duration::from_secs(10),
            },
            schedule: ScheduleConfig {
                time: NaiveTime::from_hms_opt(23, 55, 0).unwrap(),
                timezone: chrono_tz::US::Pacific,
            },
            roster: RosterConfig {
                path: PathBuf::from("user_data.json"),
            },
        };

        assert_eq!(config, expected);
    }

    #[test]
    fn optional_sections_use_defaults() {
        let content = r#"
            [discord]
            token = "token"
            channel_id = 1
        "#;
        let config: Config = toml::from_str(content).unwrap();

        assert_eq!(config.leetcode, LeetCodeConfig::default());
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.roster, RosterConfig::default());
    }

    #[test]
    fn schedule_accepts_timezone_and_seconds() {
        let content = r#"
            [discord]
            token = "token"
            channel_id = 1

            [schedule]
            time = "23:50:30"
            timezone = "Asia/Taipei"
        "#;
        let config: Config = toml::from_str(content).unwrap();

        assert_eq!(
            config.schedule.time,
            NaiveTime::from_hms_opt(23, 50, 30).unwrap()
        );
        assert_eq!(config.schedule.timezone, chrono_tz::Asia::Taipei);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let content = r#"
            [discord]
            token = "token"
            channel_id = 1

            [schedule]
            time = "23:55"
            timezone = "Mars/Olympus"
        "#;

        assert!(toml::from_str::<Config>(content).is_err());
    }

    #[test]
    fn default_config_round_trips() {
        let content = toml::to_string_pretty(&Config::default()).unwrap();
        let config: Config = toml::from_str(&content).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn written_default_config_can_be_opened() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        write_default_config(&path).unwrap();
        let config = open_config(&path).unwrap();

        // discord セクションは環境変数で上書きされうるので比較しない
        assert_eq!(config.leetcode, LeetCodeConfig::default());
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.roster, RosterConfig::default());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();

        assert!(open_config(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn env_overrides_discord_settings() {
        let mut config = Config::default();

        config
            .apply_overrides(Some("secret".to_string()), Some(" 42 ".to_string()))
            .unwrap();

        assert_eq!(config.discord.token, "secret");
        assert_eq!(config.discord.channel_id, 42);
        assert!(config.apply_overrides(None, Some("abc".to_string())).is_err());
    }

    #[test]
    fn empty_admin_list_allows_everyone() {
        let mut config = Config::default();
        assert!(config.is_allowed(1));

        config.discord.admins = vec![2];
        assert!(!config.is_allowed(1));
        assert!(config.is_allowed(2));
    }
}
