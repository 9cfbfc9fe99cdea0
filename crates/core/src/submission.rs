//! AC 提出と直近ウィンドウによる絞り込み。

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_with::{TimestampSeconds, formats::Flexible, serde_as};

/// 表示用タイムスタンプの書式 (UTC)。
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `/{username}/acSubmission` が返す AC 提出 1 件。
///
/// API はタイムスタンプを Unix 秒の文字列で返す。欠けている場合は Unix エポックになる。
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status_display: String,
    #[serde_as(as = "TimestampSeconds<String, Flexible>")]
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

/// ウィンドウ内に入った提出。タイムスタンプは UTC の可読文字列に変換済み。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSubmission {
    pub title: String,
    pub status_display: String,
    pub timestamp: String,
}

/// `now` の属する UTC 日の 0 時から 24 時間前〜`now` (両端を含む) の提出だけを、元の順序のまま返す。
pub fn recent_submissions(submissions: &[Submission], now: DateTime<Utc>) -> Vec<RecentSubmission> {
    let (start, end) = window(now);

    submissions
        .iter()
        .filter(|s| start <= s.timestamp && s.timestamp <= end)
        .map(|s| RecentSubmission {
            title: s.title.clone(),
            status_display: s.status_display.clone(),
            timestamp: s.timestamp.format(DISPLAY_FORMAT).to_string(),
        })
        .collect()
}

fn window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);
    (midnight - Duration::days(1), now)
}
