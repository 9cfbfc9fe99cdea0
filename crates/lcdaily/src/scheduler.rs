//! 毎日決まった時刻に評価パスを実行し、結果をチャンネルに投稿する。

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use lcdaily_core::Tracker;
use serenity::all::{ChannelId, CreateMessage, Http};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::report;

/// 指定タイムゾーンの壁時計時刻で毎日 1 回発火するスケジュール。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    time: NaiveTime,
    timezone: Tz,
}

impl DailySchedule {
    pub fn new(time: NaiveTime, timezone: Tz) -> Self {
        Self { time, timezone }
    }

    /// `now` より厳密に後で、現地時刻が `time` になる最初の UTC 時刻を返す。
    ///
    /// 夏時間で存在しない時刻は存在する時刻まで進め、重複する時刻は早い方を採る。
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.with_timezone(&self.timezone).date_naive();

        // 前日から見ることで、UTC と現地日付がずれていても取りこぼさない
        let mut date = today.pred_opt().unwrap_or(today);
        loop {
            let candidate = self.resolve(date.and_time(self.time));
            if candidate > now {
                return candidate;
            }
            date = match date.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return candidate,
            };
        }
    }

    fn resolve(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let mut local = local;
        // 夏時間のギャップは最大でも数時間
        for _ in 0..(24 * 60) {
            match self.timezone.from_local_datetime(&local) {
                LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                LocalResult::None => local += TimeDelta::minutes(1),
            }
        }
        local.and_utc()
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time.format("%H:%M"), self.timezone)
    }
}

/// 定期チェックのタイマーを 1 プロセスにつき 1 つだけ保持する。
///
/// Gateway の再接続で `ready` が複数回呼ばれても、実行中のタイマーがあれば何もしない。
#[derive(Default)]
pub struct Scheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// タイマーが動いていなければ起動する。起動した場合は true を返す。
    pub fn ensure_started(
        &self,
        http: Arc<Http>,
        tracker: Arc<Tracker>,
        channel_id: u64,
        schedule: DailySchedule,
    ) -> bool {
        let mut handle = match self.handle.lock() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };

        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        *handle = Some(tokio::spawn(run_daily_check(
            http, tracker, channel_id, schedule,
        )));
        true
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Ok(Some(handle)) = self.handle.get_mut().map(Option::take) {
            handle.abort();
        }
    }
}

async fn run_daily_check(
    http: Arc<Http>,
    tracker: Arc<Tracker>,
    channel_id: u64,
    schedule: DailySchedule,
) {
    let channel_id = ChannelId::new(channel_id);

    info!(
        channel_id = channel_id.get(),
        schedule = %schedule,
        "Starting daily check scheduler"
    );

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(
            at = %next,
            wait = %humantime::format_duration(wait),
            "Next daily check scheduled"
        );
        tokio::time::sleep(wait).await;

        let report = match tracker.run_pass().await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Scheduled daily check failed");
                continue;
            }
        };

        let message = CreateMessage::new().embed(report::embed(&report));
        if let Err(e) = channel_id.send_message(&http, message).await {
            warn!(error = %e, "Failed to send daily report");
        }
    }
}
