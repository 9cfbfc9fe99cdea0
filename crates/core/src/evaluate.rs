//! デイリー問題の達成判定。

use chrono::{DateTime, Utc};

use crate::problem::DailyProblem;
use crate::submission::{Submission, recent_submissions};

/// ユーザーごとの判定結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyStatus {
    Completed,
    NotCompleted,
    /// プロフィールまたは提出一覧の取得に失敗した
    Unknown,
}

impl DailyStatus {
    /// ロスターに書き戻す値。`Unknown` は書き戻さない。
    pub fn completed(self) -> Option<bool> {
        match self {
            DailyStatus::Completed => Some(true),
            DailyStatus::NotCompleted => Some(false),
            DailyStatus::Unknown => None,
        }
    }
}

/// 直近ウィンドウ内の提出にデイリー問題と同じタイトルがあるかを判定する。
///
/// `submissions` が `None` の場合は取得失敗として `Unknown` を返す。
pub fn evaluate(
    username: &str,
    problem: &DailyProblem,
    submissions: Option<&[Submission]>,
    now: DateTime<Utc>,
) -> DailyStatus {
    let Some(submissions) = submissions else {
        return DailyStatus::Unknown;
    };

    let recent = recent_submissions(submissions, now);
    tracing::debug!(username, recent = ?recent, "Recent accepted submissions");

    if recent
        .iter()
        .any(|s| s.title == problem.question_title)
    {
        DailyStatus::Completed
    } else {
        DailyStatus::NotCompleted
    }
}
