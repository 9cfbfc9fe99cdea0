//! ユーザー登録と評価パスの実行。
//!
//! ロスターの読み込み・変更・保存はすべて 1 つのミューテックスの下で行い、
//! 同時に 2 つのパスが走らないようにする。

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::LeetCodeClient;
use crate::error::{FetchError, PassError, StoreError};
use crate::evaluate::{DailyStatus, evaluate};
use crate::problem::DailyProblem;
use crate::roster::{Deregistration, Registration, RosterStore};
use crate::submission::Submission;

/// 1 回の評価パスの結果。各リストはユーザー名順。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub problem: DailyProblem,
    pub checked_at: DateTime<Utc>,
    pub finished: Vec<String>,
    pub unfinished: Vec<String>,
    /// 取得に失敗し判定できなかったユーザー
    pub unknown: Vec<String>,
}

/// 追跡ユーザーの管理と評価パスを担う。
pub struct Tracker {
    client: LeetCodeClient,
    roster_path: PathBuf,
    lock: Mutex<()>,
}

impl Tracker {
    pub fn new(client: LeetCodeClient, roster_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            roster_path: roster_path.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn add_users(&self, usernames: &[String]) -> Result<Registration, StoreError> {
        let _guard = self.lock.lock().await;
        let mut roster = RosterStore::load(&self.roster_path)?;
        let registration = roster.add_users(usernames)?;
        info!(added = ?registration.added, existing = ?registration.existing, "Users registered");
        Ok(registration)
    }

    pub async fn delete_users(&self, usernames: &[String]) -> Result<Deregistration, StoreError> {
        let _guard = self.lock.lock().await;
        let mut roster = RosterStore::load(&self.roster_path)?;
        let deregistration = roster.delete_users(usernames)?;
        info!(deleted = ?deregistration.deleted, not_found = ?deregistration.not_found, "Users deregistered");
        Ok(deregistration)
    }

    /// 登録済みユーザーと最後の判定結果をユーザー名順で返す。
    pub async fn list_users(&self) -> Result<Vec<(String, bool)>, StoreError> {
        let _guard = self.lock.lock().await;
        let roster = RosterStore::load(&self.roster_path)?;
        Ok(roster
            .users()
            .iter()
            .map(|(name, record)| (name.clone(), record.daily_completed))
            .collect())
    }

    /// 評価パスを実行する。他のパスや登録処理が実行中なら終わるまで待つ。
    pub async fn run_pass(&self) -> Result<PassReport, PassError> {
        let _guard = self.lock.lock().await;
        self.pass(Utc::now()).await
    }

    /// 評価パスを実行する。他の処理が実行中なら待たずに `PassError::Busy` を返す。
    pub async fn try_run_pass(&self) -> Result<PassReport, PassError> {
        let _guard = self.lock.try_lock().map_err(|_| PassError::Busy)?;
        self.pass(Utc::now()).await
    }

    async fn pass(&self, now: DateTime<Utc>) -> Result<PassReport, PassError> {
        let raw = self.client.daily_problem().await.inspect_err(|e| {
            warn!(error = %e, "Failed to fetch daily problem");
        })?;
        tracing::debug!(payload = %raw, "Daily problem payload");
        let problem = DailyProblem::from_payload(&raw)?;
        info!(
            title = %problem.question_title,
            date = %problem.date,
            difficulty = %problem.difficulty,
            "Daily problem fetched"
        );

        let mut roster = RosterStore::load(&self.roster_path)?;
        let mut report = PassReport {
            problem,
            checked_at: now,
            finished: Vec::new(),
            unfinished: Vec::new(),
            unknown: Vec::new(),
        };

        for username in roster.usernames() {
            let submissions = match self.fetch_submissions(&username).await {
                Ok(submissions) => Some(submissions),
                Err(e) => {
                    warn!(username = %username, error = %e, "Failed to fetch user data");
                    None
                }
            };

            let status = evaluate(&username, &report.problem, submissions.as_deref(), now);
            info!(username = %username, status = ?status, "Daily status evaluated");

            if let Some(completed) = status.completed() {
                roster.set_completed(&username, completed);
            }
            match status {
                DailyStatus::Completed => report.finished.push(username),
                DailyStatus::NotCompleted => report.unfinished.push(username),
                DailyStatus::Unknown => report.unknown.push(username),
            }
        }

        roster.save()?;
        Ok(report)
    }

    /// プロフィールで存在を確認してから AC 提出を取得する。
    async fn fetch_submissions(&self, username: &str) -> Result<Vec<Submission>, FetchError> {
        let profile = self.client.profile(username).await?;
        tracing::debug!(username, profile = %profile, "Profile fetched");
        self.client.accepted_submissions(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Difficulty;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    #[test]
    fn report_serializes_in_camel_case() {
        let report = PassReport {
            problem: DailyProblem {
                question_link: "https://leetcode.com/problems/two-sum/".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                question_title: "Two Sum".to_string(),
                difficulty: Difficulty::Easy,
            },
            checked_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
            finished: vec!["alice".to_string()],
            unfinished: vec![],
            unknown: vec!["ghost".to_string()],
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "problem": {
                    "questionLink": "https://leetcode.com/problems/two-sum/",
                    "date": "2024-01-02",
                    "questionTitle": "Two Sum",
                    "difficulty": "Easy"
                },
                "checkedAt": "2024-01-02T10:00:00Z",
                "finished": ["alice"],
                "unfinished": [],
                "unknown": ["ghost"]
            })
        );
    }
}
