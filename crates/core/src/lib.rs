//! LeetCode のデイリー問題の達成状況を追跡する。
//!
//! 提出の絞り込みと達成判定、API クライアント、ロスターの永続化、
//! それらをまとめた評価パスを提供する。

pub mod client;
pub mod error;
pub mod evaluate;
pub mod problem;
pub mod roster;
pub mod submission;
pub mod tracker;

pub use client::{DEFAULT_BASE_URL, LeetCodeClient};
pub use error::{ClientError, DailyProblemError, FetchError, PassError, StoreError};
pub use evaluate::{DailyStatus, evaluate};
pub use problem::{DailyProblem, Difficulty};
pub use roster::{Deregistration, Registration, RosterStore, UserRecord};
pub use submission::{RecentSubmission, Submission, recent_submissions};
pub use tracker::{PassReport, Tracker};
