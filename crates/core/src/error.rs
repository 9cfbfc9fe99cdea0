//! lcdaily-core のエラー型。

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// LeetCode API 呼び出しの失敗。
///
/// ユーザー単位の失敗は評価結果 `Unknown` として扱われ、パスは継続する。
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// デイリー問題ペイロードの正規化エラー。パス全体を中断する。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DailyProblemError {
    #[error("Daily problem payload is missing field `{0}`")]
    MissingField(&'static str),

    #[error("Daily problem field `{field}` has an invalid value: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// ロスターファイルの書き込みエラー。
///
/// 読み込み時の破損は空のロスターとして復旧するため、ここには含まれない。
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write roster file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize roster: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// API クライアント構築時のエラー。
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid API base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// 評価パスの失敗。
#[derive(Error, Debug)]
pub enum PassError {
    #[error("Failed to fetch daily problem: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    DailyProblem(#[from] DailyProblemError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Another check is already running")]
    Busy,
}
