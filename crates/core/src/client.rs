//! alfa-leetcode-api のクライアント。

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, FetchError};
use crate::submission::Submission;

/// 公開されている alfa-leetcode-api のエンドポイント。
pub const DEFAULT_BASE_URL: &str = "https://alfa-leetcode-api.onrender.com";

#[derive(Deserialize)]
struct AcSubmissionResponse {
    #[serde(default)]
    submission: Vec<Submission>,
}

/// LeetCode API を呼び出すクライアント。
#[derive(Clone)]
pub struct LeetCodeClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl LeetCodeClient {
    /// 新しい LeetCodeClient を作成する。
    ///
    /// # Arguments
    /// * `base_url` - API のベース URL
    /// * `timeout` - 1 リクエストあたりのタイムアウト
    /// * `user_agent` - User-Agent ヘッダ
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// 今日のデイリー問題の生ペイロードを取得する。
    pub async fn daily_problem(&self) -> Result<Value, FetchError> {
        self.get_json(self.endpoint(&["daily"])).await
    }

    /// ユーザーのプロフィールを取得する。存在確認に使う。
    pub async fn profile(&self, username: &str) -> Result<Value, FetchError> {
        self.get_json(self.endpoint(&[username])).await
    }

    /// ユーザーの最近の AC 提出を取得する。
    pub async fn accepted_submissions(&self, username: &str) -> Result<Vec<Submission>, FetchError> {
        let response: AcSubmissionResponse = self
            .get_json(self.endpoint(&[username, "acSubmission"]))
            .await?;
        Ok(response.submission)
    }

    /// ベース URL にパスセグメントを追加する。セグメントはパーセントエンコードされる。
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // new() で cannot-be-a-base を弾いているので失敗しない
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
