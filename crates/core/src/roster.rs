//! 追跡ユーザーと最後の判定結果を永続化するストア。

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// ユーザーごとの記録。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRecord {
    /// 最後に取得したデイリー問題を達成したか
    #[serde(rename = "dailyCompleted", alias = "daily_completed", default)]
    pub daily_completed: bool,
}

/// `add_users` の結果。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Registration {
    pub added: Vec<String>,
    pub existing: Vec<String>,
}

/// `delete_users` の結果。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Deregistration {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
}

/// ユーザー名 -> 記録 のマッピングを JSON ファイルで管理するストア。
///
/// 変更のたびにファイル全体を書き直す。
pub struct RosterStore {
    path: PathBuf,
    users: BTreeMap<String, UserRecord>,
}

impl RosterStore {
    /// ストアを読み込む。
    ///
    /// ファイルが存在しない場合は空のファイルを作成する。読めない・壊れている場合は
    /// 既存の登録を捨てて空のロスターとして扱う。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let users = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(users) => users,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Roster file is corrupt, starting with an empty roster; existing registrations are dropped"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let store = Self {
                    path,
                    users: BTreeMap::new(),
                };
                store.save()?;
                return Ok(store);
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Roster file is unreadable, starting with an empty roster; existing registrations are dropped"
                );
                BTreeMap::new()
            }
        };

        Ok(Self { path, users })
    }

    /// ストアをファイルに保存する。
    pub fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.users)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// ユーザーを登録して保存する。登録済みのユーザーは変更しない。
    pub fn add_users<S: AsRef<str>>(&mut self, usernames: &[S]) -> Result<Registration, StoreError> {
        let mut registration = Registration::default();

        for username in usernames {
            let username = username.as_ref();
            if self.users.contains_key(username) {
                registration.existing.push(username.to_string());
            } else {
                self.users
                    .insert(username.to_string(), UserRecord::default());
                registration.added.push(username.to_string());
            }
        }

        self.save()?;
        Ok(registration)
    }

    /// ユーザーを削除して保存する。
    pub fn delete_users<S: AsRef<str>>(
        &mut self,
        usernames: &[S],
    ) -> Result<Deregistration, StoreError> {
        let mut deregistration = Deregistration::default();

        for username in usernames {
            let username = username.as_ref();
            if self.users.remove(username).is_some() {
                deregistration.deleted.push(username.to_string());
            } else {
                deregistration.not_found.push(username.to_string());
            }
        }

        self.save()?;
        Ok(deregistration)
    }

    /// 判定結果を記録する。未登録のユーザーは無視する。
    pub fn set_completed(&mut self, username: &str, completed: bool) {
        if let Some(record) = self.users.get_mut(username) {
            record.daily_completed = completed;
        }
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// 登録済みユーザー名をソート順で返す。
    pub fn usernames(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }

    pub fn users(&self) -> &BTreeMap<String, UserRecord> {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
