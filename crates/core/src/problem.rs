//! デイリー問題の正規化。

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::DailyProblemError;

/// 問題の難易度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// その日のデイリー問題。評価パスごとに 1 つだけ取得される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProblem {
    pub question_link: String,
    pub date: NaiveDate,
    pub question_title: String,
    pub difficulty: Difficulty,
}

impl DailyProblem {
    /// `/daily` の生ペイロードから必要な 4 フィールドだけを取り出す。
    ///
    /// いずれかのキーが欠けていれば `MissingField`、形式が不正なら `InvalidField` を返す。
    pub fn from_payload(raw: &Value) -> Result<Self, DailyProblemError> {
        let question_link = string_field(raw, "questionLink")?.to_string();
        let date_str = string_field(raw, "date")?;
        let question_title = string_field(raw, "questionTitle")?.to_string();
        let difficulty_str = string_field(raw, "difficulty")?;

        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            DailyProblemError::InvalidField {
                field: "date",
                value: date_str.to_string(),
            }
        })?;
        let difficulty = difficulty_str
            .parse::<Difficulty>()
            .map_err(|()| DailyProblemError::InvalidField {
                field: "difficulty",
                value: difficulty_str.to_string(),
            })?;

        Ok(Self {
            question_link,
            date,
            question_title,
            difficulty,
        })
    }
}

fn string_field<'a>(raw: &'a Value, field: &'static str) -> Result<&'a str, DailyProblemError> {
    let value = raw
        .get(field)
        .ok_or(DailyProblemError::MissingField(field))?;
    value
        .as_str()
        .ok_or_else(|| DailyProblemError::InvalidField {
            field,
            value: value.to_string(),
        })
}
