//! 評価パスの結果を Discord メッセージやテキストに整形する。

use lcdaily_core::{Deregistration, Difficulty, PassError, PassReport, Registration};
use serenity::all::{CreateEmbed, CreateEmbedFooter};

/// 埋め込みフィールドの値の上限 (Discord)。
const FIELD_VALUE_LIMIT: usize = 1024;
/// 1 つの埋め込みに入るフィールド数の上限 (Discord)。
const MAX_FIELDS: usize = 25;
/// ユーザー一覧のフィールドに使える文字数。埋め込み全体の上限 6000 からタイトルなどの分を引いた値。
const FIELD_BUDGET: usize = 5000;
/// メッセージ本文の上限 (Discord)。
const MESSAGE_LIMIT: usize = 2000;
/// 表示するユーザー名の最大文字数。
const NAME_LIMIT: usize = 100;

const ROSTER_HEADER: &str =
    "**Last known status** (users that could not be checked keep their previous result)";

/// 難易度ごとの埋め込みの色 (LeetCode の配色)。
fn difficulty_color(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 0x00b8a3,
        Difficulty::Medium => 0xffc01e,
        Difficulty::Hard => 0xff375f,
    }
}

fn display_name(name: &str) -> String {
    if name.chars().count() <= NAME_LIMIT {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(NAME_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}

/// ユーザー一覧を `limit` 文字以下のカンマ区切りの値に分割する。
///
/// 各要素は (値, 含まれるユーザー数)。空の一覧は `-` になる。
fn chunk_users(users: &[String], limit: usize) -> Vec<(String, usize)> {
    if users.is_empty() {
        return vec![("-".to_string(), 0)];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0;
    let mut count = 0;

    for user in users {
        let name = display_name(user);
        let name_len = name.chars().count();
        if count > 0 && len + 2 + name_len > limit {
            chunks.push((std::mem::take(&mut current), count));
            len = 0;
            count = 0;
        }
        if count > 0 {
            current.push_str(", ");
            len += 2;
        }
        current.push_str(&name);
        len += name_len;
        count += 1;
    }
    chunks.push((current, count));
    chunks
}

/// 見出しごとのユーザー一覧を埋め込みフィールドに変換する。
///
/// 長い一覧は複数のフィールドに分け、埋め込みの上限を超える分は人数だけを載せる。
fn user_fields(sections: &[(&str, &[String])]) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut used = 0;
    let mut omitted = 0;

    for (name, users) in sections {
        for (i, (value, count)) in chunk_users(users, FIELD_VALUE_LIMIT)
            .into_iter()
            .enumerate()
        {
            let field_name = if i == 0 {
                name.to_string()
            } else {
                format!("{name} (cont.)")
            };
            let size = field_name.chars().count() + value.chars().count();

            // 最後の 1 枠は省略数の表示用に空けておく
            if omitted > 0 || fields.len() + 1 >= MAX_FIELDS || used + size > FIELD_BUDGET {
                omitted += count;
                continue;
            }
            used += size;
            fields.push((field_name, value));
        }
    }

    if omitted > 0 {
        fields.push(("Omitted".to_string(), format!("... and {omitted} more")));
    }
    fields
}

/// 定期投稿と `/check` の応答に使う埋め込み。
pub fn embed(report: &PassReport) -> CreateEmbed {
    let problem = &report.problem;
    let mut sections: Vec<(&str, &[String])> = vec![
        ("Finished", report.finished.as_slice()),
        ("Not finished", report.unfinished.as_slice()),
    ];
    if !report.unknown.is_empty() {
        sections.push(("Unknown status", report.unknown.as_slice()));
    }

    let embed = CreateEmbed::new()
        .title(&problem.question_title)
        .url(&problem.question_link)
        .description(format!(
            "{}\nDifficulty: {}",
            problem.date, problem.difficulty
        ))
        .color(difficulty_color(problem.difficulty))
        .fields(
            user_fields(&sections)
                .into_iter()
                .map(|(name, value)| (name, value, false)),
        );

    embed.footer(CreateEmbedFooter::new(format!(
        "Checked at {}",
        report.checked_at.format("%Y-%m-%d %H:%M UTC")
    )))
}

/// `/check` が失敗したときの応答。
pub fn check_failure(error: &PassError) -> &'static str {
    match error {
        PassError::Busy => "A check is already running. Please try again later.",
        PassError::Fetch(_) | PassError::DailyProblem(_) => "No daily problem data available.",
        PassError::Store(_) => "The check finished, but the results could not be saved.",
    }
}

/// `--once` で標準出力に出すテキスト。
pub fn text(report: &PassReport) -> String {
    let problem = &report.problem;
    let mut lines = vec![
        problem.date.to_string(),
        format!(
            "Daily problem: {} - Difficulty: {}",
            problem.question_title, problem.difficulty
        ),
        format!(
            "Users who finished the daily challenge: {}",
            report.finished.join(", ")
        ),
        format!(
            "Users who have not finished the daily challenge: {}",
            report.unfinished.join(", ")
        ),
    ];
    if !report.unknown.is_empty() {
        lines.push(format!(
            "Users with unknown status: {}",
            report.unknown.join(", ")
        ));
    }
    lines.join("\n")
}

pub fn registration(registration: &Registration) -> String {
    let mut lines = Vec::new();
    if !registration.added.is_empty() {
        lines.push(format!("Users added: {}.", registration.added.join(", ")));
    }
    if !registration.existing.is_empty() {
        lines.push(format!(
            "Users already exist: {}.",
            registration.existing.join(", ")
        ));
    }
    lines.join("\n")
}

pub fn deregistration(deregistration: &Deregistration) -> String {
    let mut lines = Vec::new();
    if !deregistration.deleted.is_empty() {
        lines.push(format!(
            "Users deleted: {}.",
            deregistration.deleted.join(", ")
        ));
    }
    if !deregistration.not_found.is_empty() {
        lines.push(format!(
            "Users not found: {}.",
            deregistration.not_found.join(", ")
        ));
    }
    lines.join("\n")
}

/// `/list` の応答。メッセージの上限ごとに分割して返す。
pub fn roster(users: &[(String, bool)]) -> Vec<String> {
    if users.is_empty() {
        return vec!["No users are being tracked.".to_string()];
    }

    let mut messages = Vec::new();
    let mut current = ROSTER_HEADER.to_string();
    for (name, completed) in users {
        let mark = if *completed { "✅" } else { "❌" };
        let line = format!("{mark} {}", display_name(name));
        if current.chars().count() + 1 + line.chars().count() > MESSAGE_LIMIT {
            messages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&line);
    }
    messages.push(current);
    messages
}

/// `/usage` の応答。
pub fn usage(schedule: &str) -> String {
    format!(
        "**LeetCode Daily Checker Bot Usage**\n\
         \n\
         - **`/add_user <username1> <username2> ...`**\n  \
         Add one or more LeetCode usernames to the tracking list.\n\
         - **`/delete_user <username1> <username2> ...`**\n  \
         Remove one or more LeetCode usernames from the tracking list.\n\
         - **`/check`**\n  \
         Check the daily challenge status of all tracked users now.\n\
         - **`/list`**\n  \
         Show tracked users and their last known status.\n\
         - **`/usage`**\n  \
         Display this help message.\n\
         \n\
         **Scheduled Checks**\n\
         - All tracked users are checked every day at **{schedule}** and the results are posted in the configured channel."
    )
}
