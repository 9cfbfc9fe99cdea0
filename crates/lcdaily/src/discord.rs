use std::sync::Arc;

use anyhow::{Context, Result};
use lcdaily_core::{PassError, Tracker};
use serenity::all::{
    CommandInteraction, CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, GatewayIntents,
};
use serenity::async_trait;
use serenity::client::Context as SerenityContext;
use serenity::model::application::CommandOptionType;
use serenity::prelude::*;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::report;
use crate::scheduler::Scheduler;

pub struct Handler {
    config: Config,
    tracker: Arc<Tracker>,
    scheduler: Scheduler,
}

fn usernames_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "usernames", description).required(true)
}

fn commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("add_user")
            .description("Add LeetCode users to the tracking list")
            .add_option(usernames_option(
                "LeetCode usernames separated by spaces",
            )),
        CreateCommand::new("delete_user")
            .description("Remove LeetCode users from the tracking list")
            .add_option(usernames_option(
                "LeetCode usernames separated by spaces",
            )),
        CreateCommand::new("check")
            .description("Check the daily challenge status of all tracked users"),
        CreateCommand::new("list").description("Show tracked users and their last known status"),
        CreateCommand::new("usage").description("Show how to use this bot"),
    ]
}

/// コマンドへの最初の応答のしかた。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseMode {
    /// すぐに応答する
    Immediate,
    /// ロスターのロックやネットワークを待つので、先に応答を保留してフォローアップで返す
    Deferred,
}

fn response_mode(name: &str) -> ResponseMode {
    match name {
        "add_user" | "delete_user" | "list" | "check" => ResponseMode::Deferred,
        _ => ResponseMode::Immediate,
    }
}

/// コマンド引数のユーザー名を空白とカンマで分割する。
fn parse_usernames(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: SerenityContext, ready: serenity::model::gateway::Ready) {
        info!(user = %ready.user.name, "Bot connected");

        if let Err(e) = serenity::all::Command::set_global_commands(&ctx.http, commands()).await {
            error!(error = %e, "Failed to register commands");
        } else {
            info!("Slash commands registered");
        }

        let started = self.scheduler.ensure_started(
            ctx.http.clone(),
            self.tracker.clone(),
            self.config.discord.channel_id,
            self.config.schedule.daily_schedule(),
        );
        if !started {
            info!("Daily check scheduler already running");
        }
    }

    async fn interaction_create(
        &self,
        ctx: SerenityContext,
        interaction: serenity::model::application::Interaction,
    ) {
        if let serenity::model::application::Interaction::Command(command) = interaction
            && let Err(e) = self.handle_command(&ctx, &command).await
        {
            error!(error = %e, command = %command.data.name, "Command error");

            let content = format!("Error: {}", e);

            // 保留済みならフォローアップで返し、保留前に失敗していれば通常の応答にする
            if response_mode(&command.data.name) == ResponseMode::Deferred
                && command
                    .create_followup(
                        &ctx.http,
                        CreateInteractionResponseFollowup::new()
                            .content(&content)
                            .ephemeral(true),
                    )
                    .await
                    .is_ok()
            {
                return;
            }

            let response = CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true);

            if let Err(e) = command
                .create_response(&ctx.http, CreateInteractionResponse::Message(response))
                .await
            {
                error!(error = %e, "Failed to send error response");
            }
        }
    }
}

impl Handler {
    async fn handle_command(
        &self,
        ctx: &SerenityContext,
        command: &CommandInteraction,
    ) -> Result<()> {
        let user_id = command.user.id.get();
        if !self.config.is_allowed(user_id) {
            warn!(user_id, "Unauthorized access attempt");
            return reply(ctx, command, "You are not authorized to use this bot.", true).await;
        }

        if response_mode(&command.data.name) == ResponseMode::Deferred {
            command.defer(&ctx.http).await?;
        }

        match command.data.name.as_str() {
            "add_user" => self.handle_add_user(ctx, command).await,
            "delete_user" => self.handle_delete_user(ctx, command).await,
            "check" => self.handle_check(ctx, command).await,
            "list" => self.handle_list(ctx, command).await,
            "usage" => {
                let schedule = self.config.schedule.daily_schedule().to_string();
                reply(ctx, command, &report::usage(&schedule), false).await
            }
            _ => Ok(()),
        }
    }

    async fn handle_add_user(
        &self,
        ctx: &SerenityContext,
        command: &CommandInteraction,
    ) -> Result<()> {
        let usernames = usernames_arg(command)?;
        let registration = self
            .tracker
            .add_users(&usernames)
            .await
            .context("Failed to update roster")?;

        followup(ctx, command, &report::registration(&registration)).await
    }

    async fn handle_delete_user(
        &self,
        ctx: &SerenityContext,
        command: &CommandInteraction,
    ) -> Result<()> {
        let usernames = usernames_arg(command)?;
        let deregistration = self
            .tracker
            .delete_users(&usernames)
            .await
            .context("Failed to update roster")?;

        followup(ctx, command, &report::deregistration(&deregistration)).await
    }

    async fn handle_list(&self, ctx: &SerenityContext, command: &CommandInteraction) -> Result<()> {
        let users = self
            .tracker
            .list_users()
            .await
            .context("Failed to read roster")?;

        for message in report::roster(&users) {
            followup(ctx, command, &message).await?;
        }
        Ok(())
    }

    async fn handle_check(&self, ctx: &SerenityContext, command: &CommandInteraction) -> Result<()> {
        let followup = match self.tracker.try_run_pass().await {
            Ok(report) => CreateInteractionResponseFollowup::new().embed(report::embed(&report)),
            Err(e) => {
                if !matches!(e, PassError::Busy) {
                    error!(error = %e, "Manual daily check failed");
                }
                CreateInteractionResponseFollowup::new().content(report::check_failure(&e))
            }
        };

        command.create_followup(&ctx.http, followup).await?;
        Ok(())
    }
}

fn usernames_arg(command: &CommandInteraction) -> Result<Vec<String>> {
    let input = command
        .data
        .options
        .first()
        .and_then(|opt| opt.value.as_str())
        .context("Usernames not provided")?;

    let usernames = parse_usernames(input);
    anyhow::ensure!(!usernames.is_empty(), "Usernames not provided");
    Ok(usernames)
}

async fn reply(
    ctx: &SerenityContext,
    command: &CommandInteraction,
    content: &str,
    ephemeral: bool,
) -> Result<()> {
    let response = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(ephemeral);

    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}

/// 保留した応答の続きとしてメッセージを送る。
async fn followup(ctx: &SerenityContext, command: &CommandInteraction, content: &str) -> Result<()> {
    command
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new().content(content),
        )
        .await?;
    Ok(())
}

pub async fn run(config: Config, tracker: Arc<Tracker>) -> Result<()> {
    let intents = GatewayIntents::GUILDS;
    let handler = Handler {
        config: config.clone(),
        tracker,
        scheduler: Scheduler::default(),
    };

    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create client")?;

    info!("Starting bot");
    client.start().await.context("Client error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_usernames_on_whitespace_and_commas() {
        assert_eq!(
            parse_usernames("  alice bob,carol , dave\tEve "),
            vec!["alice", "bob", "carol", "dave", "Eve"]
        );
    }

    #[test]
    fn empty_usernames() {
        assert!(parse_usernames(" , ").is_empty());
    }

    #[test]
    fn roster_commands_are_deferred() {
        for name in ["add_user", "delete_user", "list", "check"] {
            assert_eq!(response_mode(name), ResponseMode::Deferred, "{name}");
        }
        assert_eq!(response_mode("usage"), ResponseMode::Immediate);
    }

    #[test]
    fn every_registered_command_has_a_response_mode() {
        let deferred = commands()
            .iter()
            .map(|c| serde_json::to_value(c).unwrap()["name"].as_str().unwrap().to_string())
            .filter(|name| response_mode(name) == ResponseMode::Deferred)
            .count();
        assert_eq!(deferred, 4);
    }

    #[test]
    fn registers_every_command() {
        assert_eq!(commands().len(), 5);
    }
}
