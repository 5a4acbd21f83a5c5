//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the ClassroomBuddy application,
//! including all slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (roster, rules, conduct, weeks, grades, ai, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    ai::CompletionService,
    core::rollover::{self, RolloverEngine},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Discord rejects messages longer than this
pub const MESSAGE_LIMIT: usize = 2000;

/// Shared data available to all bot commands.
/// This structure holds the database connection, the rollover engine and the
/// optional AI service.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Weekly rollover engine shared by every command
    pub rollover: RolloverEngine,
    /// AI completion service, `None` when no API key is configured
    pub ai: Option<Arc<dyn CompletionService>>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        rollover: RolloverEngine,
        ai: Option<Arc<dyn CompletionService>>,
    ) -> Self {
        Self {
            database,
            rollover,
            ai,
        }
    }

    /// The AI service, or an error explaining that it is not configured.
    pub fn ai_service(&self) -> Result<&dyn CompletionService> {
        self.ai.as_deref().ok_or_else(crate::ai::not_configured)
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Splits `text` into pieces Discord accepts, breaking on line boundaries.
#[must_use]
pub fn split_message(text: &str) -> Vec<String> {
    let limit = MESSAGE_LIMIT - 10;
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if line.len() > limit {
            let mut rest = line;
            while rest.len() > limit {
                let mut cut = limit;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
        } else {
            current.push_str(line);
        }
        current.push('\n');
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sends `text`, split over several messages when it is too long.
pub async fn say_long(ctx: Context<'_>, text: &str) -> Result<()> {
    for chunk in split_message(text) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Commands that run the rollover check themselves and report its outcome.
const SELF_ROLLOVER_COMMANDS: [&str; 1] = ["rollover"];

/// Whether the `pre_command` hook should run the rollover check for `command`.
#[must_use]
pub fn hook_checks_rollover(command: &str) -> bool {
    !SELF_ROLLOVER_COMMANDS.contains(&command)
}

/// Runs the calendar rollover check before every command except `/rollover`.
async fn pre_command(ctx: Context<'_>) {
    if !hook_checks_rollover(&ctx.command().name) {
        return;
    }
    let data = ctx.data();
    match data.rollover.check_and_run(&data.database).await {
        Ok(Some(result)) => info!(
            "Rollover triggered by /{}: week {} archived, now week {}",
            ctx.command().name,
            result.archived_week,
            result.new_week
        ),
        Ok(None) => {}
        // The predicate stays true, so the next command retries
        Err(e) => error!("Weekly rollover check failed: {e}"),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!("Error in command `{}`: {error}", ctx.command().name);
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Starts the Discord bot and blocks until it stops.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            pre_command: |ctx| Box::pin(pre_command(ctx)),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(
                    "Registered {} commands globally",
                    framework.options().commands.len()
                );
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

/// Formats a rollover result for a Discord message.
pub fn rollover_message(result: &rollover::RolloverResult) -> Result<String> {
    let summary = rollover::format_rollover_summary(result)?;
    Ok(format!("✅ **Week closed!**\n{summary}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollover_command_skips_hook() {
        assert!(!hook_checks_rollover("rollover"));
        assert!(hook_checks_rollover("standings"));
        assert!(hook_checks_rollover("close_week"));
    }

    #[test]
    fn test_split_message_short() {
        assert_eq!(split_message("hello\nworld"), vec!["hello\nworld\n"]);
        assert!(split_message("").is_empty());
    }

    #[test]
    fn test_split_message_respects_limit() {
        let line = "x".repeat(100);
        let text = vec![line.as_str(); 50].join("\n");

        let chunks = split_message(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
        assert_eq!(chunks.concat().len(), text.len() + 1);
    }

    #[test]
    fn test_split_message_long_line() {
        let text = "é".repeat(MESSAGE_LIMIT);
        let chunks = split_message(&text);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
        assert_eq!(chunks.concat().trim_end(), text);
    }
}
