//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**ClassroomBuddy Help**\n\
        Conduct points, weekly archives and grades for your classes.\n\n\
        **Conduct**\n\
        • `/violate <student> <rule>` - Records a violation and deducts points.\n\
        • `/violate_many <codes> <rule>` - Same rule for several students at once.\n\
        • `/undo_violation <id>` - Deletes a violation and restores its points.\n\
        • `/standings [class]` - Conduct overview and scores.\n\
        • `/timeline <student>` - A student's violation history.\n\n\
        **Weeks**\n\
        • `/week` - Current logical week and calendar week.\n\
        • `/rollover` - Runs the weekly rollover if a new calendar week started.\n\
        • `/close_week` - Archives and closes the current week now.\n\
        • `/set_week <n>` - Overrides the logical week number.\n\
        • `/history [week]` / `/weekly_report [week]` - Past weeks.\n\n\
        **Roster & rules**\n\
        • `/students`, `/add_student`, `/edit_student`, `/delete_student`, `/add_class`\n\
        • `/rules`, `/add_rule`, `/edit_rule`, `/delete_rule`\n\n\
        **Grades**\n\
        • `/subjects`, `/add_subject`, `/delete_subject`, `/grade`, `/transcript`\n\n\
        **AI helper**\n\
        • `/scan_card <photo> [rule]` - Reads an ID card and finds the student.\n\
        • `/ask <message>` - Looks up a student or asks the assistant.\n\
        • `/comment <student>` / `/parent_report <student>` - Written feedback.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
