//! Violation rule Discord commands - list, add, edit and delete rules.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::violation_type,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Lists all violation rules.
    #[poise::command(slash_command)]
    pub async fn rules(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let all = violation_type::list_rules(db).await?;

        if all.is_empty() {
            ctx.say("📋 No rules defined yet. Add one with `/add_rule`.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("📋 **Violation rules**\n\n");
        for rule in &all {
            writeln!(&mut response, "• **{}** (-{})", rule.name, rule.points_deducted)?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Adds a violation rule.
    #[poise::command(slash_command)]
    pub async fn add_rule(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Rule name, e.g. Đi muộn"] name: String,
        #[description = "Points deducted"]
        #[min = 1]
        points: i32,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let rule = violation_type::create_rule(db, name, points).await?;

        ctx.say(format!(
            "✅ Added rule **{}** (-{}).",
            rule.name, rule.points_deducted
        ))
        .await?;
        Ok(())
    }

    /// Renames or re-prices a rule. Recorded violations are not changed.
    #[poise::command(slash_command)]
    pub async fn edit_rule(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Rule to edit"]
        #[autocomplete = "autocomplete::autocomplete_rule_name"]
        name: String,
        #[description = "New name (optional)"] new_name: Option<String>,
        #[description = "New points (optional)"]
        #[min = 1]
        points: Option<i32>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        if new_name.is_none() && points.is_none() {
            ctx.say("❌ Please specify a new name or new points.").await?;
            return Ok(());
        }

        let Some(rule) = violation_type::get_rule_by_name(db, &name).await? else {
            ctx.say(format!("❌ Rule '{name}' not found.")).await?;
            return Ok(());
        };

        let updated = violation_type::update_rule(
            db,
            rule.id,
            new_name.unwrap_or(rule.name),
            points.unwrap_or(rule.points_deducted),
        )
        .await?;

        ctx.say(format!(
            "✅ Rule is now **{}** (-{}). Past violations keep their original values.",
            updated.name, updated.points_deducted
        ))
        .await?;
        Ok(())
    }

    /// Deletes a rule. Recorded violations are kept.
    #[poise::command(slash_command)]
    pub async fn delete_rule(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Rule to delete"]
        #[autocomplete = "autocomplete::autocomplete_rule_name"]
        name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(rule) = violation_type::get_rule_by_name(db, &name).await? else {
            ctx.say(format!("❌ Rule '{name}' not found.")).await?;
            return Ok(());
        };

        violation_type::delete_rule(db, rule.id).await?;
        ctx.say(format!("✅ Deleted rule **{}**.", rule.name)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
