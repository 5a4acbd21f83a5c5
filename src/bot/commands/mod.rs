//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// AI helper commands (card scanning, assistant, reports)
pub mod ai;

/// Violation recording and conduct views
pub mod conduct;

/// General utility commands
pub mod general;

/// Subject and grade commands
pub mod grades;

/// Student and class management commands
pub mod roster;

/// Violation rule management commands
pub mod rules;

/// Logical week, rollover and history commands
pub mod weeks;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use ai::*;
pub use conduct::*;
pub use general::*;
pub use grades::*;
pub use roster::*;
pub use rules::*;
pub use weeks::*;

/// Every command registered with Discord.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        students(),
        add_student(),
        edit_student(),
        delete_student(),
        add_class(),
        rules(),
        add_rule(),
        edit_rule(),
        delete_rule(),
        violate(),
        violate_many(),
        undo_violation(),
        standings(),
        timeline(),
        week(),
        rollover(),
        close_week(),
        set_week(),
        history(),
        weekly_report(),
        subjects(),
        add_subject(),
        delete_subject(),
        grade(),
        transcript(),
        scan_card(),
        ask(),
        comment(),
        parent_report(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Discord rejects longer command and option descriptions
    const MAX_DESCRIPTION: usize = 100;

    #[test]
    fn test_descriptions_fit_discord_limits() {
        for command in all() {
            let description = command.description.as_deref().unwrap_or_default();
            assert!(
                !description.is_empty() && description.chars().count() <= MAX_DESCRIPTION,
                "/{} has a description of {} chars",
                command.name,
                description.chars().count()
            );
            for parameter in &command.parameters {
                let text = parameter.description.as_deref().unwrap_or_default();
                assert!(
                    text.chars().count() <= MAX_DESCRIPTION,
                    "/{} option {} is too long",
                    command.name,
                    parameter.name
                );
            }
        }
    }

    #[test]
    fn test_command_names_are_unique() {
        let mut names: Vec<String> = all().into_iter().map(|c| c.name).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
        assert!(names.iter().any(|n| n == "scan_card"));
    }
}
