//! Seed configuration loading from config.toml
//!
//! This module loads the classes and violation rules that should exist on a
//! fresh database. Seeding only fills empty tables, so edits made through the
//! bot are never overwritten on restart.

use crate::{
    core::{classroom, violation_type},
    entities::ViolationType,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Class labels to create
    #[serde(default)]
    pub classes: Vec<String>,
    /// Violation rules to create when no rule exists yet
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Configuration for a single violation rule
#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    /// Rule name
    pub name: String,
    /// Points deducted per occurrence
    pub points: i32,
}

impl Config {
    /// Built-in seed used when no config.toml is present.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            classes: Vec::new(),
            rules: vec![RuleConfig {
                name: "Đi muộn".to_string(),
                points: 2,
            }],
        }
    }
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads ./config.toml, falling back to [`Config::builtin`] when the file is absent.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        info!("No config.toml found, using built-in seed");
        Ok(Config::builtin())
    }
}

/// Creates the configured classes and, if the rule table is empty, the configured rules.
pub async fn seed_database(db: &DatabaseConnection, config: &Config) -> Result<()> {
    for class_name in &config.classes {
        classroom::add_class(db, class_name).await?;
    }

    if ViolationType::find().count(db).await? == 0 {
        for rule in &config.rules {
            violation_type::create_rule(db, rule.name.clone(), rule.points).await?;
        }
        info!("Seeded {} violation rules", config.rules.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            classes = ["12 Tin", "11 Toán"]

            [[rules]]
            name = "Đi muộn"
            points = 2

            [[rules]]
            name = "Không làm bài tập"
            points = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classes, vec!["12 Tin", "11 Toán"]);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[1].name, "Không làm bài tập");
        assert_eq!(config.rules[1].points, 5);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.classes.is_empty());
        assert!(config.rules.is_empty());
    }

    #[tokio::test]
    async fn test_seed_database_only_fills_empty_rule_table() -> Result<()> {
        let db = setup_test_db().await?;
        let config = Config {
            classes: vec!["12 Tin".to_string()],
            ..Config::builtin()
        };

        seed_database(&db, &config).await?;
        seed_database(&db, &config).await?;

        assert_eq!(violation_type::list_rules(&db).await?.len(), 1);
        assert_eq!(classroom::list_classes(&db).await?.len(), 1);
        Ok(())
    }
}
