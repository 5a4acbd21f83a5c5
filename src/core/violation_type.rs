//! Violation rule business logic.
//!
//! Rules are looked up by id when applied, but violations copy the name and
//! points, so every function here can freely rename, re-price or delete a rule
//! without touching recorded history.

use crate::{
    entities::{ViolationType, violation_type},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Lists all rules alphabetically.
pub async fn list_rules(db: &DatabaseConnection) -> Result<Vec<violation_type::Model>> {
    ViolationType::find()
        .order_by_asc(violation_type::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a rule by id.
pub async fn get_rule_by_id<C>(db: &C, rule_id: i64) -> Result<Option<violation_type::Model>>
where
    C: ConnectionTrait,
{
    ViolationType::find_by_id(rule_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a rule by its exact (trimmed) name.
pub async fn get_rule_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<violation_type::Model>> {
    ViolationType::find()
        .filter(violation_type::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_rule(name: &str, points: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Rule name cannot be empty".to_string(),
        });
    }
    if points <= 0 {
        return Err(Error::InvalidPoints { points });
    }
    Ok(())
}

/// Creates a new rule.
///
/// # Errors
/// Returns an error if the name is empty, the points are not positive or a
/// rule with the same name already exists.
pub async fn create_rule(
    db: &DatabaseConnection,
    name: String,
    points: i32,
) -> Result<violation_type::Model> {
    validate_rule(&name, points)?;

    let name = name.trim().to_string();
    if get_rule_by_name(db, &name).await?.is_some() {
        return Err(Error::DuplicateRule { name });
    }

    violation_type::ActiveModel {
        name: Set(name),
        points_deducted: Set(points),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Renames and/or re-prices a rule. Existing violations keep their old copy.
pub async fn update_rule(
    db: &DatabaseConnection,
    rule_id: i64,
    name: String,
    points: i32,
) -> Result<violation_type::Model> {
    validate_rule(&name, points)?;

    let existing = get_rule_by_id(db, rule_id)
        .await?
        .ok_or_else(|| Error::RuleNotFound {
            name: rule_id.to_string(),
        })?;

    let name = name.trim().to_string();
    if let Some(other) = get_rule_by_name(db, &name).await? {
        if other.id != rule_id {
            return Err(Error::DuplicateRule { name });
        }
    }

    let mut rule: violation_type::ActiveModel = existing.into();
    rule.name = Set(name);
    rule.points_deducted = Set(points);
    rule.update(db).await.map_err(Into::into)
}

/// Deletes a rule. Existing violations keep their by-value copy.
pub async fn delete_rule(db: &DatabaseConnection, rule_id: i64) -> Result<violation_type::Model> {
    let rule = get_rule_by_id(db, rule_id)
        .await?
        .ok_or_else(|| Error::RuleNotFound {
            name: rule_id.to_string(),
        })?;
    ViolationType::delete_by_id(rule_id).exec(db).await?;
    Ok(rule)
}
