//! Key-value system configuration store.
//!
//! Rows are created lazily on first write. Two keys drive the weekly rollover:
//! [`CURRENT_WEEK_KEY`] (the logical week counter, 1 when unset) and
//! [`LAST_RESET_WEEK_KEY`] (the last real-world ISO week the rollover check saw).

use crate::{
    entities::{SystemConfig, system_config},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, SqlErr, prelude::*, sea_query::Expr};
use tracing::debug;

/// Key holding the logical week counter
pub const CURRENT_WEEK_KEY: &str = "current_week";
/// Key holding the last real-world ISO week identifier seen by the rollover check
pub const LAST_RESET_WEEK_KEY: &str = "last_reset_week_id";

/// Logical week used before any value has been stored
pub const DEFAULT_WEEK: i32 = 1;

/// Retrieves the value stored under `key`, or `None` if the key was never set.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemConfig::find()
        .filter(system_config::Column::Key.eq(key))
        .one(db)
        .await?;
    debug!("System config for key '{}': {:?}", key, state.as_ref().map(|s| &s.value));
    Ok(state.map(|s| s.value))
}

/// Sets or updates the value stored under `key` (UPSERT behaviour).
pub async fn set_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = SystemConfig::find()
        .filter(system_config::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_config::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_config::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Replaces the value under `key` only if it still equals `expected`
/// (`None` meaning the key must not exist yet).
///
/// Returns `false` when another writer changed the value first.
pub async fn compare_and_set<C>(
    db: &C,
    key: &str,
    expected: Option<&str>,
    value: &str,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let Some(expected) = expected else {
        // The unique index on `key` rejects a second concurrent insert.
        let new_state = system_config::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        return match new_state.insert(db).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        };
    };

    let result = SystemConfig::update_many()
        .col_expr(system_config::Column::Value, Expr::value(value))
        .col_expr(system_config::Column::UpdatedAt, Expr::value(now))
        .filter(system_config::Column::Key.eq(key))
        .filter(system_config::Column::Value.eq(expected))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Returns the logical week counter, [`DEFAULT_WEEK`] when unset.
pub async fn get_current_week<C>(db: &C) -> Result<i32>
where
    C: ConnectionTrait,
{
    match get_value(db, CURRENT_WEEK_KEY).await? {
        Some(value) => value.trim().parse::<i32>().map_err(|e| Error::Config {
            message: format!("Failed to parse current week '{value}': {e}"),
        }),
        None => Ok(DEFAULT_WEEK),
    }
}

/// Overwrites the logical week counter. Weeks start at 1.
pub async fn set_current_week<C>(db: &C, week: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    if week < 1 {
        return Err(Error::Config {
            message: format!("Week number must be at least 1, got {week}"),
        });
    }
    set_value(db, CURRENT_WEEK_KEY, &week.to_string()).await
}

/// Returns the last real-world ISO week identifier seen by the rollover check.
pub async fn get_last_reset_week_id<C>(db: &C) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    get_value(db, LAST_RESET_WEEK_KEY).await
}
