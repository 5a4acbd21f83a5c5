//! System config entity - Stores key-value pairs for system-wide state.
//! Used for the logical week counter and the last real-world ISO week the
//! rollover check has seen.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System config database model - stores key-value configuration pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_config")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Configuration key (e.g., `"current_week"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Configuration value stored as string
    pub value: String,
    /// When this configuration was last modified
    pub updated_at: DateTime,
}

/// `SystemConfig` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
