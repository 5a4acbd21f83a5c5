//! Subject entity - A taught subject and how many grade columns it uses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subject database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subject name, e.g. `"Toán"`
    #[sea_orm(unique)]
    pub name: String,
    /// Upper-case subject code, e.g. `"TOAN"`
    #[sea_orm(unique)]
    pub code: String,
    /// Free-form description
    pub description: Option<String>,
    /// Number of regular (TX) grade columns
    pub num_tx_columns: i32,
    /// Number of mid-term (GK) grade columns
    pub num_gk_columns: i32,
    /// Number of final (HK) grade columns
    pub num_hk_columns: i32,
    /// When the subject was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Subject and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One subject has many grades
    #[sea_orm(has_many = "super::grade::Entity")]
    Grades,
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
