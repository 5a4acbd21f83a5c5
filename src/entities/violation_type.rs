//! Violation type entity - A named conduct rule with a fixed point deduction.
//!
//! Violations copy the rule's name and points when they are recorded, so
//! editing or deleting a rule never rewrites history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Violation rule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "violation_types")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Rule name, e.g. `"Đi muộn"` (late to class)
    #[sea_orm(unique)]
    pub name: String,
    /// Points deducted each time the rule is applied
    pub points_deducted: i32,
}

/// `ViolationType` has no relationships; violations reference it by name only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
