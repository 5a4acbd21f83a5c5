//! Violation entity - One recorded conduct deduction.
//!
//! Each violation stores the `student_id`, a by-value copy of the rule name and
//! points, the UTC timestamp and the logical `week_number` it was recorded in.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Violation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "violations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the student the deduction applies to
    pub student_id: i64,
    /// Name of the rule at the time it was applied
    pub violation_type_name: String,
    /// Points deducted at the time it was applied
    pub points_deducted: i32,
    /// When the violation was recorded
    pub date_committed: DateTimeUtc,
    /// Logical week the violation belongs to
    pub week_number: i32,
}

/// Defines relationships between Violation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each violation belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
