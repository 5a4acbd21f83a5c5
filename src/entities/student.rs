//! Student entity - One row per student on the roster.
//!
//! `current_score` is the live conduct score: it starts at 100, is reduced by
//! violations, restored (up to 100) when a violation is deleted and reset to
//! 100 by the weekly rollover.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// School-issued student code printed on the ID card (e.g. `"12TIN-001"`)
    #[sea_orm(unique)]
    pub student_code: String,
    /// Display name
    pub name: String,
    /// Class label (e.g. `"12 Tin"`)
    pub student_class: String,
    /// Live conduct score, 100 at the start of every logical week
    pub current_score: i32,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many violations
    #[sea_orm(has_many = "super::violation::Entity")]
    Violations,
    /// One student has many grades
    #[sea_orm(has_many = "super::grade::Entity")]
    Grades,
}

impl Related<super::violation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Violations.def()
    }
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
