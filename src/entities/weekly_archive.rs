//! Weekly archive entity - Snapshot of one student's standing at the close of
//! a logical week.
//!
//! Name, code and class are copied by value so historical reports stay stable
//! when the student is later edited or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly archive database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_archives")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Logical week this snapshot closes
    pub week_number: i32,
    /// Student id at archive time (not a foreign key; the student may be gone)
    pub student_id: Option<i64>,
    /// Student name at archive time
    pub student_name: String,
    /// Student code at archive time
    pub student_code: String,
    /// Student class at archive time
    pub student_class: String,
    /// Conduct score at the close of the week
    pub final_score: i32,
    /// Sum of points deducted during the week
    pub total_deductions: i32,
    /// When the snapshot was written
    pub created_at: DateTimeUtc,
}

/// `WeeklyArchive` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
