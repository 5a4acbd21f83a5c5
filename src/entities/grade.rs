//! Grade entity - One score in one grade column of one subject.
//!
//! A grade is identified by (student, subject, `grade_type`, `column_index`,
//! semester, `school_year`); recording the same slot again overwrites it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grade database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student the grade belongs to
    pub student_id: i64,
    /// Subject the grade belongs to
    pub subject_id: i64,
    /// `"TX"`, `"GK"` or `"HK"`
    pub grade_type: String,
    /// 1-based column within the grade type
    pub column_index: i32,
    /// Score on the 0–10 scale
    pub score: f64,
    /// Semester (1 or 2)
    pub semester: i32,
    /// School year label, e.g. `"2023-2024"`
    pub school_year: String,
    /// When the grade was last recorded
    pub date_recorded: DateTimeUtc,
}

/// Defines relationships between Grade and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each grade belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each grade belongs to one subject
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
