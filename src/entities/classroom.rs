//! Classroom entity - Known class labels offered when adding students.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classroom database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Class label, e.g. `"12 Tin"`
    #[sea_orm(unique)]
    pub name: String,
}

/// `Classroom` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
