//! Class label management.

use crate::{
    entities::{Classroom, classroom},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Adds a class label if it does not exist yet and returns the stored row.
pub async fn add_class(db: &DatabaseConnection, name: &str) -> Result<classroom::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Class name cannot be empty".to_string(),
        });
    }

    if let Some(existing) = Classroom::find()
        .filter(classroom::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    classroom::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists all class labels alphabetically.
pub async fn list_classes(db: &DatabaseConnection) -> Result<Vec<classroom::Model>> {
    Classroom::find()
        .order_by_asc(classroom::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
