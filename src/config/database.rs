//! Database configuration module for `ClassroomBuddy`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{
    Classroom, Grade, Student, Subject, SystemConfig, Violation, ViolationType, WeeklyArchive,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/classroom_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table that does not exist yet.
///
/// Parent tables are created before the tables holding foreign keys to them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Student).await?;
    create_table(db, &schema, Classroom).await?;
    create_table(db, &schema, ViolationType).await?;
    create_table(db, &schema, Violation).await?;
    create_table(db, &schema, WeeklyArchive).await?;
    create_table(db, &schema, SystemConfig).await?;
    create_table(db, &schema, Subject).await?;
    create_table(db, &schema, Grade).await?;

    Ok(())
}
