//! Shared test utilities for `ClassroomBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        grade::{self, SubjectInput},
        student, violation_type,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Sends log output through the test harness so it shows up with `--nocapture`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test student with a full score.
pub async fn create_test_student(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    class_name: &str,
) -> Result<entities::student::Model> {
    student::create_student(
        db,
        code.to_string(),
        name.to_string(),
        class_name.to_string(),
    )
    .await
}

/// Creates a violation rule deducting `points`.
pub async fn create_test_rule(
    db: &DatabaseConnection,
    name: &str,
    points: i32,
) -> Result<entities::violation_type::Model> {
    violation_type::create_rule(db, name.to_string(), points).await
}

/// Creates a subject with the default 3/1/1 column layout.
pub async fn create_test_subject(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
) -> Result<entities::subject::Model> {
    grade::create_subject(db, SubjectInput::new(name, code)).await
}

/// Sets up a database with two students in `"12 Tin"` and one rule.
/// Returns (db, [student A, student B], rule).
pub async fn setup_with_class() -> Result<(
    DatabaseConnection,
    [entities::student::Model; 2],
    entities::violation_type::Model,
)> {
    let db = setup_test_db().await?;
    let a = create_test_student(&db, "12TIN-001", "Nguyễn Văn A", "12 Tin").await?;
    let b = create_test_student(&db, "12TIN-002", "Trần Thị B", "12 Tin").await?;
    let rule = create_test_rule(&db, "Đi muộn", 5).await?;
    Ok((db, [a, b], rule))
}
