//! Database configuration module for `VedShop`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent
//! (`IF NOT EXISTS`), which lets the bot restart against an existing database file.
//! Composite unique constraints that the entity macros cannot express are added as
//! explicit indexes.

use crate::entities::{
    Course, CourseTag, Inquiry, Lesson, LessonProgress, PartnerProfile, Product, Purchase,
    Question, Referral, User, course_tag, lesson_progress,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/vedshop.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Local file path of a `sqlite://` URL, or `None` for in-memory and
/// non-`SQLite` URLs.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(':') {
        return None;
    }
    Some(Path::new(path))
}

/// Creates the directory that will hold the `SQLite` database file, if any.
///
/// `SQLite` creates the file itself (`mode=rwc`) but not missing parent directories.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent) else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(parent)?;
    info!("Created database directory {}", parent.display());
    Ok(())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_database_dir(&database_url)?;
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables and indexes.
///
/// Safe to call on every start-up: existing tables and indexes are left untouched.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Purchase).await?;
    create_table(db, &schema, Referral).await?;
    create_table(db, &schema, Course).await?;
    create_table(db, &schema, Lesson).await?;
    create_table(db, &schema, Question).await?;
    create_table(db, &schema, LessonProgress).await?;
    create_table(db, &schema, PartnerProfile).await?;
    create_table(db, &schema, CourseTag).await?;
    create_table(db, &schema, Inquiry).await?;

    // One progress row per (user, lesson); completion upserts rely on it
    let progress_index = Index::create()
        .name("idx_lesson_progress_user_lesson")
        .table(LessonProgress)
        .col(lesson_progress::Column::UserId)
        .col(lesson_progress::Column::LessonId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&progress_index)).await?;

    let tag_index = Index::create()
        .name("idx_course_tags_course_tag")
        .table(CourseTag)
        .col(course_tag::Column::CourseId)
        .col(course_tag::Column::Tag)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&tag_index)).await?;

    info!("Database tables ensured");
    Ok(())
}
