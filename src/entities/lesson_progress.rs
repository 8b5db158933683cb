//! Lesson progress entity - Per-user completion flag for a lesson.
//!
//! `(user_id, lesson_id)` is unique (index created in
//! [`crate::config::database::create_tables`]), so marking a lesson complete
//! twice updates the existing row instead of adding one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lesson progress database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson_progress")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat ID of the student
    pub user_id: String,
    /// Completed lesson
    pub lesson_id: i64,
    /// Completion flag
    pub completed: bool,
    /// When the lesson was (last) marked complete
    pub completed_at: Option<DateTimeUtc>,
}

/// Defines relationships between `LessonProgress` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each progress row refers to one lesson
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id"
    )]
    Lesson,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
