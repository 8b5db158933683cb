//! Question entity - A multiple-choice question attached to a lesson.
//!
//! Options are stored newline-joined in a single text column; use
//! [`Model::option_list`] to get them back in order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Separator used to store the ordered option list
pub const OPTION_SEPARATOR: char = '\n';

/// Question database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    /// Unique identifier for the question
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lesson this question belongs to
    pub lesson_id: i64,
    /// Question text
    pub text: String,
    /// Answer options, newline-joined
    pub options: String,
    /// Zero-based index of the correct option
    pub correct_option: i32,
}

impl Model {
    /// Answer options in their original order.
    #[must_use]
    pub fn option_list(&self) -> Vec<&str> {
        self.options.split(OPTION_SEPARATOR).collect()
    }
}

/// Defines relationships between Question and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each question belongs to one lesson
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
