//! Lesson entity - One lesson of a course, with optional study material.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lesson database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    /// Unique identifier for the lesson
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Course this lesson belongs to
    pub course_id: i64,
    /// Lesson title
    pub title: String,
    /// Lesson description
    pub description: String,
    /// Link to external study material
    pub material_link: Option<String>,
}

/// Defines relationships between Lesson and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lesson belongs to one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    /// One lesson has many questions
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
