//! Inquiry entity - A student's question to the partner who owns a course.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inquiry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inquiries")]
pub struct Model {
    /// Unique identifier, quoted to the partner so they can answer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Course the question is about
    pub course_id: i64,
    /// Chat ID of the student who asked
    pub asker_id: String,
    /// Chat ID of the partner who owns the course
    pub partner_id: String,
    /// Question text
    pub text: String,
    /// The partner's answer, once given
    pub answer: Option<String>,
    /// When the question was asked
    pub created_at: DateTimeUtc,
    /// When the question was answered
    pub answered_at: Option<DateTimeUtc>,
}

/// Defines relationships between Inquiry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each inquiry is about one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
