//! Course entity - A partner-owned course made of lessons.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// Unique identifier for the course
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Course title
    pub title: String,
    /// Course description
    pub description: String,
    /// Chat ID of the owning partner
    pub partner_id: String,
    /// When the course was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Course and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One course has many lessons
    #[sea_orm(has_many = "super::lesson::Entity")]
    Lessons,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
