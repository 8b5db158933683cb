//! Partner profile entity - Public directory entry submitted via "become a partner".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Partner profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partner_profiles")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat ID of the submitting user
    pub user_id: String,
    /// Partner name
    pub name: String,
    /// Partner credo
    pub credo: String,
    /// Optional logo URL
    pub logo_url: Option<String>,
    /// Whether the profile appears in the public partner list
    pub show_in_list: bool,
    /// When the profile was submitted
    pub created_at: DateTimeUtc,
}

/// `PartnerProfile` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
