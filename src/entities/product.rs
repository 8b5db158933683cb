//! Product entity - Represents a digital product offered by a partner.
//!
//! Products carry a unique code so hidden products can still be found and
//! bought directly, while only visible ones appear in the catalogue.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product
    pub name: String,
    /// Free-form description shown on the product card
    pub description: String,
    /// Price in minor units
    pub price: i64,
    /// Whether the product is a recurring subscription
    pub is_subscription: bool,
    /// Subscription period in months, only set for subscriptions
    pub subscription_period: Option<i32>,
    /// Chat ID of the partner who created the product
    pub partner_id: String,
    /// Platform reference to the product image (attachment URL)
    pub image_ref: Option<String>,
    /// Catalogue category key (e.g. `"retreat"`)
    pub category: String,
    /// Unique lookup code (e.g. `"PRD-1A2B3C4D"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Hidden products are excluded from listings but resolvable by code
    pub is_hidden: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
