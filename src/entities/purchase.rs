//! Purchase entity - Append-only record of a successful product purchase.
//!
//! Exactly one row is written per successful debit, inside the same database
//! transaction as the balance update.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier for the purchase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat ID of the buyer
    pub user_id: String,
    /// Purchased product
    pub product_id: i64,
    /// Price paid, in minor units
    pub amount: i64,
    /// When the purchase happened
    pub purchased_at: DateTimeUtc,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
