//! Referral entity - Append-only record linking a referrer to the user they invited.
//!
//! `referred_id` is unique: a user can be referred at most once, which is what
//! keeps the referral bonus from being credited twice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    /// Unique identifier for the referral
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat ID of the inviting user
    pub referrer_id: String,
    /// Chat ID of the invited user
    #[sea_orm(unique)]
    pub referred_id: String,
    /// Bonus credited to the referrer, in minor units
    pub bonus: i64,
    /// When the referral was registered
    pub created_at: DateTimeUtc,
}

/// `Referral` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
