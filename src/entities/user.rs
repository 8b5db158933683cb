//! User entity - Represents a registered chat participant.
//!
//! Each user has a balance in minor currency units, a role that gates
//! partner and admin features, and a lazily generated referral link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user on the platform
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    /// May create products and courses
    #[sea_orm(string_value = "partner")]
    Partner,
    /// Operator
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Whether this role may create products, courses, lessons and questions.
    #[must_use]
    pub const fn can_publish(self) -> bool {
        matches!(self, Self::Partner | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Partner => "partner",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Internal row identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat platform user ID
    #[sea_orm(unique)]
    pub user_id: String,
    /// Display name at registration time
    pub username: String,
    /// Current balance in minor units (hundredths), never negative
    pub balance: i64,
    /// Platform role
    pub role: Role,
    /// Referral link, generated on first request and stable afterwards
    pub referral_link: Option<String>,
    /// When the user first ran `/start`
    pub created_at: DateTimeUtc,
}

/// `User` is referenced by chat ID from other tables, without foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
