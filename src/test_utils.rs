//! Shared test utilities for `VedShop`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        ledger,
        money::Amount,
        product::{self, NewProduct},
        user,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Partner ID used by test products
pub const TEST_PARTNER_ID: &str = "partner";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a user and tops up the balance.
///
/// The username equals the user ID.
pub async fn create_funded_user(
    db: &DatabaseConnection,
    user_id: &str,
    balance: Amount,
) -> Result<entities::user::Model> {
    let registration = user::register_user(db, user_id, user_id).await?;
    if balance == Amount::ZERO {
        return Ok(registration.user);
    }
    ledger::deposit(db, user_id, balance).await?;
    user::get_user(db, user_id)
        .await
        .map(|u| u.unwrap_or(registration.user))
}

/// Builds product parameters with sensible defaults.
///
/// # Defaults
/// * `description`: "Test description"
/// * `category`: "other"
/// * one-off, visible, no image, owned by [`TEST_PARTNER_ID`]
#[must_use]
pub fn new_test_product(name: &str, price: Amount) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: "Test description".to_string(),
        price,
        subscription_months: None,
        partner_id: TEST_PARTNER_ID.to_string(),
        image_ref: None,
        category: "other".to_string(),
        is_hidden: false,
    }
}

/// Creates a visible one-off test product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: Amount,
) -> Result<entities::product::Model> {
    product::create_product(db, new_test_product(name, price)).await
}
