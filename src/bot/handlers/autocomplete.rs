//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module provides autocomplete functionality for product codes, so users
//! can type part of a product name and pick the matching code.

use crate::{bot::BotData, core::product, errors::Error};

/// Discord's limit on autocomplete suggestions
const MAX_SUGGESTIONS: u64 = 25;

/// Provides autocomplete suggestions for product codes.
///
/// This function searches visible products whose name or code contains the
/// user's partial input and returns up to 25 matching codes. Hidden products
/// are never suggested; they can only be reached by typing the full code.
///
/// # Arguments
/// * `ctx` - The poise context containing the database connection
/// * `partial` - The partial string the user has typed so far
///
/// # Returns
/// A vector of product codes that match the partial input
pub async fn autocomplete_product_code(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(products) = product::search_visible_products(db, partial, MAX_SUGGESTIONS).await else {
        return Vec::new();
    };

    products.into_iter().map(|p| p.code).collect()
}
