//! Product business logic - Handles all catalogue-related operations.
//!
//! This module provides functions for creating products, looking them up by id or
//! by their unique code, paging through the visible catalogue, and listing a
//! user's purchase history. Hidden products never appear in listings but remain
//! reachable through their code. All functions are async and return Result types
//! for proper error handling throughout the system.

use crate::{
    core::money::Amount,
    entities::{Product, Purchase, product, purchase},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use uuid::Uuid;

/// Number of products shown per catalogue page
pub const PAGE_SIZE: u64 = 5;

/// Prefix of every product code
pub const CODE_PREFIX: &str = "PRD-";

/// Everything needed to create a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Description shown on the product card
    pub description: String,
    /// Price
    pub price: Amount,
    /// Subscription period in months; `None` for one-off products
    pub subscription_months: Option<u32>,
    /// Chat ID of the creating partner
    pub partner_id: String,
    /// Attachment URL of the product image
    pub image_ref: Option<String>,
    /// Category key
    pub category: String,
    /// Exclude from the catalogue listing
    pub is_hidden: bool,
}

/// One page of the visible catalogue.
#[derive(Debug, Clone)]
pub struct ProductPage {
    /// Products on this page, in creation order
    pub products: Vec<product::Model>,
    /// 1-based page number actually shown
    pub page: u64,
    /// Total number of pages (at least 1)
    pub total_pages: u64,
}

impl ProductPage {
    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Generates a fresh product code such as `PRD-1A2B3C4D`.
#[must_use]
pub fn generate_product_code() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{CODE_PREFIX}{}", &hex[..8])
}

/// Normalizes user-typed codes: trims and uppercases.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Creates a new product with a freshly generated unique code.
///
/// # Errors
/// Returns an error if:
/// - The name, description or category is empty
/// - A subscription period of zero months is given
/// - The database insert operation fails
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }
    if new.description.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product description cannot be empty".to_string(),
        });
    }
    if new.category.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product category cannot be empty".to_string(),
        });
    }

    let subscription_period = match new.subscription_months {
        Some(0) => {
            return Err(Error::Validation {
                message: "Subscription period must be at least one month".to_string(),
            });
        }
        Some(months) => Some(i32::try_from(months).map_err(|_| Error::Validation {
            message: format!("Subscription period of {months} months is too long"),
        })?),
        None => None,
    };

    let product = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description.trim().to_string()),
        price: Set(new.price.minor()),
        is_subscription: Set(subscription_period.is_some()),
        subscription_period: Set(subscription_period),
        partner_id: Set(new.partner_id),
        image_ref: Set(new.image_ref),
        category: Set(new.category),
        code: Set(generate_product_code()),
        is_hidden: Set(new.is_hidden),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let product = product.insert(db).await?;

    tracing::info!(
        "Created product {} ({}) for partner {}",
        product.id,
        product.code,
        product.partner_id
    );
    Ok(product)
}

/// Retrieves a specific product by its unique ID, hidden or not.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by its code, hidden or not. Lookup is case-insensitive.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Counts the products that appear in the catalogue.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn count_visible_products(db: &DatabaseConnection) -> Result<u64> {
    Product::find()
        .filter(product::Column::IsHidden.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Returns one page of visible products, [`PAGE_SIZE`] per page.
///
/// `page` is 1-based and clamped into the valid range, so asking for page 0 or
/// a page past the end shows the first or last page.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_visible_products(db: &DatabaseConnection, page: u64) -> Result<ProductPage> {
    let paginator = Product::find()
        .filter(product::Column::IsHidden.eq(false))
        .order_by_asc(product::Column::Id)
        .paginate(db, PAGE_SIZE);

    let total_pages = paginator.num_pages().await?.max(1);
    let page = page.clamp(1, total_pages);
    let products = paginator.fetch_page(page - 1).await?;

    Ok(ProductPage {
        products,
        page,
        total_pages,
    })
}

/// Finds visible products whose name or code contains `partial`, up to `limit`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn search_visible_products(
    db: &DatabaseConnection,
    partial: &str,
    limit: u64,
) -> Result<Vec<product::Model>> {
    let partial = partial.trim();
    Product::find()
        .filter(product::Column::IsHidden.eq(false))
        .filter(
            Condition::any()
                .add(product::Column::Name.contains(partial))
                .add(product::Column::Code.contains(partial)),
        )
        .order_by_asc(product::Column::Name)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns a user's purchases, newest first, with the product when it still exists.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn purchases_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<(purchase::Model, Option<product::Model>)>> {
    Purchase::find()
        .filter(purchase::Column::UserId.eq(user_id))
        .find_also_related(Product)
        .order_by_desc(purchase::Column::PurchasedAt)
        .order_by_desc(purchase::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
