//! Ledger business logic - All balance-affecting operations.
//!
//! This module owns every write to `users.balance`: purchases, referral bonuses
//! and operator deposits, plus the role lookups that gate partner features.
//! Purchases run inside a database transaction and debit with a conditional
//! `UPDATE ... WHERE balance >= price`, so a balance can never go negative and
//! concurrent purchases for the same user cannot both pass the funds check.

use crate::{
    core::money::Amount,
    entities::{Product, Purchase, Referral, Role, User, purchase, referral, user},
    errors::{Error, Result},
};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Result of a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseConfirmation {
    /// The inserted purchase record
    pub purchase: purchase::Model,
    /// The purchased product
    pub product: crate::entities::product::Model,
    /// Buyer's balance after the debit
    pub new_balance: Amount,
}

/// Result of registering a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// A new referral was recorded and the bonus credited
    Registered {
        /// Bonus credited to the referrer
        bonus: Amount,
    },
    /// The referred user already has a referrer; nothing changed
    AlreadyReferred,
}

/// Returns the balance of a user, or zero if the user is unknown.
pub async fn get_balance<C>(db: &C, user_id: &str) -> Result<Amount>
where
    C: ConnectionTrait,
{
    let user = User::find()
        .filter(user::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(user.map_or(Amount::ZERO, |u| Amount::from_minor(u.balance)))
}

/// Buys a product for a user.
///
/// Runs as a single database transaction: the product price is read, the balance
/// is debited only if it covers the price, and a purchase record is inserted.
/// Any failure leaves balance and purchase history untouched.
///
/// # Errors
/// - `UserNotFound` if the buyer never registered
/// - `ProductNotFound` if the product does not exist
/// - `InsufficientFunds` if the balance is below the price
/// - `Database` if any statement fails
pub async fn purchase(
    db: &DatabaseConnection,
    user_id: &str,
    product_id: i64,
) -> Result<PurchaseConfirmation> {
    let txn = db.begin().await?;

    let Some(buyer) = User::find()
        .filter(user::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    };

    let Some(product) = Product::find_by_id(product_id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(Error::ProductNotFound {
            reference: product_id.to_string(),
        });
    };

    let price = Amount::from_minor(product.price);
    if Amount::from_minor(buyer.balance).checked_sub(price).is_none() {
        txn.rollback().await?;
        return Err(Error::InsufficientFunds {
            current: Amount::from_minor(buyer.balance),
            required: price,
        });
    }

    // Conditional debit: only applies when the balance still covers the price
    let debit = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).sub(product.price),
        )
        .filter(user::Column::UserId.eq(user_id))
        .filter(user::Column::Balance.gte(product.price))
        .exec(&txn)
        .await?;

    if debit.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::InsufficientFunds {
            current: Amount::from_minor(buyer.balance),
            required: Amount::from_minor(product.price),
        });
    }

    let record = purchase::ActiveModel {
        user_id: Set(user_id.to_string()),
        product_id: Set(product.id),
        amount: Set(product.price),
        purchased_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let new_balance = get_balance(&txn, user_id).await?;
    txn.commit().await?;

    info!(
        "User {user_id} bought product {} ({}) for {}",
        product.id,
        product.code,
        Amount::from_minor(product.price)
    );

    Ok(PurchaseConfirmation {
        purchase: record,
        product,
        new_balance,
    })
}

/// Adds a referral bonus to a referrer's balance.
///
/// Unknown referrers are ignored: the referral itself is still valid, there is
/// just nobody to pay.
pub async fn credit_referral<C>(db: &C, referrer_id: &str, amount: Amount) -> Result<()>
where
    C: ConnectionTrait,
{
    let credited = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount.minor()),
        )
        .filter(user::Column::UserId.eq(referrer_id))
        .exec(db)
        .await?;

    if credited.rows_affected == 0 {
        debug!("Referral bonus for unknown referrer {referrer_id} skipped");
    } else {
        info!("Credited referral bonus {amount} to {referrer_id}");
    }
    Ok(())
}

/// Records that `referrer_id` invited `referred_id` and credits the bonus.
///
/// A user can be referred only once; later registrations for the same
/// `referred_id` return [`ReferralOutcome::AlreadyReferred`] without crediting.
///
/// # Errors
/// - `SelfReferral` if both IDs are equal (nothing is written)
/// - `Database` if any statement fails
pub async fn register_referral(
    db: &DatabaseConnection,
    referrer_id: &str,
    referred_id: &str,
    bonus: Amount,
) -> Result<ReferralOutcome> {
    if referrer_id == referred_id {
        return Err(Error::SelfReferral);
    }

    let txn = db.begin().await?;

    let existing = Referral::find()
        .filter(referral::Column::ReferredId.eq(referred_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        txn.rollback().await?;
        debug!("User {referred_id} already has a referrer");
        return Ok(ReferralOutcome::AlreadyReferred);
    }

    referral::ActiveModel {
        referrer_id: Set(referrer_id.to_string()),
        referred_id: Set(referred_id.to_string()),
        bonus: Set(bonus.minor()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    credit_referral(&txn, referrer_id, bonus).await?;
    txn.commit().await?;

    info!("Registered referral {referrer_id} -> {referred_id}");
    Ok(ReferralOutcome::Registered { bonus })
}

/// Tops up a user's balance (operator credit).
///
/// The credit is applied with a conditional `UPDATE` that refuses to push the
/// balance past the largest storable amount.
///
/// # Errors
/// - `InvalidAmount` if `amount` is not positive or the balance would overflow
/// - `UserNotFound` if the user never registered
pub async fn deposit(db: &DatabaseConnection, user_id: &str, amount: Amount) -> Result<Amount> {
    if amount <= Amount::ZERO {
        return Err(Error::InvalidAmount {
            input: amount.to_string(),
        });
    }

    let txn = db.begin().await?;
    let Some(holder) = User::find()
        .filter(user::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    };

    let overflow = || Error::InvalidAmount {
        input: format!("{amount} on top of {}", Amount::from_minor(holder.balance)),
    };
    if Amount::from_minor(holder.balance)
        .checked_add(amount)
        .is_none()
    {
        txn.rollback().await?;
        return Err(overflow());
    }

    let updated = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount.minor()),
        )
        .filter(user::Column::UserId.eq(user_id))
        .filter(user::Column::Balance.lte(i64::MAX - amount.minor()))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        txn.rollback().await?;
        return Err(overflow());
    }

    let balance = get_balance(&txn, user_id).await?;
    txn.commit().await?;

    info!("Deposited {amount} to {user_id}, balance now {balance}");
    Ok(balance)
}

/// Returns the role of a user, `Role::User` if unknown.
pub async fn get_role(db: &DatabaseConnection, user_id: &str) -> Result<Role> {
    let user = User::find()
        .filter(user::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(user.map_or(Role::User, |u| u.role))
}

/// Sets the role of a user, creating the user row if it does not exist yet.
pub async fn set_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<()> {
    let row = user::ActiveModel {
        user_id: Set(user_id.to_string()),
        username: Set(user_id.to_string()),
        balance: Set(0),
        role: Set(role),
        referral_link: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    User::insert(row)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .update_column(user::Column::Role)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!("Role of {user_id} set to {role}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_balance_unknown_user_is_zero() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_balance(&db, "nobody").await?, Amount::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_with_sufficient_funds() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "buyer", Amount::from_major(20)).await?;
        let product = create_test_product(&db, "Course", Amount::from_major(10)).await?;

        let confirmation = purchase(&db, "buyer", product.id).await?;

        assert_eq!(confirmation.new_balance, Amount::from_major(10));
        assert_eq!(confirmation.purchase.amount, Amount::from_major(10).minor());
        assert_eq!(get_balance(&db, "buyer").await?, Amount::from_major(10));

        let records = Purchase::find()
            .filter(purchase::Column::UserId.eq("buyer"))
            .filter(purchase::Column::ProductId.eq(product.id))
            .all(&db)
            .await?;
        assert_eq!(records.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_insufficient_funds_mutates_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "buyer", Amount::from_major(5)).await?;
        let product = create_test_product(&db, "Course", Amount::from_major(10)).await?;

        let result = purchase(&db, "buyer", product.id).await;

        assert!(matches!(
            result,
            Err(Error::InsufficientFunds { current, required })
                if current == Amount::from_major(5) && required == Amount::from_major(10)
        ));
        assert_eq!(get_balance(&db, "buyer").await?, Amount::from_major(5));
        assert_eq!(Purchase::find().all(&db).await?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_exact_balance_reaches_zero() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "buyer", Amount::from_major(10)).await?;
        let product = create_test_product(&db, "Course", Amount::from_major(10)).await?;

        purchase(&db, "buyer", product.id).await?;
        assert_eq!(get_balance(&db, "buyer").await?, Amount::ZERO);

        // A second attempt fails and the balance stays at zero
        let second = purchase(&db, "buyer", product.id).await;
        assert!(matches!(second, Err(Error::InsufficientFunds { .. })));
        assert_eq!(get_balance(&db, "buyer").await?, Amount::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_unknown_user_and_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Course", Amount::from_major(1)).await?;

        let result = purchase(&db, "ghost", product.id).await;
        assert!(matches!(result, Err(Error::UserNotFound { .. })));

        create_funded_user(&db, "buyer", Amount::from_major(5)).await?;
        let result = purchase(&db, "buyer", 999).await;
        assert!(matches!(result, Err(Error::ProductNotFound { .. })));
        assert_eq!(get_balance(&db, "buyer").await?, Amount::from_major(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_purchases_at_most_one_succeeds() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "buyer", Amount::from_major(15)).await?;
        let product = create_test_product(&db, "Course", Amount::from_major(10)).await?;

        let (first, second) = tokio::join!(
            purchase(&db, "buyer", product.id),
            purchase(&db, "buyer", product.id)
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(get_balance(&db, "buyer").await?, Amount::from_major(5));
        assert_eq!(Purchase::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_self_referral_rejected_without_side_effects() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "alice", Amount::ZERO).await?;

        let result = register_referral(&db, "alice", "alice", Amount::from_major(10)).await;

        assert!(matches!(result, Err(Error::SelfReferral)));
        assert_eq!(Referral::find().all(&db).await?.len(), 0);
        assert_eq!(get_balance(&db, "alice").await?, Amount::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_referral_bonus_credited_once() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "alice", Amount::from_major(1)).await?;
        create_funded_user(&db, "bob", Amount::ZERO).await?;
        let bonus = Amount::from_major(10);

        let first = register_referral(&db, "alice", "bob", bonus).await?;
        assert_eq!(first, ReferralOutcome::Registered { bonus });
        assert_eq!(get_balance(&db, "alice").await?, Amount::from_major(11));

        let again = register_referral(&db, "alice", "bob", bonus).await?;
        assert_eq!(again, ReferralOutcome::AlreadyReferred);
        assert_eq!(get_balance(&db, "alice").await?, Amount::from_major(11));
        assert_eq!(Referral::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_unknown_referrer_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        credit_referral(&db, "ghost", Amount::from_major(10)).await?;
        assert_eq!(get_balance(&db, "ghost").await?, Amount::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_deposit() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "alice", Amount::from_major(1)).await?;

        let balance = deposit(&db, "alice", Amount::from_minor(250)).await?;
        assert_eq!(balance, Amount::from_minor(350));

        let result = deposit(&db, "ghost", Amount::from_major(1)).await;
        assert!(matches!(result, Err(Error::UserNotFound { .. })));

        let result = deposit(&db, "alice", Amount::ZERO).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        let result = deposit(&db, "alice", Amount::from_minor(-100)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_deposit_overflow_leaves_balance_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_user(&db, "whale", Amount::from_minor(20)).await?;

        let result = deposit(&db, "whale", Amount::from_minor(i64::MAX - 10)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        assert_eq!(get_balance(&db, "whale").await?, Amount::from_minor(20));

        // Topping up to exactly the maximum still works
        let balance = deposit(&db, "whale", Amount::from_minor(i64::MAX - 20)).await?;
        assert_eq!(balance, Amount::from_minor(i64::MAX));
        Ok(())
    }

    #[tokio::test]
    async fn test_roles_default_and_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_role(&db, "nobody").await?, Role::User);

        // Upsert creates the row when missing
        set_role(&db, "carol", Role::Partner).await?;
        assert_eq!(get_role(&db, "carol").await?, Role::Partner);

        // ...and only touches the role for existing users
        create_funded_user(&db, "dave", Amount::from_major(7)).await?;
        set_role(&db, "dave", Role::Partner).await?;
        assert_eq!(get_role(&db, "dave").await?, Role::Partner);
        assert_eq!(get_balance(&db, "dave").await?, Amount::from_major(7));
        Ok(())
    }
}
