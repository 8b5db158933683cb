//! User business logic - Registration, referral links and referral statistics.
//!
//! Users are keyed by their chat platform ID. Registration is idempotent:
//! running `/start` again returns the existing row and reports that the user
//! is not new, which is what keeps referral bonuses one-per-invitee.

use crate::{
    core::money::Amount,
    entities::{Referral, Role, User, referral, user},
    errors::{Error, Result},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Prefix of referral codes passed as the `/start` argument
pub const REFERRAL_PREFIX: &str = "ref";

/// Result of [`register_user`].
#[derive(Debug, Clone)]
pub struct Registration {
    /// The stored user
    pub user: user::Model,
    /// `true` if this call created the user
    pub is_new: bool,
}

/// Referral statistics for one referrer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralStats {
    /// Number of users invited
    pub invited: u64,
    /// Sum of bonuses credited for them
    pub earned: Amount,
}

/// Registers a user, or returns the existing record.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn register_user(
    db: &DatabaseConnection,
    user_id: &str,
    username: &str,
) -> Result<Registration> {
    let row = user::ActiveModel {
        user_id: Set(user_id.to_string()),
        username: Set(username.to_string()),
        balance: Set(0),
        role: Set(Role::User),
        referral_link: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let inserted = User::insert(row)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let user = get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })?;

    let is_new = inserted > 0;
    if is_new {
        info!("Registered new user {user_id} ({username})");
    }
    Ok(Registration { user, is_new })
}

/// Finds a user by chat ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user(db: &DatabaseConnection, user_id: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Builds the referral code of a user, e.g. `ref123`.
#[must_use]
pub fn referral_code(user_id: &str) -> String {
    format!("{REFERRAL_PREFIX}{user_id}")
}

/// Extracts the referrer ID from a `/start` argument such as `ref123`.
///
/// # Errors
/// Returns `InvalidReferralCode` unless the argument is the prefix followed by
/// a numeric chat ID.
pub fn parse_referral_code(argument: &str) -> Result<String> {
    let trimmed = argument.trim();
    trimmed
        .strip_prefix(REFERRAL_PREFIX)
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(ToString::to_string)
        .ok_or_else(|| Error::InvalidReferralCode {
            code: trimmed.to_string(),
        })
}

/// Returns the user's referral link, generating and storing it on first use.
///
/// # Errors
/// Returns `UserNotFound` if the user never registered, or a database error.
pub async fn referral_link(db: &DatabaseConnection, user_id: &str, base: &str) -> Result<String> {
    let user = get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })?;

    if let Some(link) = user.referral_link {
        return Ok(link);
    }

    let link = format!("{base}{}", referral_code(user_id));
    let mut active: user::ActiveModel = user.into();
    active.referral_link = Set(Some(link.clone()));
    active.update(db).await?;

    info!("Generated referral link for {user_id}");
    Ok(link)
}

/// Counts a referrer's invitees and the bonuses earned from them.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn referral_stats(db: &DatabaseConnection, referrer_id: &str) -> Result<ReferralStats> {
    let referrals = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .all(db)
        .await?;

    let invited = referrals.len() as u64;
    let earned = referrals
        .iter()
        .try_fold(Amount::ZERO, |sum, r| {
            sum.checked_add(Amount::from_minor(r.bonus))
        })
        .ok_or_else(|| Error::InvalidAmount {
            input: format!("referral earnings of {referrer_id}"),
        })?;

    Ok(ReferralStats { invited, earned })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_user_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;

        let first = register_user(&db, "100", "alice").await?;
        assert!(first.is_new);
        assert_eq!(first.user.balance, 0);
        assert_eq!(first.user.role, Role::User);

        let second = register_user(&db, "100", "alice-renamed").await?;
        assert!(!second.is_new);
        assert_eq!(second.user.id, first.user.id);
        assert_eq!(second.user.username, "alice");
        Ok(())
    }

    #[test]
    fn test_parse_referral_code() {
        assert_eq!(parse_referral_code("ref123").unwrap(), "123");
        assert_eq!(parse_referral_code(" ref42 ").unwrap(), "42");
        for bad in ["", "ref", "123", "refabc", "xref1", "ref1 2"] {
            assert!(
                matches!(
                    parse_referral_code(bad),
                    Err(Error::InvalidReferralCode { .. })
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_referral_link_is_stable() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, "100", "alice").await?;

        let link = referral_link(&db, "100", "https://example.com/?start=").await?;
        assert_eq!(link, "https://example.com/?start=ref100");

        // A different base later does not change the stored link
        let again = referral_link(&db, "100", "https://other.example/").await?;
        assert_eq!(again, link);

        let stored = get_user(&db, "100").await?.unwrap();
        assert_eq!(stored.referral_link.as_deref(), Some(link.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_referral_link_requires_registration() -> Result<()> {
        let db = setup_test_db().await?;
        let result = referral_link(&db, "404", "https://example.com/").await;
        assert!(matches!(result, Err(Error::UserNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_referral_stats() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, "1", "referrer").await?;
        register_user(&db, "2", "first").await?;
        register_user(&db, "3", "second").await?;

        let bonus = Amount::from_major(10);
        ledger::register_referral(&db, "1", "2", bonus).await?;
        ledger::register_referral(&db, "1", "3", bonus).await?;

        let stats = referral_stats(&db, "1").await?;
        assert_eq!(stats.invited, 2);
        assert_eq!(stats.earned, Amount::from_major(20));

        let none = referral_stats(&db, "2").await?;
        assert_eq!(none.invited, 0);
        assert_eq!(none.earned, Amount::ZERO);
        Ok(())
    }
}
