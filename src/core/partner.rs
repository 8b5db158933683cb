//! Partner directory - Public profiles submitted through "become a partner".
//!
//! Submitting a profile does not grant the partner role; an operator still
//! promotes the user with `/add_partner`.

use crate::{
    entities::{PartnerProfile, partner_profile},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Stores a partner profile shown in the public partner list.
///
/// # Errors
/// Returns `Validation` for an empty name or credo, or a database error.
pub async fn add_partner_profile(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    credo: &str,
    logo_url: Option<String>,
) -> Result<partner_profile::Model> {
    if name.trim().is_empty() || credo.trim().is_empty() {
        return Err(Error::Validation {
            message: "Partner name and credo cannot be empty".to_string(),
        });
    }

    let profile = partner_profile::ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(name.trim().to_string()),
        credo: Set(credo.trim().to_string()),
        logo_url: Set(logo_url),
        show_in_list: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("User {user_id} submitted partner profile {}", profile.id);
    Ok(profile)
}

/// Lists the profiles flagged for the public list, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn visible_partners(db: &DatabaseConnection) -> Result<Vec<partner_profile::Model>> {
    PartnerProfile::find()
        .filter(partner_profile::Column::ShowInList.eq(true))
        .order_by_asc(partner_profile::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_and_list_partners() -> Result<()> {
        let db = setup_test_db().await?;

        let profile = add_partner_profile(&db, "7", " Studio ", "Breathe", None).await?;
        assert_eq!(profile.name, "Studio");
        assert!(profile.show_in_list);

        let listed = visible_partners(&db).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, "7");

        let result = add_partner_profile(&db, "7", "", "Breathe", None).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
