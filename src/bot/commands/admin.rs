//! Operator commands - granting the partner role and crediting balances.
//!
//! Only the user configured through `ADMIN_USER_ID` may run these.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::ensure_admin},
        core::{ledger, money::Amount, user},
        entities::user::Role,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    /// Grants a user the partner role (operator only).
    #[poise::command(slash_command)]
    pub async fn add_partner(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to promote"] member: serenity::User,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }

        let target_id = member.id.to_string();
        ledger::set_role(&ctx.data().database, &target_id, Role::Partner).await?;
        info!("{} granted partner role to {target_id}", ctx.author().id);
        ctx.say(format!("✅ {} is now a partner.", member.name))
            .await?;
        Ok(())
    }

    /// Credits a user's balance (operator only).
    #[poise::command(slash_command)]
    pub async fn credit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to credit"] member: serenity::User,
        #[description = "Amount, e.g. 12.50"] amount: String,
    ) -> Result<()> {
        if !ensure_admin(ctx).await? {
            return Ok(());
        }

        let data = ctx.data();
        let amount: Amount = match amount.parse() {
            Ok(a) => a,
            Err(_) => {
                ctx.say(format!("❌ `{amount}` is not a valid amount."))
                    .await?;
                return Ok(());
            }
        };

        let target_id = member.id.to_string();
        user::register_user(&data.database, &target_id, &member.name).await?;
        let new_balance = ledger::deposit(&data.database, &target_id, amount).await?;
        info!(
            "{} credited {amount} to {target_id}",
            ctx.author().id
        );
        ctx.say(format!(
            "✅ Credited {} to {}. New balance: {}",
            data.settings.format_amount(amount),
            member.name,
            data.settings.format_amount(new_balance)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
