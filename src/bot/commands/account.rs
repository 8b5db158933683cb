//! Account Discord commands - registration, balance and referrals.
//!
//! `/start` registers the caller and, for first-time users only, honours a
//! referral code by crediting the referrer.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{
            ledger::{self, ReferralOutcome},
            user,
        },
        errors::{Error, Result},
    };
    use tracing::debug;

    const NOT_REGISTERED: &str = "❌ You are not registered yet. Please run `/start` first.";

    /// Registers you with the shop.
    #[poise::command(slash_command)]
    pub async fn start(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Invitation code, e.g. ref123"] referral: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let db = &data.database;
        let user_id = ctx.author().id.to_string();
        let registration = user::register_user(db, &user_id, &ctx.author().name).await?;

        let mut lines = vec![format!(
            "Welcome, {}! Browse the catalogue with `/products` or see `/help` for everything else.",
            ctx.author().name
        )];

        match referral.as_deref() {
            Some(code) if registration.is_new => match user::parse_referral_code(code) {
                Ok(referrer_id) => {
                    match ledger::register_referral(
                        db,
                        &referrer_id,
                        &user_id,
                        data.settings.referral_bonus,
                    )
                    .await
                    {
                        Ok(ReferralOutcome::Registered { .. }) => {
                            lines.push("🎉 You joined through an invitation. Thank you!".to_string());
                        }
                        Ok(ReferralOutcome::AlreadyReferred) => {}
                        Err(Error::SelfReferral) => {
                            lines.push("❌ You cannot use your own invitation link.".to_string());
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(Error::InvalidReferralCode { .. }) => {
                    lines.push("❌ That invitation code is not valid.".to_string());
                }
                Err(e) => return Err(e),
            },
            Some(_) => debug!("Ignoring referral code from returning user {user_id}"),
            None => {}
        }

        ctx.say(lines.join("\n")).await?;
        Ok(())
    }

    /// Shows your current balance.
    #[poise::command(slash_command)]
    pub async fn balance(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();

        if user::get_user(&data.database, &user_id).await?.is_none() {
            ctx.say(NOT_REGISTERED).await?;
            return Ok(());
        }

        let balance = ledger::get_balance(&data.database, &user_id).await?;
        ctx.say(format!(
            "💰 Your balance: **{}**",
            data.settings.format_amount(balance)
        ))
        .await?;
        Ok(())
    }

    /// Shows your personal invitation link.
    #[poise::command(slash_command)]
    pub async fn referral_link(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();

        match user::referral_link(&data.database, &user_id, &data.settings.referral_link_base).await
        {
            Ok(link) => {
                ctx.say(format!(
                    "Your invitation link:\n{link}\n\nYou receive {} for every new user who joins through it.",
                    data.settings.format_amount(data.settings.referral_bonus)
                ))
                .await?;
            }
            Err(Error::UserNotFound { .. }) => {
                ctx.say(NOT_REGISTERED).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Shows how many people you invited and what you earned.
    #[poise::command(slash_command)]
    pub async fn referral_info(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let stats = user::referral_stats(&data.database, &user_id).await?;

        ctx.say(format!(
            "👥 Invited users: **{}**\n💰 Earned: **{}**",
            stats.invited,
            data.settings.format_amount(stats.earned)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
