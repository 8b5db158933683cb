//! Partner directory commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::begin_flow},
        core::{partner, user},
        errors::{Error, Result},
        flow::FlowKind,
    };

    /// Lists our partners.
    #[poise::command(slash_command)]
    pub async fn partners(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let profiles = partner::visible_partners(&ctx.data().database).await?;
        if profiles.is_empty() {
            ctx.say("We have no partners listed yet.").await?;
            return Ok(());
        }

        let body = profiles
            .iter()
            .map(|p| {
                let logo = p
                    .logo_url
                    .as_deref()
                    .map_or_else(String::new, |url| format!("\n{url}"));
                format!("**{}**\n{}{logo}", p.name, p.credo)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        ctx.say(format!("🤝 **Our partners**\n\n{body}")).await?;
        Ok(())
    }

    /// Submits your partner profile through a guided dialogue.
    #[poise::command(slash_command)]
    pub async fn become_partner(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        if user::get_user(&ctx.data().database, &user_id).await?.is_none() {
            ctx.say("❌ Please run `/start` first.").await?;
            return Ok(());
        }
        begin_flow(ctx, FlowKind::BecomePartner).await
    }
}

// Re-export all commands
pub use inner::*;
