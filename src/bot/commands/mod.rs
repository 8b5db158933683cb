//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Registration, balance and referral commands
pub mod account;

/// Operator commands
pub mod admin;

/// General utility commands
pub mod general;

/// Partner directory commands
pub mod partner;

/// Catalogue and purchase commands
pub mod shop;

/// Questions from students to course authors
pub mod mentor;

/// Course, lesson and question commands
pub mod study;

// Export commands
pub use account::*;
pub use admin::*;
pub use general::*;
pub use mentor::*;
pub use partner::*;
pub use shop::*;
pub use study::*;

use crate::{
    bot::{BotData, handlers::render, views},
    core::ledger,
    errors::{Error, Result},
    flow::{FlowKind, Reply},
};
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Sends a [`Reply`] as the command response.
pub(crate) async fn send_reply(ctx: poise::Context<'_, BotData, Error>, reply: &Reply) -> Result<()> {
    ctx.send(render::create_reply(reply)).await?;
    Ok(())
}

/// Starts a guided flow for the invoking user and sends its first prompt.
pub(crate) async fn begin_flow(ctx: poise::Context<'_, BotData, Error>, kind: FlowKind) -> Result<()> {
    let user_id = ctx.author().id.to_string();
    match ctx.data().engine.start_flow(&user_id, kind).await {
        Ok(reply) => send_reply(ctx, &views::flow_reply(reply)).await,
        Err(Error::Validation { message }) => {
            ctx.say(format!("❌ {message}")).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Whether an error refuses the request itself (bad input, unknown record,
/// someone else's record) and should be answered in place.
pub(crate) const fn is_refusal(error: &Error) -> bool {
    matches!(
        error,
        Error::Validation { .. } | Error::NotFound { .. } | Error::Unauthorized { .. }
    )
}

/// Checks that the invoking user may publish products and courses.
/// Replies with an explanation and returns `false` otherwise.
pub(crate) async fn ensure_publisher(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
    let user_id = ctx.author().id.to_string();
    let data = ctx.data();
    if data.is_admin(&user_id) || ledger::get_role(&data.database, &user_id).await?.can_publish() {
        return Ok(true);
    }
    let refusal = Error::Unauthorized {
        message: "this command is only available to partners".to_string(),
    };
    ctx.say(format!("❌ {refusal}. See `/become_partner`.")).await?;
    Ok(false)
}

/// Checks that the invoking user is the operator.
/// Replies with an explanation and returns `false` otherwise.
pub(crate) async fn ensure_admin(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
    let user_id = ctx.author().id.to_string();
    if ctx.data().is_admin(&user_id) {
        return Ok(true);
    }
    warn!(
        "User {user_id} tried operator command `{}`",
        ctx.command().name
    );
    let refusal = Error::Unauthorized {
        message: format!("`/{}` is reserved for the operator", ctx.command().name),
    };
    ctx.say(format!("❌ {refusal}")).await?;
    Ok(false)
}

/// Sends a direct message to a user by chat ID.
///
/// Returns `false` (and logs) when the ID is not a Discord user ID or the
/// message cannot be delivered, e.g. because the user blocks DMs.
pub(crate) async fn notify_user(
    ctx: poise::Context<'_, BotData, Error>,
    user_id: &str,
    text: String,
) -> bool {
    let Some(id) = user_id.parse::<u64>().ok().filter(|id| *id != 0) else {
        warn!("Cannot message {user_id}: not a Discord user ID");
        return false;
    };
    let channel = match serenity::UserId::new(id).create_dm_channel(ctx.http()).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("Cannot open DM with user {user_id}: {e}");
            return false;
        }
    };
    if let Err(e) = channel
        .send_message(ctx.http(), serenity::CreateMessage::new().content(text))
        .await
    {
        warn!("Failed to message user {user_id}: {e}");
        return false;
    }
    true
}
