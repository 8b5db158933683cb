//! Gateway event routing for non-command traffic.
//!
//! Plain messages feed the author's active flow (and are ignored otherwise);
//! button presses are decoded with [`views::parse_custom_id`] and dispatched to
//! the flow engine, the catalogue, or the ledger.

use crate::{
    bot::{BotData, handlers::render, views},
    core::{ledger, product},
    errors::{Error, Result},
    flow::{Input, Reply},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Entry point registered as the framework's event handler.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            handle_message(ctx, new_message, data).await
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => handle_component(ctx, component, data).await,
        _ => Ok(()),
    }
}

/// Picks the flow input carried by a message: an image attachment wins over text.
fn message_input(message: &serenity::Message) -> Input {
    message
        .attachments
        .iter()
        .find(|a| {
            a.content_type
                .as_deref()
                .is_some_and(|kind| kind.starts_with("image/"))
        })
        .map_or_else(
            || Input::Text(message.content.clone()),
            |image| Input::Photo(image.url.clone()),
        )
}

async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &BotData,
) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }

    let user_id = message.author.id.to_string();
    let outcome = match data
        .engine
        .handle_input(&data.database, &user_id, message_input(message))
        .await
    {
        Ok(outcome) => outcome,
        Err(Error::NoActiveSession { .. }) => return Ok(()),
        Err(e) => return Err(e),
    };

    let reply = views::flow_reply(outcome.into_reply());
    message
        .channel_id
        .send_message(&ctx.http, render::create_message(&reply))
        .await?;
    Ok(())
}

async fn respond(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    response: serenity::CreateInteractionResponse,
) -> Result<()> {
    component.create_response(&ctx.http, response).await?;
    Ok(())
}

async fn respond_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    text: String,
) -> Result<()> {
    respond(
        ctx,
        component,
        serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .ephemeral(true),
        ),
    )
    .await
}

async fn handle_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(action) = views::parse_custom_id(&component.data.custom_id) else {
        warn!("Unknown component id {}", component.data.custom_id);
        return Ok(());
    };
    let user_id = component.user.id.to_string();
    debug!("User {user_id} pressed {action:?}");

    match action {
        views::Action::Flow(payload) => {
            let outcome = data
                .engine
                .handle_input(&data.database, &user_id, Input::Choice(payload))
                .await;
            let reply = match outcome {
                Ok(outcome) => views::flow_reply(outcome.into_reply()),
                Err(Error::NoActiveSession { .. }) => {
                    return respond_ephemeral(
                        ctx,
                        component,
                        "This dialogue has already ended.".to_string(),
                    )
                    .await;
                }
                Err(e) => return Err(e),
            };
            respond(
                ctx,
                component,
                serenity::CreateInteractionResponse::Message(render::interaction_message(&reply)),
            )
            .await
        }
        views::Action::Page(page) => {
            let page = product::list_visible_products(&data.database, page).await?;
            let reply = views::catalogue_page(&page, &data.settings);
            respond(
                ctx,
                component,
                serenity::CreateInteractionResponse::UpdateMessage(render::interaction_message(
                    &reply,
                )),
            )
            .await
        }
        views::Action::Product(product_id) => {
            let reply = match product::get_product_by_id(&data.database, product_id).await? {
                Some(found) => views::product_card(&found, &data.settings),
                None => Reply::text("❌ This product does not exist."),
            };
            respond(
                ctx,
                component,
                serenity::CreateInteractionResponse::Message(
                    render::interaction_message(&reply).ephemeral(true),
                ),
            )
            .await
        }
        views::Action::Buy(product_id) => {
            let result = ledger::purchase(&data.database, &user_id, product_id).await;
            let text = views::purchase_outcome(result, &data.settings)?;
            respond_ephemeral(ctx, component, text).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Button, Outcome};

    #[test]
    fn test_outcome_replies_are_routed_back_to_flow() {
        let outcome = Outcome::Advanced(
            Reply::text("Pick").with_buttons([Button::new("Yes", "yes")]),
        );
        let reply = views::flow_reply(outcome.into_reply());
        assert_eq!(
            views::parse_custom_id(&reply.buttons[0].payload),
            Some(views::Action::Flow("yes".to_string()))
        );
    }
}
