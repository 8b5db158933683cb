//! Rendering of [`Reply`] values into Discord message builders.

use crate::flow::{Button, Reply};
use poise::serenity_prelude as serenity;

/// Discord limit: buttons per action row
const BUTTONS_PER_ROW: usize = 5;
/// Discord limit: action rows per message
const MAX_ROWS: usize = 5;
/// Discord limit: characters in a button label
const MAX_LABEL_CHARS: usize = 80;

fn label(text: &str) -> String {
    if text.chars().count() <= MAX_LABEL_CHARS {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(MAX_LABEL_CHARS - 1).collect();
    shortened.push('…');
    shortened
}

fn button(button: &Button) -> serenity::CreateButton {
    serenity::CreateButton::new(button.payload.clone())
        .label(label(&button.label))
        .style(serenity::ButtonStyle::Primary)
}

/// Lays buttons out in rows, dropping any beyond Discord's limits.
#[must_use]
pub fn action_rows(buttons: &[Button]) -> Vec<serenity::CreateActionRow> {
    buttons
        .chunks(BUTTONS_PER_ROW)
        .take(MAX_ROWS)
        .map(|row| serenity::CreateActionRow::Buttons(row.iter().map(button).collect()))
        .collect()
}

fn embeds(reply: &Reply) -> Vec<serenity::CreateEmbed> {
    reply
        .image
        .iter()
        .map(|url| serenity::CreateEmbed::new().image(url.clone()))
        .collect()
}

/// Reply to a slash command.
#[must_use]
pub fn create_reply(reply: &Reply) -> poise::CreateReply {
    let mut builder = poise::CreateReply::default()
        .content(reply.text.clone())
        .components(action_rows(&reply.buttons));
    for embed in embeds(reply) {
        builder = builder.embed(embed);
    }
    builder
}

/// Plain channel message, used to answer free-text flow input.
#[must_use]
pub fn create_message(reply: &Reply) -> serenity::CreateMessage {
    serenity::CreateMessage::new()
        .content(reply.text.clone())
        .components(action_rows(&reply.buttons))
        .embeds(embeds(reply))
}

/// Response to a button press.
#[must_use]
pub fn interaction_message(reply: &Reply) -> serenity::CreateInteractionResponseMessage {
    serenity::CreateInteractionResponseMessage::new()
        .content(reply.text.clone())
        .components(action_rows(&reply.buttons))
        .embeds(embeds(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_truncation() {
        assert_eq!(label("short"), "short");
        let long = "x".repeat(200);
        assert_eq!(label(&long).chars().count(), MAX_LABEL_CHARS);
    }

    #[test]
    fn test_action_rows_respect_limits() {
        let buttons: Vec<Button> = (0..40)
            .map(|i| Button::new(i.to_string(), i.to_string()))
            .collect();
        assert_eq!(action_rows(&buttons).len(), MAX_ROWS);
        assert_eq!(action_rows(&buttons[..6]).len(), 2);
        assert!(action_rows(&[]).is_empty());
    }
}
