//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `VedShop`, including all slash
//! commands, message and button handlers, and bot context management.

/// Discord command implementations (account, shop, study, mentor, partner, admin, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, events, rendering)
pub mod handlers;
/// Message views shared by commands and handlers
pub mod views;

use crate::{
    config::{admin, settings::Settings},
    errors::{Error, Result},
    flow::{FlowConfig, FlowEngine},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the flow engine and the
/// settings that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Guided dialogues in progress
    pub engine: FlowEngine,
    /// Shop settings from config.toml
    pub settings: Arc<Settings>,
    /// Operator identity, if configured
    pub admin_id: Option<String>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    /// This is typically called during bot initialization to set up the
    /// shared context for all commands.
    #[must_use]
    pub fn new(database: DatabaseConnection, settings: Settings, admin_id: Option<String>) -> Self {
        let engine = FlowEngine::new(FlowConfig::from_settings(&settings));
        Self {
            database,
            engine,
            settings: Arc::new(settings),
            admin_id,
        }
    }

    /// Whether `user_id` is the configured operator.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        admin::is_admin(self.admin_id.as_deref(), user_id)
    }
}

/// Every slash command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::start(),
        commands::help(),
        commands::ping(),
        commands::info(),
        commands::cancel(),
        commands::balance(),
        commands::referral_link(),
        commands::referral_info(),
        commands::products(),
        commands::product(),
        commands::buy(),
        commands::my_purchases(),
        commands::add_product(),
        commands::add_course(),
        commands::add_lesson(),
        commands::add_question(),
        commands::view_courses(),
        commands::view_lessons(),
        commands::view_questions(),
        commands::next_lesson(),
        commands::complete_lesson(),
        commands::my_progress(),
        commands::add_tags(),
        commands::search_by_tag(),
        commands::delete_course(),
        commands::edit_lesson(),
        commands::delete_lesson(),
        commands::ask_master(),
        commands::answer_question(),
        commands::inquiries(),
        commands::partners(),
        commands::become_partner(),
        commands::add_partner(),
        commands::credit(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let message = if error.is_user_facing() {
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                "❌ Something went wrong. Please try again later.".to_string()
            };
            if let Err(e) = ctx.say(message).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                "Error while handling event {}: {error:?}",
                event.snake_case_name()
            );
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Connects to Discord and runs until the gateway connection ends.
///
/// # Errors
/// Returns an error if the client cannot be built or the connection fails.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands", framework.options().commands.len());
                Ok(data)
            })
        })
        .build();

    // Free-text flow answers arrive as plain messages
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}
