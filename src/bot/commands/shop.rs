//! Shop Discord commands - catalogue browsing, purchases and product creation.
//!
//! This module contains the commands customers use to find and buy products,
//! and the `/add_product` entry point of the guided product flow.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{begin_flow, ensure_publisher, send_reply},
            handlers::autocomplete,
            views,
        },
        core::{ledger, money::Amount, product as catalogue},
        errors::{Error, Result},
        flow::FlowKind,
    };

    /// Browses the product catalogue.
    #[poise::command(slash_command)]
    pub async fn products(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Page number (defaults to 1)"]
        #[min = 1]
        page: Option<u64>,
    ) -> Result<()> {
        let data = ctx.data();
        let page = catalogue::list_visible_products(&data.database, page.unwrap_or(1)).await?;
        send_reply(ctx, &views::catalogue_page(&page, &data.settings)).await
    }

    /// Shows a product by its code.
    #[poise::command(slash_command)]
    pub async fn product(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product code, e.g. PRD-1A2B3C4D"]
        #[autocomplete = "autocomplete::autocomplete_product_code"]
        code: String,
    ) -> Result<()> {
        let data = ctx.data();
        let Some(found) = catalogue::get_product_by_code(&data.database, &code).await? else {
            ctx.say(format!("❌ No product with code `{}`.", code.trim()))
                .await?;
            return Ok(());
        };
        send_reply(ctx, &views::product_card(&found, &data.settings)).await
    }

    /// Buys a product with your balance.
    #[poise::command(slash_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product code, e.g. PRD-1A2B3C4D"]
        #[autocomplete = "autocomplete::autocomplete_product_code"]
        code: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();

        let Some(found) = catalogue::get_product_by_code(&data.database, &code).await? else {
            ctx.say(format!("❌ No product with code `{}`.", code.trim()))
                .await?;
            return Ok(());
        };

        let result = ledger::purchase(&data.database, &user_id, found.id).await;
        let message = views::purchase_outcome(result, &data.settings)?;
        ctx.say(message).await?;
        Ok(())
    }

    /// Lists everything you have bought.
    #[poise::command(slash_command)]
    pub async fn my_purchases(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let history = catalogue::purchases_for_user(&data.database, &user_id).await?;

        if history.is_empty() {
            ctx.say("You have not bought anything yet.").await?;
            return Ok(());
        }

        let lines = history
            .iter()
            .map(|(purchase, bought)| {
                let name = bought
                    .as_ref()
                    .map_or("(removed product)", |p| p.name.as_str());
                format!(
                    "• **{name}** - {} on {}",
                    data.settings.format_amount(Amount::from_minor(purchase.amount)),
                    purchase.purchased_at.format("%Y-%m-%d")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        ctx.say(format!("**Your purchases**\n{lines}")).await?;
        Ok(())
    }

    /// Adds a new product through a guided dialogue (partners only).
    #[poise::command(slash_command)]
    pub async fn add_product(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        begin_flow(ctx, FlowKind::AddProduct).await
    }
}

// Re-export all commands
pub use inner::*;
