//! General Discord commands - ping, help, info pages and flow cancellation.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Info pages available through `/info`.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum InfoTopic {
        #[name = "About us"]
        About,
        #[name = "Rules"]
        Rules,
        #[name = "Feedback"]
        Feedback,
    }

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**VedShop Help**\n\
        Here is a summary of all available commands.\n\n\
        **Account**\n\
        • `/start [referral]` - Registers you (optionally via an invitation code).\n\
        • `/balance` - Shows your balance.\n\
        • `/referral_link` - Shows your personal invitation link.\n\
        • `/referral_info` - Shows how many people you invited.\n\n\
        **Shop**\n\
        • `/products [page]` - Browses the catalogue.\n\
        • `/product <code>` - Shows a product by its code.\n\
        • `/buy <code>` - Buys a product.\n\
        • `/my_purchases` - Lists your purchases.\n\n\
        **Study**\n\
        • `/view_courses` - Lists courses.\n\
        • `/search_by_tag <tag>` - Finds courses by tag.\n\
        • `/view_lessons <course_id>` - Lists the lessons of a course.\n\
        • `/next_lesson <course_id>` - Shows your next lesson.\n\
        • `/complete_lesson <lesson_id>` - Takes the lesson test.\n\
        • `/my_progress` - Shows your progress.\n\
        • `/ask_master <course_id> <question>` - Asks the course author.\n\n\
        **Partners**\n\
        • `/partners` - Lists our partners.\n\
        • `/become_partner` - Submits your partner profile.\n\
        • `/add_product`, `/add_course`, `/add_lesson`, `/add_question`, `/view_questions` - Publishing.\n\
        • `/add_tags`, `/edit_lesson`, `/delete_lesson`, `/delete_course` - Course upkeep.\n\
        • `/inquiries`, `/answer_question` - Student questions.\n\n\
        **Utility**\n\
        • `/info <topic>` - About us, rules and feedback.\n\
        • `/cancel` - Cancels the current dialogue.\n\
        • `/ping` - Checks if the bot is responsive.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows one of the static info pages.
    #[poise::command(slash_command)]
    pub async fn info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Which page to show"] topic: InfoTopic,
    ) -> Result<()> {
        let pages = &ctx.data().settings.info;
        let text = match topic {
            InfoTopic::About => &pages.about,
            InfoTopic::Rules => &pages.rules,
            InfoTopic::Feedback => &pages.feedback,
        };
        ctx.say(text.clone()).await?;
        Ok(())
    }

    /// Cancels the dialogue in progress without saving anything.
    #[poise::command(slash_command)]
    pub async fn cancel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        if ctx.data().engine.cancel_flow(&user_id).await {
            ctx.say("Cancelled. Nothing was saved.").await?;
        } else {
            ctx.say("There is nothing to cancel.").await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
