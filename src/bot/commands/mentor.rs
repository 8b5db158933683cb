//! Mentor commands - students asking course authors, authors answering.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{ensure_publisher, is_refusal, notify_user},
        },
        core::{course, inquiry},
        errors::{Error, Result},
    };

    /// Asks the author of a course a question.
    #[poise::command(slash_command)]
    pub async fn ask_master(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Course ID from /view_courses"] course_id: i64,
        #[description = "Your question"] question: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();
        let asked = match inquiry::ask_partner(db, &user_id, course_id, &question).await {
            Ok(asked) => asked,
            Err(e) if is_refusal(&e) => {
                ctx.say(format!("❌ {e}")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let title = course::get_course(db, course_id)
            .await?
            .map_or_else(|| format!("course {course_id}"), |c| c.title);
        let delivered = notify_user(
            ctx,
            &asked.partner_id,
            format!(
                "❓ Question #{} about **{title}** from {}:\n{}\n\nReply with `/answer_question {} <answer>`.",
                asked.id,
                ctx.author().name,
                asked.text,
                asked.id
            ),
        )
        .await;

        if delivered {
            ctx.say("✉️ Your question was sent to the course author.")
                .await?;
        } else {
            ctx.say("✉️ Your question was saved. The author will see it in `/inquiries`.")
                .await?;
        }
        Ok(())
    }

    /// Answers a question a student asked about one of your courses.
    #[poise::command(slash_command)]
    pub async fn answer_question(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Question number from /inquiries"] inquiry_id: i64,
        #[description = "Your answer"] answer: String,
    ) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let answered =
            match inquiry::answer_inquiry(&ctx.data().database, &user_id, inquiry_id, &answer).await
            {
                Ok(answered) => answered,
                Err(e) if is_refusal(&e) => {
                    ctx.say(format!("❌ {e}")).await?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

        let delivered = notify_user(
            ctx,
            &answered.asker_id,
            format!(
                "💬 Answer to your question \"{}\":\n{}",
                answered.text,
                answered.answer.as_deref().unwrap_or_default()
            ),
        )
        .await;

        if delivered {
            ctx.say("✅ Your answer was delivered.").await?;
        } else {
            ctx.say("✅ Answer saved, but the student could not be messaged.")
                .await?;
        }
        Ok(())
    }

    /// Lists the unanswered questions about your courses (partners only).
    #[poise::command(slash_command)]
    pub async fn inquiries(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let open = inquiry::open_inquiries(&ctx.data().database, &user_id).await?;
        if open.is_empty() {
            ctx.say("No open questions.").await?;
            return Ok(());
        }

        let lines = open
            .iter()
            .map(|q| format!("• #{} (course {}): {}", q.id, q.course_id, q.text))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.say(format!("**Open questions**\n{lines}")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
