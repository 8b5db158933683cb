//! Course Discord commands - publishing courses, lessons and questions, and
//! following them as a student.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{begin_flow, ensure_publisher, is_refusal},
            views,
        },
        core::course,
        errors::{Error, Result},
        flow::{Choice, FlowKind, QuizQuestion},
    };

    /// Creates a course through a guided dialogue (partners only).
    #[poise::command(slash_command)]
    pub async fn add_course(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        begin_flow(ctx, FlowKind::AddCourse).await
    }

    /// Adds a lesson to one of your courses (partners only).
    #[poise::command(slash_command)]
    pub async fn add_lesson(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let courses = course::courses_by_partner(&ctx.data().database, &user_id)
            .await?
            .into_iter()
            .map(|c| Choice {
                id: c.id,
                label: c.title,
            })
            .collect::<Vec<_>>();

        if courses.is_empty() {
            ctx.say("You have no courses yet. Create one with `/add_course` first.")
                .await?;
            return Ok(());
        }
        begin_flow(ctx, FlowKind::AddLesson { courses }).await
    }

    /// Adds test questions to one of your lessons (partners only).
    #[poise::command(slash_command)]
    pub async fn add_question(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let lessons = course::lessons_for_partner(&ctx.data().database, &user_id)
            .await?
            .into_iter()
            .map(|l| Choice {
                id: l.id,
                label: l.title,
            })
            .collect::<Vec<_>>();

        if lessons.is_empty() {
            ctx.say("You have no lessons yet. Add one with `/add_lesson` first.")
                .await?;
            return Ok(());
        }
        begin_flow(ctx, FlowKind::AddQuestion { lessons }).await
    }

    /// Lists all courses.
    #[poise::command(slash_command)]
    pub async fn view_courses(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let courses = course::all_courses(&ctx.data().database).await?;
        if courses.is_empty() {
            ctx.say("No courses have been published yet.").await?;
            return Ok(());
        }
        ctx.say(format!("**Courses**\n{}", views::course_list(&courses)))
            .await?;
        Ok(())
    }

    /// Lists the lessons of a course.
    #[poise::command(slash_command)]
    pub async fn view_lessons(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Course ID from /view_courses"] course_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let Some(found) = course::get_course(db, course_id).await? else {
            ctx.say(format!("❌ No course with ID {course_id}.")).await?;
            return Ok(());
        };

        let lessons = course::lessons_for_course(db, course_id).await?;
        if lessons.is_empty() {
            ctx.say(format!("**{}** has no lessons yet.", found.title))
                .await?;
            return Ok(());
        }

        let body = lessons
            .iter()
            .map(views::lesson_details)
            .collect::<Vec<_>>()
            .join("\n\n");
        ctx.say(format!("**{}**\n\n{body}", found.title)).await?;
        Ok(())
    }

    /// Lists the questions of your lessons (partners only).
    #[poise::command(slash_command)]
    pub async fn view_questions(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let questions = course::questions_for_partner(&ctx.data().database, &user_id).await?;
        if questions.is_empty() {
            ctx.say("Your lessons have no questions yet.").await?;
            return Ok(());
        }

        let body = questions
            .iter()
            .map(views::question_details)
            .collect::<Vec<_>>()
            .join("\n\n");
        ctx.say(body).await?;
        Ok(())
    }

    /// Tags one of your courses so students can find it (partners only).
    #[poise::command(slash_command)]
    pub async fn add_tags(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Course ID from /view_courses"] course_id: i64,
        #[description = "Comma-separated tags, e.g. yoga, breathing"] tags: String,
    ) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        match course::set_course_tags(&ctx.data().database, &user_id, course_id, &tags).await {
            Ok(stored) => {
                let shown = stored
                    .iter()
                    .map(|t| format!("#{t}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                ctx.say(format!("🏷️ Course {course_id} tagged: {shown}"))
                    .await?;
            }
            Err(e) if is_refusal(&e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Finds courses by tag.
    #[poise::command(slash_command)]
    pub async fn search_by_tag(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tag to look for"] tag: String,
    ) -> Result<()> {
        let found = course::courses_by_tag(&ctx.data().database, &tag).await?;
        if found.is_empty() {
            ctx.say(format!("No courses tagged `{}`.", tag.trim()))
                .await?;
            return Ok(());
        }
        ctx.say(format!("**Courses tagged {}**\n{}", tag.trim(), views::course_list(&found)))
            .await?;
        Ok(())
    }

    /// Deletes one of your courses with all its lessons (partners only).
    #[poise::command(slash_command)]
    pub async fn delete_course(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Course ID from /view_courses"] course_id: i64,
    ) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        match course::delete_course(&ctx.data().database, &user_id, course_id).await {
            Ok(deleted) => {
                ctx.say(format!("🗑️ Course **{}** deleted.", deleted.title))
                    .await?;
            }
            Err(e) if is_refusal(&e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Renames a lesson of yours and optionally replaces its description.
    #[poise::command(slash_command)]
    pub async fn edit_lesson(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Lesson ID from /view_lessons"] lesson_id: i64,
        #[description = "New title"] title: String,
        #[description = "New description"] description: Option<String>,
    ) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        let db = &ctx.data().database;
        match course::update_lesson(db, &user_id, lesson_id, &title, description.as_deref()).await
        {
            Ok(lesson) => {
                ctx.say(format!("✏️ Lesson updated:\n{}", views::lesson_details(&lesson)))
                    .await?;
            }
            Err(e) if is_refusal(&e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Deletes a lesson of yours with its questions (partners only).
    #[poise::command(slash_command)]
    pub async fn delete_lesson(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Lesson ID from /view_lessons"] lesson_id: i64,
    ) -> Result<()> {
        if !ensure_publisher(ctx).await? {
            return Ok(());
        }
        let user_id = ctx.author().id.to_string();
        match course::delete_lesson(&ctx.data().database, &user_id, lesson_id).await {
            Ok(deleted) => {
                ctx.say(format!("🗑️ Lesson **{}** deleted.", deleted.title))
                    .await?;
            }
            Err(e) if is_refusal(&e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Shows the next lesson you have not completed in a course.
    #[poise::command(slash_command)]
    pub async fn next_lesson(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Course ID from /view_courses"] course_id: i64,
    ) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        match course::next_lesson(&ctx.data().database, &user_id, course_id).await? {
            Some(lesson) => {
                ctx.say(format!(
                    "📖 Your next lesson:\n{}\n\nWhen you are done, take its test with `/complete_lesson {}`.",
                    views::lesson_details(&lesson),
                    lesson.id
                ))
                .await?;
            }
            None => {
                ctx.say("🎓 You have completed every lesson of this course.")
                    .await?;
            }
        }
        Ok(())
    }

    /// Completes a lesson by passing its test.
    ///
    /// Lessons without questions are marked completed right away.
    #[poise::command(slash_command)]
    pub async fn complete_lesson(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Lesson ID"] lesson_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();
        if course::get_lesson(db, lesson_id).await?.is_none() {
            ctx.say(format!("❌ No lesson with ID {lesson_id}.")).await?;
            return Ok(());
        }

        let questions = course::questions_for_lesson(db, lesson_id)
            .await?
            .iter()
            .map(|q| QuizQuestion {
                text: q.text.clone(),
                options: q.option_list().into_iter().map(str::to_string).collect(),
                correct: usize::try_from(q.correct_option).unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        if !questions.is_empty() {
            return begin_flow(
                ctx,
                FlowKind::TakeLesson {
                    lesson_id,
                    questions,
                },
            )
            .await;
        }

        if course::mark_lesson_completed(db, &user_id, lesson_id).await? {
            ctx.say("✅ Lesson completed.").await?;
        } else {
            ctx.say("You already completed this lesson.").await?;
        }
        Ok(())
    }

    /// Shows your progress in every course.
    #[poise::command(slash_command)]
    pub async fn my_progress(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let progress = course::course_progress(&ctx.data().database, &user_id).await?;
        if progress.is_empty() {
            ctx.say("There are no courses with lessons yet.").await?;
            return Ok(());
        }

        let lines = progress
            .iter()
            .map(|p| {
                format!(
                    "• **{}** - {}/{} lessons",
                    p.course.title, p.completed, p.total
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        ctx.say(format!("**Your progress**\n{lines}")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
