//! The conversation flow engine.
//!
//! Owns the session store, feeds inputs through [`transition`] and persists the
//! collected record through the core services when a flow commits. A failed
//! commit ends the session and reports a generic failure; the cause is logged.

use super::reply::Reply;
use super::session::{Field, FieldValue, Session, SessionStore};
use super::step::{Flow, FlowKind, Input, Step};
use super::transition::{FlowConfig, Transition, prompt, transition};
use crate::core::{course, partner, product};
use crate::errors::{Error, Result};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info};

const FAILURE_TEXT: &str = "❌ Something went wrong while saving. Please start again later.";

/// Result of feeding one input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Input invalid; same step, reply explains and re-prompts
    Rejected(Reply),
    /// Moved to the next step
    Advanced(Reply),
    /// A record was saved; the session ended or continues (question loop)
    Committed(Reply),
    /// Session ended without saving
    Finished(Reply),
    /// Saving failed; session ended
    Failed(Reply),
}

impl Outcome {
    /// The reply to send, whatever the outcome.
    #[must_use]
    pub const fn reply(&self) -> &Reply {
        match self {
            Self::Rejected(reply)
            | Self::Advanced(reply)
            | Self::Committed(reply)
            | Self::Finished(reply)
            | Self::Failed(reply) => reply,
        }
    }

    /// Consumes the outcome, returning its reply.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        match self {
            Self::Rejected(reply)
            | Self::Advanced(reply)
            | Self::Committed(reply)
            | Self::Finished(reply)
            | Self::Failed(reply) => reply,
        }
    }
}

fn missing(field: Field) -> Error {
    Error::Validation {
        message: format!("Flow finished without {field:?}"),
    }
}

/// Drives guided multi-step dialogues, one session per user.
#[derive(Debug)]
pub struct FlowEngine {
    sessions: SessionStore,
    config: FlowConfig,
}

impl FlowEngine {
    /// Creates an engine with no active sessions.
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self {
            sessions: SessionStore::new(),
            config,
        }
    }

    /// Starts `kind` for a user, replacing any session in progress, and
    /// returns the first prompt.
    ///
    /// # Errors
    /// Returns `Validation` if a selection flow is started with nothing to select.
    pub async fn start_flow(&self, user_id: &str, kind: FlowKind) -> Result<Reply> {
        let flow = kind.flow();
        let mut session = Session::new(user_id, flow);
        match kind {
            FlowKind::AddLesson { courses: choices } | FlowKind::AddQuestion { lessons: choices } => {
                if choices.is_empty() {
                    return Err(Error::Validation {
                        message: format!("There is nothing to choose from for {flow}."),
                    });
                }
                session.fields.set(Field::Choices, FieldValue::Choices(choices));
            }
            FlowKind::TakeLesson {
                lesson_id,
                questions,
            } => {
                if questions.is_empty() {
                    return Err(Error::Validation {
                        message: "This lesson has no test questions.".to_string(),
                    });
                }
                session.fields.set(Field::LessonId, FieldValue::Id(lesson_id));
                session.fields.set(Field::Quiz, FieldValue::Quiz(questions));
                session.fields.set(Field::QuizPosition, FieldValue::Index(0));
            }
            FlowKind::AddProduct | FlowKind::AddCourse | FlowKind::BecomePartner => {}
        }

        let reply = prompt(session.step, &session.fields, &self.config);
        let mut slot = self.sessions.lock(user_id).await;
        if let Some(previous) = slot.replace(session) {
            debug!(
                "User {user_id} abandoned {} at {:?}",
                previous.flow(),
                previous.step
            );
        }
        drop(slot);
        info!(
            "User {user_id} started flow {flow} ({} open sessions)",
            self.sessions.slot_count().await
        );
        Ok(reply)
    }

    /// Feeds one input to the user's active session.
    ///
    /// # Errors
    /// Returns `NoActiveSession` if the user has no flow in progress. Storage
    /// failures during a commit are reported as [`Outcome::Failed`], not as errors.
    pub async fn handle_input(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
        input: Input,
    ) -> Result<Outcome> {
        let outcome = self.feed(db, user_id, input).await;
        self.sessions.release(user_id).await;
        outcome
    }

    async fn feed(&self, db: &DatabaseConnection, user_id: &str, input: Input) -> Result<Outcome> {
        let no_session = || Error::NoActiveSession {
            user_id: user_id.to_string(),
        };
        let mut slot = self
            .sessions
            .lock_existing(user_id)
            .await
            .ok_or_else(no_session)?;
        let Some(session) = slot.as_mut() else {
            return Err(no_session());
        };

        match transition(session.step, &session.fields, &input, &self.config) {
            Transition::Reject { message } => {
                debug!("User {user_id} input rejected at {:?}", session.step);
                let reprompt = prompt(session.step, &session.fields, &self.config);
                Ok(Outcome::Rejected(reprompt.prefixed(&format!("❌ {message}"))))
            }
            Transition::Advance { next, updates } => {
                for (field, value) in updates {
                    session.fields.set(field, value);
                }
                session.step = next;
                Ok(Outcome::Advanced(prompt(next, &session.fields, &self.config)))
            }
            Transition::Commit {
                updates,
                then,
                reset,
            } => {
                for (field, value) in updates {
                    session.fields.set(field, value);
                }
                match self.complete_flow(db, session).await {
                    Ok(confirmation) => {
                        info!("User {user_id} completed {}", session.flow());
                        if let Some(next) = then {
                            for field in reset {
                                session.fields.remove(field);
                            }
                            session.step = next;
                            let next_prompt = prompt(next, &session.fields, &self.config);
                            Ok(Outcome::Committed(next_prompt.prefixed(&confirmation)))
                        } else {
                            slot.take();
                            Ok(Outcome::Committed(Reply::text(confirmation)))
                        }
                    }
                    Err(e) => {
                        error!("Failed to save {} for {user_id}: {e}", session.flow());
                        slot.take();
                        Ok(Outcome::Failed(Reply::text(FAILURE_TEXT)))
                    }
                }
            }
            Transition::Finish { message } => {
                slot.take();
                Ok(Outcome::Finished(Reply::text(message)))
            }
        }
    }

    /// Ends the user's session without saving. Returns whether one existed.
    pub async fn cancel_flow(&self, user_id: &str) -> bool {
        let Some(mut slot) = self.sessions.lock_existing(user_id).await else {
            return false;
        };
        let cancelled = slot.take();
        drop(slot);
        self.sessions.release(user_id).await;
        if let Some(session) = &cancelled {
            info!("User {user_id} cancelled {}", session.flow());
        }
        cancelled.is_some()
    }

    /// The step the user is currently at, if any.
    pub async fn current_step(&self, user_id: &str) -> Option<Step> {
        self.sessions.get(user_id).await.map(|s| s.step)
    }

    /// Copy of the user's session, if any.
    pub async fn session(&self, user_id: &str) -> Option<Session> {
        self.sessions.get(user_id).await
    }

    /// Writes the collected record and returns the confirmation text.
    async fn complete_flow(&self, db: &DatabaseConnection, session: &Session) -> Result<String> {
        let fields = &session.fields;
        let text = |field| fields.text(field).ok_or_else(|| missing(field));
        let id = |field| fields.id(field).ok_or_else(|| missing(field));

        match session.flow() {
            Flow::AddProduct => {
                let is_hidden = fields
                    .flag(Field::IsHidden)
                    .ok_or_else(|| missing(Field::IsHidden))?;
                let subscription_months = if fields.flag(Field::IsSubscription) == Some(true) {
                    Some(fields.months(Field::Period).ok_or_else(|| missing(Field::Period))?)
                } else {
                    None
                };
                let created = product::create_product(
                    db,
                    product::NewProduct {
                        name: text(Field::Name)?.to_string(),
                        description: text(Field::Description)?.to_string(),
                        price: fields
                            .amount(Field::Price)
                            .ok_or_else(|| missing(Field::Price))?,
                        subscription_months,
                        partner_id: session.user_id.clone(),
                        image_ref: fields.optional_text(Field::Image).map(ToString::to_string),
                        category: text(Field::Category)?.to_string(),
                        is_hidden,
                    },
                )
                .await?;
                let visibility = if created.is_hidden { "hidden" } else { "visible" };
                Ok(format!(
                    "✅ Product **{}** added ({visibility}).\nUnique product code: `{}`",
                    created.name, created.code
                ))
            }
            Flow::AddCourse => {
                let created = course::create_course(
                    db,
                    text(Field::Title)?,
                    text(Field::Description)?,
                    &session.user_id,
                )
                .await?;
                Ok(format!(
                    "✅ Course **{}** added (ID `{}`). Add lessons with `/add_lesson`.",
                    created.title, created.id
                ))
            }
            Flow::AddLesson => {
                let created = course::create_lesson(
                    db,
                    id(Field::CourseId)?,
                    text(Field::Title)?,
                    text(Field::Description)?,
                    fields.optional_text(Field::Material).map(ToString::to_string),
                )
                .await?;
                Ok(format!("✅ Lesson **{}** added to the course.", created.title))
            }
            Flow::AddQuestion => {
                course::create_question(
                    db,
                    id(Field::LessonId)?,
                    text(Field::QuestionText)?,
                    fields.list(Field::Options).ok_or_else(|| missing(Field::Options))?,
                    fields
                        .index(Field::CorrectOption)
                        .ok_or_else(|| missing(Field::CorrectOption))?,
                )
                .await?;
                Ok("✅ Question added.".to_string())
            }
            Flow::BecomePartner => {
                partner::add_partner_profile(
                    db,
                    &session.user_id,
                    text(Field::Name)?,
                    text(Field::Credo)?,
                    fields.optional_text(Field::Logo).map(ToString::to_string),
                )
                .await?;
                Ok("✅ Your details were added to the partner list.".to_string())
            }
            Flow::TakeLesson => {
                let lesson_id = id(Field::LessonId)?;
                course::mark_lesson_completed(db, &session.user_id, lesson_id).await?;
                Ok(format!(
                    "🎓 All {} answers are correct. Lesson completed!",
                    fields.quiz().len()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::Settings;
    use crate::core::money::Amount;
    use crate::entities::{Product, Question};
    use crate::flow::step::{Choice, ProductStep, QuestionStep, QuizQuestion};
    use crate::test_utils::*;
    use sea_orm::EntityTrait;

    fn engine() -> FlowEngine {
        FlowEngine::new(FlowConfig::from_settings(&Settings::default()))
    }

    fn text(value: &str) -> Input {
        Input::Text(value.to_string())
    }

    #[tokio::test]
    async fn test_input_without_session() -> Result<()> {
        let db = setup_test_db().await?;
        let result = engine().handle_input(&db, "1", text("hello")).await;
        assert!(matches!(result, Err(Error::NoActiveSession { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_price_reprompts_same_step() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        engine.start_flow("1", FlowKind::AddProduct).await?;
        engine.handle_input(&db, "1", text("Retreat")).await?;
        engine.handle_input(&db, "1", text("Three days")).await?;
        engine
            .handle_input(&db, "1", Input::Choice("retreat".into()))
            .await?;

        let outcome = engine.handle_input(&db, "1", text("abc")).await?;
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(outcome.reply().text.contains("price"));
        assert_eq!(
            engine.current_step("1").await,
            Some(Step::Product(ProductStep::Price))
        );
        let session = engine.session("1").await.unwrap();
        assert!(session.fields.amount(Field::Price).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_ends_session() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        engine.start_flow("1", FlowKind::AddCourse).await?;
        assert!(engine.cancel_flow("1").await);
        assert!(!engine.cancel_flow("1").await);

        let result = engine.handle_input(&db, "1", text("Title")).await;
        assert!(matches!(result, Err(Error::NoActiveSession { .. })));
        assert!(Product::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_product_flow_persists_findable_product() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        engine.start_flow("42", FlowKind::AddProduct).await?;

        for input in [
            text("Mindful retreat"),
            text("Three days in the mountains"),
            Input::Choice("retreat".into()),
            text("120.50"),
            text("skip"),
            Input::Choice("yes".into()),
            text("3"),
        ] {
            let outcome = engine.handle_input(&db, "42", input).await?;
            assert!(matches!(outcome, Outcome::Advanced(_)), "{outcome:?}");
        }
        let outcome = engine
            .handle_input(&db, "42", Input::Choice("hide".into()))
            .await?;
        assert!(matches!(outcome, Outcome::Committed(_)));
        assert!(engine.session("42").await.is_none());

        let stored = Product::find().one(&db).await?.unwrap();
        assert!(outcome.reply().text.contains(&stored.code));
        assert_eq!(stored.partner_id, "42");
        assert_eq!(stored.price, Amount::from_minor(12050).minor());
        assert_eq!(stored.subscription_period, Some(3));
        assert!(stored.is_hidden);

        let found = product::get_product_by_code(&db, &stored.code).await?;
        assert_eq!(found.unwrap().id, stored.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_simple_visible_product_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        engine.start_flow("7", FlowKind::AddProduct).await?;

        let mut last = None;
        for input in [
            text("A"),
            text("Simple product"),
            Input::Choice("other".into()),
            text("10"),
            text("-"),
            text("no"),
            Input::Choice("show".into()),
        ] {
            last = Some(engine.handle_input(&db, "7", input).await?);
        }
        let reply = last.unwrap().into_reply();

        let stored = Product::find().one(&db).await?.unwrap();
        assert!(reply.text.contains(&stored.code));

        let found = product::get_product_by_code(&db, &stored.code)
            .await?
            .unwrap();
        assert_eq!(found.name, "A");
        assert_eq!(found.price, Amount::from_major(10).minor());
        assert!(!found.is_hidden);
        assert!(!found.is_subscription);
        assert!(found.image_ref.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_question_loop_saves_each_question() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        let course = course::create_course(&db, "Yoga", "Practice", "42").await?;
        let lesson = course::create_lesson(&db, course.id, "Breathing", "Basics", None).await?;

        let lessons = vec![Choice {
            id: lesson.id,
            label: lesson.title.clone(),
        }];
        engine
            .start_flow("42", FlowKind::AddQuestion { lessons })
            .await?;
        engine
            .handle_input(&db, "42", Input::Choice(lesson.id.to_string()))
            .await?;

        for (question, answer) in [("First?", "1"), ("Second?", "2")] {
            engine.handle_input(&db, "42", text(question)).await?;
            engine.handle_input(&db, "42", text("a, b, c")).await?;
            let outcome = engine.handle_input(&db, "42", text(answer)).await?;
            assert!(matches!(outcome, Outcome::Committed(_)));
            assert_eq!(
                engine.current_step("42").await,
                Some(Step::Question(QuestionStep::More))
            );
            // Per-question values are cleared for the next round
            let session = engine.session("42").await.unwrap();
            assert!(session.fields.text(Field::QuestionText).is_none());
            engine
                .handle_input(&db, "42", Input::Choice("yes".into()))
                .await?;
        }
        engine.cancel_flow("42").await;

        let saved = Question::find().all(&db).await?;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].correct_option, 1);
        Ok(())
    }

    async fn lesson_test(db: &DatabaseConnection) -> Result<(i64, FlowKind)> {
        let course = course::create_course(db, "Yoga", "Practice", "42").await?;
        let lesson = course::create_lesson(db, course.id, "Breathing", "Basics", None).await?;
        let questions = vec![
            QuizQuestion {
                text: "Inhale through?".to_string(),
                options: vec!["Nose".to_string(), "Mouth".to_string()],
                correct: 0,
            },
            QuizQuestion {
                text: "Count to?".to_string(),
                options: vec!["2".to_string(), "4".to_string()],
                correct: 1,
            },
        ];
        Ok((
            lesson.id,
            FlowKind::TakeLesson {
                lesson_id: lesson.id,
                questions,
            },
        ))
    }

    #[tokio::test]
    async fn test_lesson_test_completes_after_right_answers() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        let (lesson_id, kind) = lesson_test(&db).await?;

        let first = engine.start_flow("7", kind).await?;
        assert!(first.text.contains("Inhale through?"));

        let outcome = engine.handle_input(&db, "7", Input::Choice("1".into())).await?;
        assert!(matches!(outcome, Outcome::Advanced(_)));
        assert!(outcome.reply().text.contains("Count to?"));

        let outcome = engine.handle_input(&db, "7", Input::Choice("2".into())).await?;
        assert!(matches!(outcome, Outcome::Committed(_)));
        assert!(engine.session("7").await.is_none());

        // Already completed, so a second mark changes nothing
        assert!(!course::mark_lesson_completed(&db, "7", lesson_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_lesson_test_wrong_answer_repeats_question() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();
        let (lesson_id, kind) = lesson_test(&db).await?;
        engine.start_flow("7", kind).await?;

        let outcome = engine.handle_input(&db, "7", text("Mouth")).await?;
        assert!(matches!(outcome, Outcome::Rejected(_)));
        assert!(outcome.reply().text.starts_with("❌ Wrong answer"));
        assert!(outcome.reply().text.contains("Inhale through?"));
        assert_eq!(
            engine.session("7").await.unwrap().fields.index(Field::QuizPosition),
            Some(0)
        );

        engine.cancel_flow("7").await;
        let progress = course::course_progress(&db, "7").await?;
        assert_eq!(progress[0].completed, 0);
        // Cancelling keeps the lesson open
        assert!(course::mark_lesson_completed(&db, "7", lesson_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_lesson_test_requires_questions() {
        let result = engine()
            .start_flow(
                "1",
                FlowKind::TakeLesson {
                    lesson_id: 1,
                    questions: vec![],
                },
            )
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_selection_flow_requires_choices() {
        let result = engine()
            .start_flow("1", FlowKind::AddLesson { courses: vec![] })
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_starting_again_replaces_session() -> Result<()> {
        let engine = engine();
        engine.start_flow("1", FlowKind::AddProduct).await?;
        engine.start_flow("1", FlowKind::BecomePartner).await?;
        assert_eq!(
            engine.session("1").await.map(|s| s.flow()),
            Some(Flow::BecomePartner)
        );
        assert_eq!(engine.sessions.slot_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_ended_sessions_free_their_slots() -> Result<()> {
        let db = setup_test_db().await?;
        let engine = engine();

        for i in 0..100 {
            let result = engine.handle_input(&db, &i.to_string(), text("hi")).await;
            assert!(matches!(result, Err(Error::NoActiveSession { .. })));
        }
        assert!(!engine.cancel_flow("100").await);
        assert_eq!(engine.sessions.slot_count().await, 0);

        engine.start_flow("1", FlowKind::AddCourse).await?;
        assert!(engine.cancel_flow("1").await);
        assert_eq!(engine.sessions.slot_count().await, 0);

        engine.start_flow("2", FlowKind::AddCourse).await?;
        engine.handle_input(&db, "2", text("Yoga")).await?;
        assert_eq!(engine.sessions.slot_count().await, 1);
        let outcome = engine.handle_input(&db, "2", text("Daily practice")).await?;
        assert!(matches!(outcome, Outcome::Committed(_)));
        assert_eq!(engine.sessions.slot_count().await, 0);
        Ok(())
    }
}
