//! Course business logic - Courses, lessons, questions and study progress.
//!
//! Partners author courses made of lessons, and lessons carry multiple-choice
//! questions. Any registered user may study any course; progress is a per-user
//! completion flag on each lesson, and the "next lesson" of a course is the
//! first one (in creation order) the user has not completed.
//!
//! Only the partner who created a course may tag, edit or delete it and its
//! lessons. Deleting removes dependent rows (questions, progress, tags and
//! inquiries) in the same transaction.

use crate::{
    entities::{
        Course, CourseTag, Inquiry, Lesson, LessonProgress, Question, course, course_tag, inquiry,
        lesson, lesson_progress, question, question::OPTION_SEPARATOR,
    },
    errors::{Error, Result},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    JoinType, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, prelude::*,
};
use std::collections::HashSet;

/// Most tags a course may carry
pub const MAX_TAGS: usize = 10;
/// Fewest answer options a question may have
pub const MIN_OPTIONS: usize = 2;
/// Most answer options a question may have
pub const MAX_OPTIONS: usize = 3;

/// Completion summary of one course for one user.
#[derive(Debug, Clone)]
pub struct CourseProgress {
    /// The course
    pub course: course::Model,
    /// Lessons the user completed
    pub completed: usize,
    /// Lessons in the course
    pub total: usize,
}

pub(crate) fn require_text(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{what} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Creates a course owned by `partner_id`.
///
/// # Errors
/// Returns an error if the title or description is empty, or the insert fails.
pub async fn create_course(
    db: &DatabaseConnection,
    title: &str,
    description: &str,
    partner_id: &str,
) -> Result<course::Model> {
    let course = course::ActiveModel {
        title: Set(require_text(title, "Course title")?),
        description: Set(require_text(description, "Course description")?),
        partner_id: Set(partner_id.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Partner {partner_id} created course {}", course.id);
    Ok(course)
}

/// Retrieves a course by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_course(db: &DatabaseConnection, course_id: i64) -> Result<Option<course::Model>> {
    Course::find_by_id(course_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every course, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn all_courses(db: &DatabaseConnection) -> Result<Vec<course::Model>> {
    Course::find()
        .order_by_asc(course::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the courses a partner created.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn courses_by_partner(
    db: &DatabaseConnection,
    partner_id: &str,
) -> Result<Vec<course::Model>> {
    Course::find()
        .filter(course::Column::PartnerId.eq(partner_id))
        .order_by_asc(course::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a lesson to an existing course.
///
/// # Errors
/// Returns `NotFound` if the course does not exist, `Validation` for empty
/// title or description, or a database error.
pub async fn create_lesson(
    db: &DatabaseConnection,
    course_id: i64,
    title: &str,
    description: &str,
    material_link: Option<String>,
) -> Result<lesson::Model> {
    let title = require_text(title, "Lesson title")?;
    let description = require_text(description, "Lesson description")?;

    if get_course(db, course_id).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        });
    }

    lesson::ActiveModel {
        course_id: Set(course_id),
        title: Set(title),
        description: Set(description),
        material_link: Set(material_link.filter(|link| !link.trim().is_empty())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a lesson by ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_lesson(db: &DatabaseConnection, lesson_id: i64) -> Result<Option<lesson::Model>> {
    Lesson::find_by_id(lesson_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the lessons of a course in creation order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn lessons_for_course(
    db: &DatabaseConnection,
    course_id: i64,
) -> Result<Vec<lesson::Model>> {
    Lesson::find()
        .filter(lesson::Column::CourseId.eq(course_id))
        .order_by_asc(lesson::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every lesson across the courses of a partner.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn lessons_for_partner(
    db: &DatabaseConnection,
    partner_id: &str,
) -> Result<Vec<lesson::Model>> {
    Lesson::find()
        .join(JoinType::InnerJoin, lesson::Relation::Course.def())
        .filter(course::Column::PartnerId.eq(partner_id))
        .order_by_asc(lesson::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a multiple-choice question to a lesson.
///
/// `correct_option` is a 0-based index into `options`.
///
/// # Errors
/// Returns `Validation` if the text is empty, the option count is outside
/// [`MIN_OPTIONS`]..=[`MAX_OPTIONS`], an option is empty or multi-line, or the
/// correct index is out of range; `NotFound` if the lesson does not exist.
pub async fn create_question(
    db: &DatabaseConnection,
    lesson_id: i64,
    text: &str,
    options: &[String],
    correct_option: usize,
) -> Result<question::Model> {
    let text = require_text(text, "Question text")?;

    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(Error::Validation {
            message: format!(
                "A question needs {MIN_OPTIONS} to {MAX_OPTIONS} options, got {}",
                options.len()
            ),
        });
    }
    if options
        .iter()
        .any(|o| o.trim().is_empty() || o.contains(OPTION_SEPARATOR))
    {
        return Err(Error::Validation {
            message: "Options must be non-empty single-line texts".to_string(),
        });
    }
    let correct = i32::try_from(correct_option)
        .ok()
        .filter(|_| correct_option < options.len())
        .ok_or_else(|| Error::Validation {
            message: format!("Correct option must be between 1 and {}", options.len()),
        })?;

    if get_lesson(db, lesson_id).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Lesson",
            id: lesson_id.to_string(),
        });
    }

    let joined = options
        .iter()
        .map(|o| o.trim())
        .collect::<Vec<_>>()
        .join(&OPTION_SEPARATOR.to_string());

    question::ActiveModel {
        lesson_id: Set(lesson_id),
        text: Set(text),
        options: Set(joined),
        correct_option: Set(correct),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists the questions of a lesson.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn questions_for_lesson(
    db: &DatabaseConnection,
    lesson_id: i64,
) -> Result<Vec<question::Model>> {
    Question::find()
        .filter(question::Column::LessonId.eq(lesson_id))
        .order_by_asc(question::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every question across the courses of a partner.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn questions_for_partner(
    db: &DatabaseConnection,
    partner_id: &str,
) -> Result<Vec<question::Model>> {
    Question::find()
        .join(JoinType::InnerJoin, question::Relation::Lesson.def())
        .join(JoinType::InnerJoin, lesson::Relation::Course.def())
        .filter(course::Column::PartnerId.eq(partner_id))
        .order_by_asc(question::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn completed_lesson_ids(db: &DatabaseConnection, user_id: &str) -> Result<HashSet<i64>> {
    let rows = LessonProgress::find()
        .filter(lesson_progress::Column::UserId.eq(user_id))
        .filter(lesson_progress::Column::Completed.eq(true))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.lesson_id).collect())
}

/// Marks a lesson as completed for a user.
///
/// Returns `false` if the lesson was already completed (nothing changes).
///
/// # Errors
/// Returns `NotFound` if the lesson does not exist, or a database error.
pub async fn mark_lesson_completed(
    db: &DatabaseConnection,
    user_id: &str,
    lesson_id: i64,
) -> Result<bool> {
    if get_lesson(db, lesson_id).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Lesson",
            id: lesson_id.to_string(),
        });
    }

    if completed_lesson_ids(db, user_id).await?.contains(&lesson_id) {
        return Ok(false);
    }

    let row = lesson_progress::ActiveModel {
        user_id: Set(user_id.to_string()),
        lesson_id: Set(lesson_id),
        completed: Set(true),
        completed_at: Set(Some(chrono::Utc::now())),
        ..Default::default()
    };
    LessonProgress::insert(row)
        .on_conflict(
            OnConflict::columns([
                lesson_progress::Column::UserId,
                lesson_progress::Column::LessonId,
            ])
            .update_columns([
                lesson_progress::Column::Completed,
                lesson_progress::Column::CompletedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    tracing::info!("User {user_id} completed lesson {lesson_id}");
    Ok(true)
}

/// Returns the first lesson of the course the user has not completed, or
/// `None` when every lesson is done (or the course has none).
///
/// # Errors
/// Returns `NotFound` if the course does not exist, or a database error.
pub async fn next_lesson(
    db: &DatabaseConnection,
    user_id: &str,
    course_id: i64,
) -> Result<Option<lesson::Model>> {
    if get_course(db, course_id).await?.is_none() {
        return Err(Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        });
    }

    let done = completed_lesson_ids(db, user_id).await?;
    Ok(lessons_for_course(db, course_id)
        .await?
        .into_iter()
        .find(|lesson| !done.contains(&lesson.id)))
}

/// Summarizes the user's progress in every course that has lessons.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn course_progress(db: &DatabaseConnection, user_id: &str) -> Result<Vec<CourseProgress>> {
    let done = completed_lesson_ids(db, user_id).await?;
    let courses = Course::find()
        .find_with_related(Lesson)
        .order_by_asc(course::Column::Id)
        .all(db)
        .await?;

    Ok(courses
        .into_iter()
        .filter(|(_, lessons)| !lessons.is_empty())
        .map(|(course, lessons)| CourseProgress {
            completed: lessons.iter().filter(|l| done.contains(&l.id)).count(),
            total: lessons.len(),
            course,
        })
        .collect())
}

/// Loads a course and checks that `owner_id` created it.
async fn owned_course(
    db: &DatabaseConnection,
    owner_id: &str,
    course_id: i64,
) -> Result<course::Model> {
    let Some(found) = get_course(db, course_id).await? else {
        return Err(Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        });
    };
    if found.partner_id != owner_id {
        return Err(Error::Unauthorized {
            message: format!("course {course_id} belongs to another partner"),
        });
    }
    Ok(found)
}

async fn owned_lesson(
    db: &DatabaseConnection,
    owner_id: &str,
    lesson_id: i64,
) -> Result<lesson::Model> {
    let Some(found) = get_lesson(db, lesson_id).await? else {
        return Err(Error::NotFound {
            entity: "Lesson",
            id: lesson_id.to_string(),
        });
    };
    owned_course(db, owner_id, found.course_id).await?;
    Ok(found)
}

fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

/// Splits user input such as `"#Yoga, breathing"` into normalized tags:
/// lowercase, without `#`, empty entries dropped, duplicates removed.
#[must_use]
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(normalize_tag)
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

/// Replaces the tags of a course.
///
/// Returns the stored tags in input order.
///
/// # Errors
/// Returns `Validation` if no usable tag is given or there are more than
/// [`MAX_TAGS`], `NotFound`/`Unauthorized` unless `owner_id` created the
/// course, or a database error.
pub async fn set_course_tags(
    db: &DatabaseConnection,
    owner_id: &str,
    course_id: i64,
    input: &str,
) -> Result<Vec<String>> {
    let tags = parse_tags(input);
    if tags.is_empty() {
        return Err(Error::Validation {
            message: "Give at least one tag, e.g. `yoga, breathing`".to_string(),
        });
    }
    if tags.len() > MAX_TAGS {
        return Err(Error::Validation {
            message: format!("A course can have at most {MAX_TAGS} tags"),
        });
    }
    owned_course(db, owner_id, course_id).await?;

    let txn = db.begin().await?;
    CourseTag::delete_many()
        .filter(course_tag::Column::CourseId.eq(course_id))
        .exec(&txn)
        .await?;
    CourseTag::insert_many(tags.iter().map(|tag| course_tag::ActiveModel {
        course_id: Set(course_id),
        tag: Set(tag.clone()),
        ..Default::default()
    }))
    .exec_without_returning(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!("Course {course_id} tagged with {}", tags.join(", "));
    Ok(tags)
}

/// Lists the tags of a course alphabetically.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn course_tags(db: &DatabaseConnection, course_id: i64) -> Result<Vec<String>> {
    let rows = CourseTag::find()
        .filter(course_tag::Column::CourseId.eq(course_id))
        .order_by_asc(course_tag::Column::Tag)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.tag).collect())
}

/// Finds the courses carrying a tag. Matching ignores case and a leading `#`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn courses_by_tag(db: &DatabaseConnection, tag: &str) -> Result<Vec<course::Model>> {
    let tag = normalize_tag(tag);
    if tag.is_empty() {
        return Ok(Vec::new());
    }
    let course_ids = CourseTag::find()
        .filter(course_tag::Column::Tag.eq(tag))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.course_id)
        .collect::<Vec<_>>();

    Course::find()
        .filter(course::Column::Id.is_in(course_ids))
        .order_by_asc(course::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a course together with its lessons, questions, progress, tags and
/// inquiries.
///
/// # Errors
/// Returns `NotFound`/`Unauthorized` unless `owner_id` created the course, or
/// a database error (in which case nothing is deleted).
pub async fn delete_course(
    db: &DatabaseConnection,
    owner_id: &str,
    course_id: i64,
) -> Result<course::Model> {
    let found = owned_course(db, owner_id, course_id).await?;

    let txn = db.begin().await?;
    let lesson_ids = Lesson::find()
        .filter(lesson::Column::CourseId.eq(course_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect::<Vec<_>>();

    Question::delete_many()
        .filter(question::Column::LessonId.is_in(lesson_ids.clone()))
        .exec(&txn)
        .await?;
    LessonProgress::delete_many()
        .filter(lesson_progress::Column::LessonId.is_in(lesson_ids))
        .exec(&txn)
        .await?;
    Lesson::delete_many()
        .filter(lesson::Column::CourseId.eq(course_id))
        .exec(&txn)
        .await?;
    CourseTag::delete_many()
        .filter(course_tag::Column::CourseId.eq(course_id))
        .exec(&txn)
        .await?;
    Inquiry::delete_many()
        .filter(inquiry::Column::CourseId.eq(course_id))
        .exec(&txn)
        .await?;
    Course::delete_by_id(course_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Partner {owner_id} deleted course {course_id}");
    Ok(found)
}

/// Renames a lesson and optionally replaces its description.
///
/// # Errors
/// Returns `Validation` for an empty title or description,
/// `NotFound`/`Unauthorized` unless `owner_id` created the lesson's course, or
/// a database error.
pub async fn update_lesson(
    db: &DatabaseConnection,
    owner_id: &str,
    lesson_id: i64,
    title: &str,
    description: Option<&str>,
) -> Result<lesson::Model> {
    let title = require_text(title, "Lesson title")?;
    let description = description
        .map(|d| require_text(d, "Lesson description"))
        .transpose()?;

    let found = owned_lesson(db, owner_id, lesson_id).await?;
    let mut active: lesson::ActiveModel = found.into();
    active.title = Set(title);
    if let Some(description) = description {
        active.description = Set(description);
    }
    let updated = active.update(db).await?;

    tracing::info!("Partner {owner_id} edited lesson {lesson_id}");
    Ok(updated)
}

/// Deletes a lesson with its questions and progress rows.
///
/// # Errors
/// Returns `NotFound`/`Unauthorized` unless `owner_id` created the lesson's
/// course, or a database error (in which case nothing is deleted).
pub async fn delete_lesson(
    db: &DatabaseConnection,
    owner_id: &str,
    lesson_id: i64,
) -> Result<lesson::Model> {
    let found = owned_lesson(db, owner_id, lesson_id).await?;

    let txn = db.begin().await?;
    Question::delete_many()
        .filter(question::Column::LessonId.eq(lesson_id))
        .exec(&txn)
        .await?;
    LessonProgress::delete_many()
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .exec(&txn)
        .await?;
    Lesson::delete_by_id(lesson_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Partner {owner_id} deleted lesson {lesson_id}");
    Ok(found)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_create_course_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_course(&db, "  ", "desc", "1").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_course(&db, "Title", "", "1").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_courses_and_lessons() -> Result<()> {
        let db = setup_test_db().await?;

        let mine = create_course(&db, "Yoga", "Morning practice", "partner").await?;
        create_course(&db, "Other", "Someone else's", "rival").await?;

        assert_eq!(all_courses(&db).await?.len(), 2);
        let by_partner = courses_by_partner(&db, "partner").await?;
        assert_eq!(by_partner.len(), 1);
        assert_eq!(by_partner[0].id, mine.id);

        let lesson = create_lesson(&db, mine.id, "Breathing", "Basics", None).await?;
        assert_eq!(lesson.course_id, mine.id);
        assert!(lesson.material_link.is_none());

        let result = create_lesson(&db, 999, "Ghost", "Nope", None).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Course", .. })));

        assert_eq!(lessons_for_partner(&db, "partner").await?.len(), 1);
        assert!(lessons_for_partner(&db, "rival").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_question_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;
        let lesson = create_lesson(&db, course.id, "Breathing", "Basics", None).await?;

        let too_few = create_question(&db, lesson.id, "Q?", &options(&["a"]), 0).await;
        assert!(matches!(too_few, Err(Error::Validation { .. })));

        let too_many =
            create_question(&db, lesson.id, "Q?", &options(&["a", "b", "c", "d"]), 0).await;
        assert!(matches!(too_many, Err(Error::Validation { .. })));

        let bad_index = create_question(&db, lesson.id, "Q?", &options(&["a", "b"]), 2).await;
        assert!(matches!(bad_index, Err(Error::Validation { .. })));

        let no_lesson = create_question(&db, 999, "Q?", &options(&["a", "b"]), 0).await;
        assert!(matches!(no_lesson, Err(Error::NotFound { entity: "Lesson", .. })));

        let question =
            create_question(&db, lesson.id, "Which?", &options(&[" a ", "b", "c"]), 2).await?;
        assert_eq!(question.option_list(), vec!["a", "b", "c"]);
        assert_eq!(question.correct_option, 2);

        assert_eq!(questions_for_lesson(&db, lesson.id).await?.len(), 1);
        assert_eq!(questions_for_partner(&db, "partner").await?.len(), 1);
        assert!(questions_for_partner(&db, "rival").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_progress_and_next_lesson() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;
        let first = create_lesson(&db, course.id, "One", "First", None).await?;
        let second = create_lesson(&db, course.id, "Two", "Second", None).await?;

        assert_eq!(next_lesson(&db, "student", course.id).await?.unwrap().id, first.id);

        assert!(mark_lesson_completed(&db, "student", first.id).await?);
        // Completing twice is a no-op
        assert!(!mark_lesson_completed(&db, "student", first.id).await?);
        assert_eq!(
            LessonProgress::find().all(&db).await?.len(),
            1,
            "exactly one progress row per user and lesson"
        );

        assert_eq!(next_lesson(&db, "student", course.id).await?.unwrap().id, second.id);
        mark_lesson_completed(&db, "student", second.id).await?;
        assert!(next_lesson(&db, "student", course.id).await?.is_none());

        // Other users are unaffected
        assert_eq!(next_lesson(&db, "other", course.id).await?.unwrap().id, first.id);

        let progress = course_progress(&db, "student").await?;
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].completed, 2);
        assert_eq!(progress[0].total, 2);

        let result = next_lesson(&db, "student", 999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = mark_lesson_completed(&db, "student", 999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("#Yoga, breathing  yoga,,"), vec!["yoga", "breathing"]);
        assert!(parse_tags(" , # ").is_empty());
    }

    #[tokio::test]
    async fn test_tags_replace_and_search() -> Result<()> {
        let db = setup_test_db().await?;
        let yoga = create_course(&db, "Yoga", "Practice", "partner").await?;
        let chess = create_course(&db, "Chess", "Openings", "partner").await?;

        set_course_tags(&db, "partner", yoga.id, "#Yoga, morning").await?;
        set_course_tags(&db, "partner", chess.id, "strategy, morning").await?;
        assert_eq!(course_tags(&db, yoga.id).await?, vec!["morning", "yoga"]);

        let found = courses_by_tag(&db, "#MORNING").await?;
        assert_eq!(found.iter().map(|c| c.id).collect::<Vec<_>>(), vec![yoga.id, chess.id]);

        // Setting tags again replaces the old ones
        set_course_tags(&db, "partner", yoga.id, "stretching").await?;
        assert_eq!(course_tags(&db, yoga.id).await?, vec!["stretching"]);
        assert_eq!(courses_by_tag(&db, "morning").await?.len(), 1);
        assert!(courses_by_tag(&db, "  ").await?.is_empty());

        let empty = set_course_tags(&db, "partner", yoga.id, "#").await;
        assert!(matches!(empty, Err(Error::Validation { .. })));
        let foreign = set_course_tags(&db, "rival", yoga.id, "mine").await;
        assert!(matches!(foreign, Err(Error::Unauthorized { .. })));
        assert_eq!(course_tags(&db, yoga.id).await?, vec!["stretching"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_course_removes_dependents() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;
        let kept = create_course(&db, "Chess", "Openings", "partner").await?;
        let lesson = create_lesson(&db, course.id, "Breathing", "Basics", None).await?;
        let kept_lesson = create_lesson(&db, kept.id, "Pawns", "Basics", None).await?;
        create_question(&db, lesson.id, "Q?", &options(&["a", "b"]), 0).await?;
        mark_lesson_completed(&db, "student", lesson.id).await?;
        mark_lesson_completed(&db, "student", kept_lesson.id).await?;
        set_course_tags(&db, "partner", course.id, "yoga").await?;

        let result = delete_course(&db, "rival", course.id).await;
        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert!(get_course(&db, course.id).await?.is_some());

        delete_course(&db, "partner", course.id).await?;
        assert!(get_course(&db, course.id).await?.is_none());
        assert!(get_lesson(&db, lesson.id).await?.is_none());
        assert!(Question::find().all(&db).await?.is_empty());
        assert!(courses_by_tag(&db, "yoga").await?.is_empty());

        let progress = LessonProgress::find().all(&db).await?;
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].lesson_id, kept_lesson.id);

        let result = delete_course(&db, "partner", course.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Course", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_delete_lesson() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;
        let lesson = create_lesson(&db, course.id, "Breathing", "Basics", None).await?;
        let other = create_lesson(&db, course.id, "Posture", "Standing", None).await?;
        create_question(&db, lesson.id, "Q?", &options(&["a", "b"]), 1).await?;

        let renamed = update_lesson(&db, "partner", lesson.id, " Deep breathing ", None).await?;
        assert_eq!(renamed.title, "Deep breathing");
        assert_eq!(renamed.description, "Basics");

        let described =
            update_lesson(&db, "partner", lesson.id, "Breath", Some("Box breathing")).await?;
        assert_eq!(described.description, "Box breathing");

        let blank = update_lesson(&db, "partner", lesson.id, "", None).await;
        assert!(matches!(blank, Err(Error::Validation { .. })));
        let foreign = update_lesson(&db, "rival", lesson.id, "Mine", None).await;
        assert!(matches!(foreign, Err(Error::Unauthorized { .. })));
        let foreign = delete_lesson(&db, "rival", lesson.id).await;
        assert!(matches!(foreign, Err(Error::Unauthorized { .. })));

        delete_lesson(&db, "partner", lesson.id).await?;
        assert!(get_lesson(&db, lesson.id).await?.is_none());
        assert!(questions_for_lesson(&db, lesson.id).await?.is_empty());
        assert_eq!(next_lesson(&db, "student", course.id).await?.unwrap().id, other.id);

        let missing = delete_lesson(&db, "partner", lesson.id).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "Lesson", .. })));
        Ok(())
    }
}
