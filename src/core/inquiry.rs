//! Inquiry business logic - Students asking course authors questions.
//!
//! A student asks about a course; the question is stored and relayed to the
//! partner who created it. The partner answers by inquiry ID, and each inquiry
//! can be answered once.

use crate::{
    core::course::{get_course, require_text},
    entities::{Inquiry, inquiry},
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Records a student's question about a course for its author.
///
/// # Errors
/// Returns `Validation` for an empty question or when the author asks about
/// their own course, `NotFound` if the course does not exist, or a database
/// error.
pub async fn ask_partner(
    db: &DatabaseConnection,
    asker_id: &str,
    course_id: i64,
    text: &str,
) -> Result<inquiry::Model> {
    let text = require_text(text, "Question")?;
    let Some(course) = get_course(db, course_id).await? else {
        return Err(Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        });
    };
    if course.partner_id == asker_id {
        return Err(Error::Validation {
            message: "You are the author of this course".to_string(),
        });
    }

    let inquiry = inquiry::ActiveModel {
        course_id: Set(course_id),
        asker_id: Set(asker_id.to_string()),
        partner_id: Set(course.partner_id),
        text: Set(text),
        answer: Set(None),
        created_at: Set(chrono::Utc::now()),
        answered_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        "User {asker_id} asked inquiry {} about course {course_id}",
        inquiry.id
    );
    Ok(inquiry)
}

/// Stores the partner's answer to an inquiry.
///
/// # Errors
/// Returns `Validation` for an empty answer or an inquiry that was already
/// answered, `NotFound` if it does not exist, `Unauthorized` if it was sent to
/// another partner, or a database error.
pub async fn answer_inquiry(
    db: &DatabaseConnection,
    partner_id: &str,
    inquiry_id: i64,
    answer: &str,
) -> Result<inquiry::Model> {
    let answer = require_text(answer, "Answer")?;
    let Some(found) = Inquiry::find_by_id(inquiry_id).one(db).await? else {
        return Err(Error::NotFound {
            entity: "Inquiry",
            id: inquiry_id.to_string(),
        });
    };
    if found.partner_id != partner_id {
        return Err(Error::Unauthorized {
            message: format!("inquiry {inquiry_id} was sent to another partner"),
        });
    }

    // Only the first answer is stored
    let updated = Inquiry::update_many()
        .col_expr(inquiry::Column::Answer, Expr::value(answer))
        .col_expr(
            inquiry::Column::AnsweredAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(inquiry::Column::Id.eq(inquiry_id))
        .filter(inquiry::Column::Answer.is_null())
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(Error::Validation {
            message: format!("Inquiry {inquiry_id} has already been answered"),
        });
    }

    let answered = Inquiry::find_by_id(inquiry_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Inquiry",
            id: inquiry_id.to_string(),
        })?;
    tracing::info!("Partner {partner_id} answered inquiry {inquiry_id}");
    Ok(answered)
}

/// Lists the unanswered inquiries sent to a partner, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn open_inquiries(
    db: &DatabaseConnection,
    partner_id: &str,
) -> Result<Vec<inquiry::Model>> {
    Inquiry::find()
        .filter(inquiry::Column::PartnerId.eq(partner_id))
        .filter(inquiry::Column::Answer.is_null())
        .order_by_asc(inquiry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::course::create_course, test_utils::*};

    #[tokio::test]
    async fn test_ask_and_answer() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;

        let asked = ask_partner(&db, "student", course.id, " How long? ").await?;
        assert_eq!(asked.partner_id, "partner");
        assert_eq!(asked.text, "How long?");
        assert!(asked.answer.is_none());
        assert_eq!(open_inquiries(&db, "partner").await?.len(), 1);
        assert!(open_inquiries(&db, "rival").await?.is_empty());

        let answered = answer_inquiry(&db, "partner", asked.id, "Ten minutes").await?;
        assert_eq!(answered.answer.as_deref(), Some("Ten minutes"));
        assert!(answered.answered_at.is_some());
        assert!(open_inquiries(&db, "partner").await?.is_empty());

        let again = answer_inquiry(&db, "partner", asked.id, "Twenty").await;
        assert!(matches!(again, Err(Error::Validation { .. })));
        let stored = Inquiry::find_by_id(asked.id).one(&db).await?.unwrap();
        assert_eq!(stored.answer.as_deref(), Some("Ten minutes"));
        Ok(())
    }

    #[tokio::test]
    async fn test_inquiry_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, "Yoga", "Practice", "partner").await?;

        let blank = ask_partner(&db, "student", course.id, "  ").await;
        assert!(matches!(blank, Err(Error::Validation { .. })));
        let missing = ask_partner(&db, "student", 999, "Hello?").await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "Course", .. })));
        let own = ask_partner(&db, "partner", course.id, "Hello?").await;
        assert!(matches!(own, Err(Error::Validation { .. })));

        let asked = ask_partner(&db, "student", course.id, "Hello?").await?;
        let foreign = answer_inquiry(&db, "rival", asked.id, "Hi").await;
        assert!(matches!(foreign, Err(Error::Unauthorized { .. })));
        let missing = answer_inquiry(&db, "partner", 999, "Hi").await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "Inquiry", .. })));
        let blank = answer_inquiry(&db, "partner", asked.id, " ").await;
        assert!(matches!(blank, Err(Error::Validation { .. })));
        Ok(())
    }
}
