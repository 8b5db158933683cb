//! Flow and step identifiers, plus the inputs a step can receive.

use std::fmt;

/// Which guided dialogue a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Partner creates a product
    AddProduct,
    /// Partner creates a course
    AddCourse,
    /// Partner adds a lesson to one of their courses
    AddLesson,
    /// Partner adds questions to one of their lessons
    AddQuestion,
    /// Any user submits a partner profile
    BecomePartner,
    /// A learner answers a lesson's questions to complete it
    TakeLesson,
}

impl Flow {
    /// Step a freshly started session begins at.
    #[must_use]
    pub const fn initial_step(self) -> Step {
        match self {
            Self::AddProduct => Step::Product(ProductStep::Name),
            Self::AddCourse => Step::Course(CourseStep::Title),
            Self::AddLesson => Step::Lesson(LessonStep::Course),
            Self::AddQuestion => Step::Question(QuestionStep::Lesson),
            Self::BecomePartner => Step::Partner(PartnerStep::Name),
            Self::TakeLesson => Step::Quiz(QuizStep::Answer),
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddProduct => "add product",
            Self::AddCourse => "add course",
            Self::AddLesson => "add lesson",
            Self::AddQuestion => "add question",
            Self::BecomePartner => "become partner",
            Self::TakeLesson => "lesson test",
        };
        f.write_str(name)
    }
}

/// One selectable record offered by a selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Database ID of the record
    pub id: i64,
    /// Label shown to the user
    pub label: String,
}

/// A lesson question as a learner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// Question text
    pub text: String,
    /// Answer options in display order
    pub options: Vec<String>,
    /// Zero-based index of the correct option
    pub correct: usize,
}

/// A request to start a flow, with the records selection steps may offer.
///
/// The lists are the caller's own courses or lessons, captured when the flow
/// starts; selection steps only accept IDs from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowKind {
    /// See [`Flow::AddProduct`]
    AddProduct,
    /// See [`Flow::AddCourse`]
    AddCourse,
    /// See [`Flow::AddLesson`]
    AddLesson {
        /// Courses the lesson may be added to
        courses: Vec<Choice>,
    },
    /// See [`Flow::AddQuestion`]
    AddQuestion {
        /// Lessons questions may be added to
        lessons: Vec<Choice>,
    },
    /// See [`Flow::BecomePartner`]
    BecomePartner,
    /// See [`Flow::TakeLesson`]
    TakeLesson {
        /// Lesson completed when every question is answered correctly
        lesson_id: i64,
        /// Questions asked in order
        questions: Vec<QuizQuestion>,
    },
}

impl FlowKind {
    /// The flow this request starts.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        match self {
            Self::AddProduct => Flow::AddProduct,
            Self::AddCourse => Flow::AddCourse,
            Self::AddLesson { .. } => Flow::AddLesson,
            Self::AddQuestion { .. } => Flow::AddQuestion,
            Self::BecomePartner => Flow::BecomePartner,
            Self::TakeLesson { .. } => Flow::TakeLesson,
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductStep {
    Name,
    Description,
    Category,
    Price,
    Image,
    Subscription,
    Period,
    Hide,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStep {
    Title,
    Description,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonStep {
    Course,
    Title,
    Description,
    Material,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionStep {
    Lesson,
    Text,
    Options,
    CorrectOption,
    More,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartnerStep {
    Name,
    Credo,
    Logo,
}

/// The current question is tracked in the session fields, so one step suffices.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizStep {
    Answer,
}

/// Position inside a flow. The outer variant identifies the flow.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Product(ProductStep),
    Course(CourseStep),
    Lesson(LessonStep),
    Question(QuestionStep),
    Partner(PartnerStep),
    Quiz(QuizStep),
}

impl Step {
    /// The flow this step belongs to.
    #[must_use]
    pub const fn flow(self) -> Flow {
        match self {
            Self::Product(_) => Flow::AddProduct,
            Self::Course(_) => Flow::AddCourse,
            Self::Lesson(_) => Flow::AddLesson,
            Self::Question(_) => Flow::AddQuestion,
            Self::Partner(_) => Flow::BecomePartner,
            Self::Quiz(_) => Flow::TakeLesson,
        }
    }
}

/// A user input delivered to the active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Typed text
    Text(String),
    /// An uploaded image, by attachment URL
    Photo(String),
    /// Payload of a pressed button
    Choice(String),
}

impl Input {
    /// Text or button payload, trimmed; `None` for photos.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Choice(text) => Some(text.trim()),
            Self::Photo(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_steps_belong_to_their_flow() {
        for flow in [
            Flow::AddProduct,
            Flow::AddCourse,
            Flow::AddLesson,
            Flow::AddQuestion,
            Flow::BecomePartner,
            Flow::TakeLesson,
        ] {
            assert_eq!(flow.initial_step().flow(), flow);
        }
    }
}
