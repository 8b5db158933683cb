//! Guided multi-step dialogues (add product, course, lesson, questions, partner
//! profile, and the lesson test learners take).
//!
//! A user has at most one active session. Plain messages and button presses are
//! routed to [`FlowEngine::handle_input`], which validates them with the pure
//! [`transition`] function and persists the finished record through the core
//! services.

mod engine;
mod reply;
mod session;
mod step;
mod transition;

pub use engine::{FlowEngine, Outcome};
pub use reply::{Button, Reply};
pub use session::{Field, FieldValue, Fields, Session, SessionStore};
pub use step::{
    Choice, CourseStep, Flow, FlowKind, Input, LessonStep, PartnerStep, ProductStep, QuestionStep,
    QuizQuestion, QuizStep, Step,
};
pub use transition::{FlowConfig, MAX_CHOICE_BUTTONS, Transition, prompt, transition};
