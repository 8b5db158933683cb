//! Per-user dialogue sessions and the store that serializes access to them.
//!
//! Each user gets their own slot guarded by an async mutex, so two inputs from
//! the same user are processed one after the other while different users never
//! wait on each other. The map lock is only held long enough to find the slot.

use super::step::{Choice, Flow, QuizQuestion, Step};
use crate::core::money::Amount;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keys of the values a flow collects.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Description,
    Category,
    Price,
    Image,
    IsSubscription,
    Period,
    IsHidden,
    Title,
    CourseId,
    LessonId,
    Material,
    QuestionText,
    Options,
    CorrectOption,
    Credo,
    Logo,
    /// Records offered by the flow's selection step
    Choices,
    /// Questions of a lesson test
    Quiz,
    /// Position of the current test question
    QuizPosition,
}

/// A value collected by a flow.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    OptionalText(Option<String>),
    Amount(Amount),
    Flag(bool),
    Months(u32),
    Id(i64),
    List(Vec<String>),
    Index(usize),
    Choices(Vec<Choice>),
    Quiz(Vec<QuizQuestion>),
}

/// Typed view over the values collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<Field, FieldValue>);

impl Fields {
    /// Stores or replaces a value.
    pub fn set(&mut self, field: Field, value: FieldValue) {
        self.0.insert(field, value);
    }

    /// Forgets a value.
    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Raw access.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn text(&self, field: Field) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// `None` both when unset and when explicitly skipped.
    #[must_use]
    pub fn optional_text(&self, field: Field) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::OptionalText(text)) => text.as_deref(),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn amount(&self, field: Field) -> Option<Amount> {
        match self.get(field) {
            Some(FieldValue::Amount(amount)) => Some(*amount),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn flag(&self, field: Field) -> Option<bool> {
        match self.get(field) {
            Some(FieldValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn months(&self, field: Field) -> Option<u32> {
        match self.get(field) {
            Some(FieldValue::Months(months)) => Some(*months),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn id(&self, field: Field) -> Option<i64> {
        match self.get(field) {
            Some(FieldValue::Id(id)) => Some(*id),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn list(&self, field: Field) -> Option<&[String]> {
        match self.get(field) {
            Some(FieldValue::List(items)) => Some(items),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn index(&self, field: Field) -> Option<usize> {
        match self.get(field) {
            Some(FieldValue::Index(index)) => Some(*index),
            _ => None,
        }
    }

    /// Offered records, empty if none were stored.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match self.get(Field::Choices) {
            Some(FieldValue::Choices(choices)) => choices,
            _ => &[],
        }
    }

    /// Test questions, empty if none were stored.
    #[must_use]
    pub fn quiz(&self) -> &[QuizQuestion] {
        match self.get(Field::Quiz) {
            Some(FieldValue::Quiz(questions)) => questions,
            _ => &[],
        }
    }
}

/// State of one user's dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Chat identity of the owner
    pub user_id: String,
    /// Current position
    pub step: Step,
    /// Values collected so far
    pub fields: Fields,
    /// When the flow was started
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// A session positioned at the first step of `flow`.
    #[must_use]
    pub fn new(user_id: &str, flow: Flow) -> Self {
        Self {
            user_id: user_id.to_string(),
            step: flow.initial_step(),
            fields: Fields::default(),
            started_at: Utc::now(),
        }
    }

    /// The flow the session is in.
    #[must_use]
    pub const fn flow(&self) -> Flow {
        self.step.flow()
    }
}

type Slot = Arc<Mutex<Option<Session>>>;

/// Holds at most one session per user.
#[derive(Debug, Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<String, Slot>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the user's slot, creating it if needed, until the guard is dropped.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<Option<Session>> {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(user_id.to_string()).or_default())
        };
        slot.lock_owned().await
    }

    /// Locks the user's slot if one exists; never creates one.
    pub async fn lock_existing(&self, user_id: &str) -> Option<OwnedMutexGuard<Option<Session>>> {
        let slot = self.slots.lock().await.get(user_id).cloned()?;
        Some(slot.lock_owned().await)
    }

    /// Removes the user's slot once it is empty and nobody else holds it.
    ///
    /// Slots are only cloned under the map lock, so a strong count of one
    /// here means no other task is waiting on or holding the slot.
    pub async fn release(&self, user_id: &str) {
        let mut slots = self.slots.lock().await;
        let idle = slots.get(user_id).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|session| session.is_none())
        });
        if idle {
            slots.remove(user_id);
        }
    }

    /// Copy of the user's current session.
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.lock_existing(user_id).await?.clone()
    }

    /// Number of users that currently hold a slot.
    pub async fn slot_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::step::ProductStep;

    #[tokio::test]
    async fn test_store_keeps_one_session_per_user() {
        let store = SessionStore::new();
        assert!(store.get("1").await.is_none());

        *store.lock("1").await = Some(Session::new("1", Flow::AddProduct));
        *store.lock("2").await = Some(Session::new("2", Flow::AddCourse));
        assert_eq!(store.slot_count().await, 2);

        // Replacing abandons the previous session
        *store.lock("1").await = Some(Session::new("1", Flow::BecomePartner));
        assert_eq!(store.get("1").await.map(|s| s.flow()), Some(Flow::BecomePartner));
        assert_eq!(store.slot_count().await, 2);

        store.lock("2").await.take();
        store.release("2").await;
        assert_eq!(store.slot_count().await, 1);
    }

    #[tokio::test]
    async fn test_lookups_without_session_leave_no_slots() {
        let store = SessionStore::new();
        for i in 0..1000 {
            let id = i.to_string();
            assert!(store.lock_existing(&id).await.is_none());
            assert!(store.get(&id).await.is_none());
            store.release(&id).await;
        }
        assert_eq!(store.slot_count().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_occupied_or_held_slots() {
        let store = SessionStore::new();
        *store.lock("1").await = Some(Session::new("1", Flow::AddCourse));
        store.release("1").await;
        assert_eq!(store.slot_count().await, 1);

        let mut held = store.lock("1").await;
        held.take();
        // Still locked by `held`
        store.release("1").await;
        assert_eq!(store.slot_count().await, 1);

        drop(held);
        store.release("1").await;
        assert_eq!(store.slot_count().await, 0);
    }

    #[test]
    fn test_fields_typed_access() {
        let mut fields = Fields::default();
        fields.set(Field::Name, FieldValue::Text("Yoga".to_string()));
        fields.set(Field::Price, FieldValue::Amount(Amount::from_major(3)));
        fields.set(Field::Image, FieldValue::OptionalText(None));

        assert_eq!(fields.text(Field::Name), Some("Yoga"));
        assert_eq!(fields.amount(Field::Price), Some(Amount::from_major(3)));
        assert_eq!(fields.optional_text(Field::Image), None);
        // Wrong type reads as absent
        assert_eq!(fields.text(Field::Price), None);
        assert!(fields.choices().is_empty());

        fields.remove(Field::Name);
        assert_eq!(fields.text(Field::Name), None);

        let session = Session::new("1", Flow::AddProduct);
        assert_eq!(session.step, Step::Product(ProductStep::Name));
    }
}
