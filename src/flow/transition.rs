//! Pure step transitions and step prompts.
//!
//! [`transition`] validates one input against the current step and says what
//! to do next; it performs no I/O, so every rule here is testable without a
//! database. Persistence happens in the engine when a transition commits.

use super::reply::{Button, Reply};
use super::session::{Field, FieldValue, Fields};
use super::step::{
    Choice, CourseStep, Input, LessonStep, PartnerStep, ProductStep, QuestionStep, QuizStep, Step,
};
use crate::config::settings::{Category, Settings};
use crate::core::course::{MAX_OPTIONS, MIN_OPTIONS};
use crate::core::money::Amount;

/// Selection steps show at most this many buttons; more IDs can still be typed.
pub const MAX_CHOICE_BUTTONS: usize = 20;

const YES_NO_HINT: &str = "Please answer yes or no.";

/// Settings the flows need.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Categories offered by the product flow
    pub categories: Vec<Category>,
    /// Currency label used in prompts
    pub currency: String,
}

impl FlowConfig {
    /// Extracts the flow-relevant part of the settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            categories: settings.categories.clone(),
            currency: settings.currency.clone(),
        }
    }

    fn category_key(&self, input: &str) -> Option<String> {
        self.categories
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(input) || c.label.eq_ignore_ascii_case(input))
            .map(|c| c.key.clone())
    }
}

/// What the engine should do with an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Input invalid; stay on the step and show `message`
    Reject {
        /// Why the input was refused
        message: String,
    },
    /// Store `updates` and move to `next`
    Advance {
        /// Step to prompt for next
        next: Step,
        /// Values to store
        updates: Vec<(Field, FieldValue)>,
    },
    /// Store `updates`, persist the collected record, then continue at `then`
    /// (or end the session when `None`) after forgetting the `reset` fields
    Commit {
        /// Values to store before persisting
        updates: Vec<(Field, FieldValue)>,
        /// Step after the commit, `None` ends the flow
        then: Option<Step>,
        /// Fields cleared after a successful commit
        reset: Vec<Field>,
    },
    /// End the session without persisting anything
    Finish {
        /// Closing message
        message: String,
    },
}

fn advance(next: Step, field: Field, value: FieldValue) -> Transition {
    Transition::Advance {
        next,
        updates: vec![(field, value)],
    }
}

fn commit(field: Field, value: FieldValue) -> Transition {
    Transition::Commit {
        updates: vec![(field, value)],
        then: None,
        reset: Vec::new(),
    }
}

fn free_text(input: &Input) -> Result<FieldValue, String> {
    match input.as_text() {
        Some(text) if !text.is_empty() => Ok(FieldValue::Text(text.to_string())),
        Some(_) => Err("This cannot be empty.".to_string()),
        None => Err("Please send text, not a picture.".to_string()),
    }
}

fn is_skip(text: &str) -> bool {
    text == "-" || text.eq_ignore_ascii_case("skip")
}

fn is_link(text: &str) -> bool {
    text.starts_with("https://") || text.starts_with("http://")
}

/// Accepts a photo, a link, or `skip`/`-`.
fn optional_image(input: &Input, hint: &str) -> Result<FieldValue, String> {
    match input {
        Input::Photo(url) => Ok(FieldValue::OptionalText(Some(url.clone()))),
        other => match other.as_text() {
            Some(text) if is_skip(text) => Ok(FieldValue::OptionalText(None)),
            Some(text) if is_link(text) => Ok(FieldValue::OptionalText(Some(text.to_string()))),
            _ => Err(hint.to_string()),
        },
    }
}

fn optional_text(input: &Input) -> Result<FieldValue, String> {
    match input.as_text() {
        Some(text) if is_skip(text) => Ok(FieldValue::OptionalText(None)),
        Some(text) if !text.is_empty() => Ok(FieldValue::OptionalText(Some(text.to_string()))),
        _ => Err("Please send text, or type `skip`.".to_string()),
    }
}

fn yes_no(input: &Input) -> Option<bool> {
    match input.as_text()?.to_lowercase().as_str() {
        "yes" | "y" | "true" => Some(true),
        "no" | "n" | "false" => Some(false),
        _ => None,
    }
}

fn pick(input: &Input, choices: &[Choice], what: &str) -> Result<FieldValue, String> {
    input
        .as_text()
        .and_then(|text| text.trim_start_matches('#').parse::<i64>().ok())
        .filter(|id| choices.iter().any(|c| c.id == *id))
        .map(FieldValue::Id)
        .ok_or_else(|| format!("Please choose one of your {what} from the list."))
}

fn product_step(step: ProductStep, input: &Input, config: &FlowConfig) -> Result<Transition, String> {
    let to = Step::Product;
    Ok(match step {
        ProductStep::Name => advance(to(ProductStep::Description), Field::Name, free_text(input)?),
        ProductStep::Description => advance(
            to(ProductStep::Category),
            Field::Description,
            free_text(input)?,
        ),
        ProductStep::Category => {
            let key = input
                .as_text()
                .and_then(|text| config.category_key(text))
                .ok_or_else(|| "Please choose one of the categories below.".to_string())?;
            advance(to(ProductStep::Price), Field::Category, FieldValue::Text(key))
        }
        ProductStep::Price => {
            let text = input.as_text().unwrap_or_default();
            let price: Amount = text.parse().map_err(|_| {
                format!("\"{text}\" is not a valid price. Enter a number such as 10 or 10.50.")
            })?;
            advance(to(ProductStep::Image), Field::Price, FieldValue::Amount(price))
        }
        ProductStep::Image => advance(
            to(ProductStep::Subscription),
            Field::Image,
            optional_image(input, "Please send a picture of the product, or type `skip`.")?,
        ),
        ProductStep::Subscription => match yes_no(input) {
            Some(true) => advance(
                to(ProductStep::Period),
                Field::IsSubscription,
                FieldValue::Flag(true),
            ),
            Some(false) => advance(
                to(ProductStep::Hide),
                Field::IsSubscription,
                FieldValue::Flag(false),
            ),
            None => return Err(YES_NO_HINT.to_string()),
        },
        ProductStep::Period => {
            let months = input
                .as_text()
                .and_then(|text| text.parse::<u32>().ok())
                .filter(|months| *months > 0)
                .ok_or_else(|| "The period must be a positive whole number of months.".to_string())?;
            advance(to(ProductStep::Hide), Field::Period, FieldValue::Months(months))
        }
        ProductStep::Hide => {
            let hidden = match input.as_text().map(str::to_lowercase).as_deref() {
                Some("hide" | "yes" | "y") => true,
                Some("show" | "no" | "n") => false,
                _ => return Err("Please choose whether to hide the product.".to_string()),
            };
            commit(Field::IsHidden, FieldValue::Flag(hidden))
        }
    })
}

fn course_step(step: CourseStep, input: &Input) -> Result<Transition, String> {
    Ok(match step {
        CourseStep::Title => advance(
            Step::Course(CourseStep::Description),
            Field::Title,
            free_text(input)?,
        ),
        CourseStep::Description => commit(Field::Description, free_text(input)?),
    })
}

fn lesson_step(step: LessonStep, fields: &Fields, input: &Input) -> Result<Transition, String> {
    let to = Step::Lesson;
    Ok(match step {
        LessonStep::Course => advance(
            to(LessonStep::Title),
            Field::CourseId,
            pick(input, fields.choices(), "courses")?,
        ),
        LessonStep::Title => advance(to(LessonStep::Description), Field::Title, free_text(input)?),
        LessonStep::Description => advance(
            to(LessonStep::Material),
            Field::Description,
            free_text(input)?,
        ),
        LessonStep::Material => commit(Field::Material, optional_text(input)?),
    })
}

fn parse_options(input: &Input) -> Result<Vec<String>, String> {
    let text = input.as_text().unwrap_or_default();
    let options: Vec<String> = text.split(',').map(|o| o.trim().to_string()).collect();
    if options.iter().any(String::is_empty) {
        return Err("Options cannot be empty. Separate them with commas.".to_string());
    }
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(format!(
            "Please enter {MIN_OPTIONS} to {MAX_OPTIONS} options separated by commas."
        ));
    }
    Ok(options)
}

fn question_step(step: QuestionStep, fields: &Fields, input: &Input) -> Result<Transition, String> {
    let to = Step::Question;
    Ok(match step {
        QuestionStep::Lesson => advance(
            to(QuestionStep::Text),
            Field::LessonId,
            pick(input, fields.choices(), "lessons")?,
        ),
        QuestionStep::Text => advance(
            to(QuestionStep::Options),
            Field::QuestionText,
            free_text(input)?,
        ),
        QuestionStep::Options => advance(
            to(QuestionStep::CorrectOption),
            Field::Options,
            FieldValue::List(parse_options(input)?),
        ),
        QuestionStep::CorrectOption => {
            let count = fields.list(Field::Options).map_or(0, <[String]>::len);
            let number = input
                .as_text()
                .and_then(|text| text.parse::<usize>().ok())
                .filter(|n| (1..=count).contains(n))
                .ok_or_else(|| format!("Please enter a number from 1 to {count}."))?;
            Transition::Commit {
                updates: vec![(Field::CorrectOption, FieldValue::Index(number - 1))],
                then: Some(to(QuestionStep::More)),
                reset: vec![Field::QuestionText, Field::Options, Field::CorrectOption],
            }
        }
        QuestionStep::More => match yes_no(input) {
            Some(true) => Transition::Advance {
                next: to(QuestionStep::Text),
                updates: Vec::new(),
            },
            Some(false) => Transition::Finish {
                message: "✅ Done. All questions were saved.".to_string(),
            },
            None => return Err(YES_NO_HINT.to_string()),
        },
    })
}

fn partner_step(step: PartnerStep, input: &Input) -> Result<Transition, String> {
    let to = Step::Partner;
    Ok(match step {
        PartnerStep::Name => advance(to(PartnerStep::Credo), Field::Name, free_text(input)?),
        PartnerStep::Credo => advance(to(PartnerStep::Logo), Field::Credo, free_text(input)?),
        PartnerStep::Logo => commit(
            Field::Logo,
            optional_image(input, "Please send your logo or a link to it, or type `skip`.")?,
        ),
    })
}

fn quiz_position(fields: &Fields) -> usize {
    fields.index(Field::QuizPosition).unwrap_or(0)
}

/// Accepts the option number or the option text; only the correct answer moves on.
fn quiz_step(fields: &Fields, input: &Input) -> Result<Transition, String> {
    let questions = fields.quiz();
    let position = quiz_position(fields);
    let question = questions
        .get(position)
        .ok_or_else(|| "This test has no more questions.".to_string())?;

    let count = question.options.len();
    let answer = input
        .as_text()
        .and_then(|text| {
            text.parse::<usize>()
                .ok()
                .filter(|n| (1..=count).contains(n))
                .map(|n| n - 1)
                .or_else(|| {
                    question
                        .options
                        .iter()
                        .position(|o| o.eq_ignore_ascii_case(text))
                })
        })
        .ok_or_else(|| format!("Please answer with a number from 1 to {count}."))?;
    if answer != question.correct {
        return Err("Wrong answer. Try again.".to_string());
    }

    let next = position + 1;
    Ok(if next < questions.len() {
        advance(
            Step::Quiz(QuizStep::Answer),
            Field::QuizPosition,
            FieldValue::Index(next),
        )
    } else {
        commit(Field::QuizPosition, FieldValue::Index(next))
    })
}

/// Validates `input` for `step` and decides the next move.
#[must_use]
pub fn transition(step: Step, fields: &Fields, input: &Input, config: &FlowConfig) -> Transition {
    let result = match step {
        Step::Product(step) => product_step(step, input, config),
        Step::Course(step) => course_step(step, input),
        Step::Lesson(step) => lesson_step(step, fields, input),
        Step::Question(step) => question_step(step, fields, input),
        Step::Partner(step) => partner_step(step, input),
        Step::Quiz(QuizStep::Answer) => quiz_step(fields, input),
    };
    result.unwrap_or_else(|message| Transition::Reject { message })
}

fn yes_no_buttons() -> [Button; 2] {
    [Button::new("Yes", "yes"), Button::new("No", "no")]
}

fn choice_prompt(title: &str, choices: &[Choice]) -> Reply {
    let listing = choices
        .iter()
        .map(|c| format!("`{}` {}", c.id, c.label))
        .collect::<Vec<_>>()
        .join("\n");
    Reply::text(format!("{title}\n{listing}")).with_buttons(
        choices
            .iter()
            .take(MAX_CHOICE_BUTTONS)
            .map(|c| Button::new(c.label.clone(), c.id.to_string())),
    )
}

fn quiz_prompt(fields: &Fields) -> Reply {
    let questions = fields.quiz();
    let position = quiz_position(fields);
    let Some(question) = questions.get(position) else {
        return Reply::text("This test has no more questions.");
    };
    let listing = question
        .options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}. {o}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    Reply::text(format!(
        "Question {} of {}: {}\n{listing}",
        position + 1,
        questions.len(),
        question.text
    ))
    .with_buttons(
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| Button::new(o.clone(), (i + 1).to_string())),
    )
}

/// The message asking for `step`'s input.
#[must_use]
pub fn prompt(step: Step, fields: &Fields, config: &FlowConfig) -> Reply {
    match step {
        Step::Product(step) => match step {
            ProductStep::Name => Reply::text("Enter the name of the new product:"),
            ProductStep::Description => Reply::text("Enter the product description:"),
            ProductStep::Category => Reply::text("Choose the product category:").with_buttons(
                config
                    .categories
                    .iter()
                    .map(|c| Button::new(c.label.clone(), c.key.clone())),
            ),
            ProductStep::Price => Reply::text(format!(
                "Enter the product price in {} (e.g. 10 or 10.50):",
                config.currency
            )),
            ProductStep::Image => {
                Reply::text("Send a picture of the product, or type `skip` to go without one.")
            }
            ProductStep::Subscription => {
                Reply::text("Is this product a subscription?").with_buttons(yes_no_buttons())
            }
            ProductStep::Period => Reply::text("Enter the subscription period in months:"),
            ProductStep::Hide => Reply::text(
                "Hide the product from the catalogue? Hidden products can only be found by their code.",
            )
            .with_buttons([
                Button::new("Hide", "hide"),
                Button::new("Keep visible", "show"),
            ]),
        },
        Step::Course(CourseStep::Title) => Reply::text("Enter the title of the new course:"),
        Step::Course(CourseStep::Description) => Reply::text("Enter the course description:"),
        Step::Lesson(step) => match step {
            LessonStep::Course => {
                choice_prompt("Choose the course to add a lesson to:", fields.choices())
            }
            LessonStep::Title => Reply::text("Enter the title of the new lesson:"),
            LessonStep::Description => Reply::text("Enter the lesson description:"),
            LessonStep::Material => {
                Reply::text("Send a link to the lesson material, or type `skip`.")
            }
        },
        Step::Question(step) => match step {
            QuestionStep::Lesson => {
                choice_prompt("Choose the lesson to add a question to:", fields.choices())
            }
            QuestionStep::Text => Reply::text("Enter the question text:"),
            QuestionStep::Options => Reply::text(format!(
                "Enter {MIN_OPTIONS} to {MAX_OPTIONS} answer options separated by commas:"
            )),
            QuestionStep::CorrectOption => {
                let options = fields.list(Field::Options).unwrap_or_default();
                let listing = options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| format!("{}. {o}", i + 1))
                    .collect::<Vec<_>>()
                    .join("\n");
                Reply::text(format!("Which answer is correct?\n{listing}")).with_buttons(
                    (1..=options.len()).map(|n| Button::new(n.to_string(), n.to_string())),
                )
            }
            QuestionStep::More => {
                Reply::text("Add another question to this lesson?").with_buttons(yes_no_buttons())
            }
        },
        Step::Partner(step) => match step {
            PartnerStep::Name => Reply::text("Enter your name or the name of your studio:"),
            PartnerStep::Credo => Reply::text("Describe your credo in a few sentences:"),
            PartnerStep::Logo => Reply::text("Send your logo or a link to it, or type `skip`."),
        },
        Step::Quiz(QuizStep::Answer) => quiz_prompt(fields),
    }
}
