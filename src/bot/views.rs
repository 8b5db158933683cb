//! Message views shared by commands and interaction handlers.
//!
//! Views are built as [`Reply`] values so they can be tested without Discord.
//! Button payloads double as component custom IDs; [`parse_custom_id`] maps
//! them back to an [`Action`].

use crate::{
    config::settings::Settings,
    core::{ledger::PurchaseConfirmation, money::Amount, product::ProductPage},
    entities::{course, lesson, product, question},
    errors::{Error, Result},
    flow::{Button, Reply},
};

const FLOW_PREFIX: &str = "flow:";
const PAGE_PREFIX: &str = "page:";
const PRODUCT_PREFIX: &str = "product:";
const BUY_PREFIX: &str = "buy:";

/// What a pressed button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Answer to the active flow step
    Flow(String),
    /// Show a catalogue page (1-based)
    Page(u64),
    /// Show a product card
    Product(i64),
    /// Buy a product
    Buy(i64),
}

/// Decodes a component custom ID.
#[must_use]
pub fn parse_custom_id(custom_id: &str) -> Option<Action> {
    if let Some(payload) = custom_id.strip_prefix(FLOW_PREFIX) {
        return Some(Action::Flow(payload.to_string()));
    }
    if let Some(page) = custom_id.strip_prefix(PAGE_PREFIX) {
        return page.parse().ok().map(Action::Page);
    }
    if let Some(id) = custom_id.strip_prefix(PRODUCT_PREFIX) {
        return id.parse().ok().map(Action::Product);
    }
    custom_id
        .strip_prefix(BUY_PREFIX)
        .and_then(|id| id.parse().ok())
        .map(Action::Buy)
}

/// Tags a flow reply's buttons so presses are routed back to the flow engine.
#[must_use]
pub fn flow_reply(mut reply: Reply) -> Reply {
    for button in &mut reply.buttons {
        button.payload = format!("{FLOW_PREFIX}{}", button.payload);
    }
    reply
}

/// One catalogue page with a button per product and page navigation.
#[must_use]
pub fn catalogue_page(page: &ProductPage, settings: &Settings) -> Reply {
    if page.products.is_empty() {
        return Reply::text("The catalogue is empty for now.");
    }

    let lines = page
        .products
        .iter()
        .map(|p| {
            format!(
                "• **{}** - {} (`{}`)",
                p.name,
                settings.format_amount(Amount::from_minor(p.price)),
                p.code
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut buttons: Vec<Button> = page
        .products
        .iter()
        .map(|p| Button::new(p.name.clone(), format!("{PRODUCT_PREFIX}{}", p.id)))
        .collect();
    if page.has_previous() {
        buttons.push(Button::new("◀ Previous", format!("{PAGE_PREFIX}{}", page.page - 1)));
    }
    if page.has_next() {
        buttons.push(Button::new("Next ▶", format!("{PAGE_PREFIX}{}", page.page + 1)));
    }

    Reply::text(format!(
        "**Products** (page {}/{})\n{lines}",
        page.page, page.total_pages
    ))
    .with_buttons(buttons)
}

/// Full product card with a buy button.
#[must_use]
pub fn product_card(product: &product::Model, settings: &Settings) -> Reply {
    let price = settings.format_amount(Amount::from_minor(product.price));
    let category = settings
        .category(&product.category)
        .map_or(product.category.as_str(), |c| c.label.as_str());
    let kind = match product.subscription_period {
        Some(months) if product.is_subscription => format!("Subscription, every {months} month(s)"),
        _ => "One-time purchase".to_string(),
    };

    let mut reply = Reply::text(format!(
        "**{}**\n{}\n\nCategory: {category}\nPrice: {price}\n{kind}\nCode: `{}`",
        product.name, product.description, product.code
    ))
    .with_buttons([Button::new(
        format!("Buy for {price}"),
        format!("{BUY_PREFIX}{}", product.id),
    )]);
    reply.image.clone_from(&product.image_ref);
    reply
}

/// Turns a purchase attempt into the message for the buyer.
///
/// # Errors
/// Passes through failures that are not the buyer's doing.
pub fn purchase_outcome(
    result: Result<PurchaseConfirmation>,
    settings: &Settings,
) -> Result<String> {
    match result {
        Ok(confirmation) => Ok(format!(
            "✅ You bought **{}** for {}.\nNew balance: {}",
            confirmation.product.name,
            settings.format_amount(Amount::from_minor(confirmation.purchase.amount)),
            settings.format_amount(confirmation.new_balance)
        )),
        Err(Error::InsufficientFunds { current, required }) => Ok(format!(
            "❌ Not enough funds: the price is {}, your balance is {}.",
            settings.format_amount(required),
            settings.format_amount(current)
        )),
        Err(Error::UserNotFound { .. }) => Ok("❌ Please run `/start` first.".to_string()),
        Err(Error::ProductNotFound { .. }) => Ok("❌ This product does not exist.".to_string()),
        Err(e) => Err(e),
    }
}

/// Lists courses as `ID - title` lines.
#[must_use]
pub fn course_list(courses: &[course::Model]) -> String {
    courses
        .iter()
        .map(|c| format!("`{}` **{}** - {}", c.id, c.title, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shows a lesson with its material link.
#[must_use]
pub fn lesson_details(lesson: &lesson::Model) -> String {
    let material = lesson
        .material_link
        .as_deref()
        .map_or_else(String::new, |link| format!("\nMaterial: {link}"));
    format!(
        "`{}` **{}**\n{}{material}",
        lesson.id, lesson.title, lesson.description
    )
}

/// Shows a question with numbered options, marking the correct one.
#[must_use]
pub fn question_details(question: &question::Model) -> String {
    let correct = usize::try_from(question.correct_option).ok();
    let options = question
        .option_list()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let mark = if Some(i) == correct { " ✅" } else { "" };
            format!("  {}. {option}{mark}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("**{}**\n{options}", question.text)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Utc;

    fn sample_product(id: i64) -> product::Model {
        product::Model {
            id,
            name: format!("Product {id}"),
            description: "Description".to_string(),
            price: 1050,
            is_subscription: false,
            subscription_period: None,
            partner_id: "1".to_string(),
            image_ref: Some("https://cdn.example/p.png".to_string()),
            category: "retreat".to_string(),
            code: format!("PRD-0000000{id}"),
            is_hidden: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_custom_id() {
        assert_eq!(parse_custom_id("flow:yes"), Some(Action::Flow("yes".into())));
        assert_eq!(parse_custom_id("page:3"), Some(Action::Page(3)));
        assert_eq!(parse_custom_id("product:12"), Some(Action::Product(12)));
        assert_eq!(parse_custom_id("buy:12"), Some(Action::Buy(12)));
        assert_eq!(parse_custom_id("buy:twelve"), None);
        assert_eq!(parse_custom_id("unknown"), None);
    }

    #[test]
    fn test_flow_reply_prefixes_payloads() {
        let reply = flow_reply(Reply::text("Pick").with_buttons([Button::new("Yes", "yes")]));
        assert_eq!(
            parse_custom_id(&reply.buttons[0].payload),
            Some(Action::Flow("yes".into()))
        );
    }

    #[test]
    fn test_catalogue_page_navigation() {
        let settings = Settings::default();
        let page = ProductPage {
            products: vec![sample_product(1), sample_product(2)],
            page: 2,
            total_pages: 3,
        };
        let reply = catalogue_page(&page, &settings);
        assert!(reply.text.contains("page 2/3"));
        assert!(reply.text.contains("10.50 VED"));
        let payloads: Vec<&str> = reply.buttons.iter().map(|b| b.payload.as_str()).collect();
        assert_eq!(payloads, vec!["product:1", "product:2", "page:1", "page:3"]);
    }

    #[test]
    fn test_product_card() {
        let reply = product_card(&sample_product(5), &Settings::default());
        assert!(reply.text.contains("Corporate retreat"));
        assert!(reply.text.contains("One-time purchase"));
        assert_eq!(reply.buttons[0].payload, "buy:5");
        assert_eq!(reply.image.as_deref(), Some("https://cdn.example/p.png"));
    }

    #[test]
    fn test_purchase_outcome_messages() {
        let settings = Settings::default();
        let text = purchase_outcome(
            Err(Error::InsufficientFunds {
                current: Amount::from_major(5),
                required: Amount::from_major(10),
            }),
            &settings,
        )
        .unwrap();
        assert!(text.contains("10.00 VED"));
        assert!(text.contains("5.00 VED"));

        let infrastructure = purchase_outcome(
            Err(Error::Database(sea_orm::DbErr::Custom("down".into()))),
            &settings,
        );
        assert!(infrastructure.is_err());
    }

    #[test]
    fn test_question_details_marks_correct_option() {
        let question = question::Model {
            id: 1,
            lesson_id: 1,
            text: "Which?".to_string(),
            options: "a\nb".to_string(),
            correct_option: 1,
        };
        let text = question_details(&question);
        assert!(text.contains("2. b ✅"));
        assert!(!text.contains("1. a ✅"));
    }
}
