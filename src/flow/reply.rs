//! Platform-neutral replies produced by the flow engine.
//!
//! The bot layer renders these into messages with button rows.

/// A button offered with a reply. Pressing it sends `payload` back as
/// [`crate::flow::Input::Choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label
    pub label: String,
    /// Value delivered when pressed
    pub payload: String,
}

impl Button {
    /// Creates a button.
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Message to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    /// Message body
    pub text: String,
    /// Buttons, in display order
    pub buttons: Vec<Button>,
    /// Image URL to attach
    pub image: Option<String>,
}

impl Reply {
    /// Text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Adds buttons.
    #[must_use]
    pub fn with_buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.buttons.extend(buttons);
        self
    }

    /// Prepends a paragraph, keeping the buttons.
    #[must_use]
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.text = format!("{prefix}\n\n{}", self.text);
        self
    }
}
