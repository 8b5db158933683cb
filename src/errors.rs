//! Unified error type for `VedShop`.
//!
//! Domain failures (validation, missing records, insufficient funds, referral
//! misuse, authorization) are separate variants so command handlers can turn
//! them into user-facing replies, while infrastructure failures (database,
//! framework, configuration) propagate to the framework error handler.

use crate::core::money::Amount;
use thiserror::Error;

/// All errors produced by the bot and its business logic.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Required environment variable missing or invalid
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed user input
    #[error("Invalid input: {message}")]
    Validation {
        /// Human-readable reason, shown to the user
        message: String,
    },

    /// A monetary value that cannot be used (negative, too precise, overflow)
    #[error("Invalid amount: {input}")]
    InvalidAmount {
        /// The rejected input as typed or computed
        input: String,
    },

    /// A course, lesson, question or other record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The user has never registered with `/start`
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// Chat identity of the user
        user_id: String,
    },

    /// No product with this id or code
    #[error("Product not found: {reference}")]
    ProductNotFound {
        /// Product id or code
        reference: String,
    },

    /// Balance does not cover the price
    #[error("Insufficient funds: balance {current}, required {required}")]
    InsufficientFunds {
        /// Balance at the time of the attempt
        current: Amount,
        /// Price of the product
        required: Amount,
    },

    /// A user tried to refer themselves
    #[error("Users cannot refer themselves")]
    SelfReferral,

    /// The `/start` argument is not a referral code
    #[error("Invalid referral code: {code}")]
    InvalidReferralCode {
        /// The rejected argument
        code: String,
    },

    /// Caller lacks the role or identity for this command
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// What was refused
        message: String,
    },

    /// Plain input arrived for a user with no guided flow in progress
    #[error("No active session for user {user_id}")]
    NoActiveSession {
        /// Chat identity of the user
        user_id: String,
    },

    /// Serenity/Poise failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Whether this error is caused by the user's request rather than the
    /// infrastructure, i.e. whether it is safe to show its text verbatim.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::NotFound { .. }
                | Self::UserNotFound { .. }
                | Self::ProductNotFound { .. }
                | Self::InsufficientFunds { .. }
                | Self::SelfReferral
                | Self::InvalidReferralCode { .. }
                | Self::Unauthorized { .. }
                | Self::NoActiveSession { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
