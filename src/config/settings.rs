//! Shop settings loading from config.toml
//!
//! This module provides the operator-tunable parts of the bot: currency label,
//! referral bonus, referral link base, product categories offered in the
//! "add product" flow, and the texts of the info pages. A missing file yields
//! the built-in defaults; a malformed one is a configuration error.

use crate::core::money::Amount;
use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_VAR: &str = "VEDSHOP_CONFIG";

/// Bonus credited to a referrer when not configured: 10 units
pub const DEFAULT_REFERRAL_BONUS: Amount = Amount::from_major(10);

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency label shown next to amounts
    pub currency: String,
    /// Bonus credited to the referrer for each newly registered invitee
    #[serde(deserialize_with = "deserialize_amount")]
    pub referral_bonus: Amount,
    /// Prefix of referral links; the referral code is appended
    pub referral_link_base: String,
    /// Product categories offered when adding a product
    pub categories: Vec<Category>,
    /// Texts of the info pages
    pub info: InfoPages,
}

/// A product category
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Stable key stored on the product
    pub key: String,
    /// Label shown on the button
    pub label: String,
}

/// Static info page texts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InfoPages {
    /// "About us"
    pub about: String,
    /// Platform rules
    pub rules: String,
    /// Feedback and contact details
    pub feedback: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "VED".to_string(),
            referral_bonus: DEFAULT_REFERRAL_BONUS,
            referral_link_base: "https://discord.com/app?start=".to_string(),
            categories: vec![
                Category {
                    key: "retreat".to_string(),
                    label: "Corporate retreat".to_string(),
                },
                Category {
                    key: "session".to_string(),
                    label: "Online session with a therapist".to_string(),
                },
                Category {
                    key: "other".to_string(),
                    label: "Other".to_string(),
                },
            ],
            info: InfoPages::default(),
        }
    }
}

impl Default for InfoPages {
    fn default() -> Self {
        Self {
            about: "We are a group of enthusiasts sharing tools for all-round personal growth."
                .to_string(),
            rules: "Honesty, decency, discipline and care for the world around you.".to_string(),
            feedback: "Questions or suggestions? Message the operator directly.".to_string(),
        }
    }
}

impl Settings {
    /// Looks up a category by its key.
    #[must_use]
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Formats an amount with the configured currency label.
    #[must_use]
    pub fn format_amount(&self, amount: Amount) -> String {
        format!("{amount} {}", self.currency)
    }

    fn validate(self) -> Result<Self> {
        if self.categories.is_empty() {
            return Err(Error::Config {
                message: "At least one product category must be configured".to_string(),
            });
        }
        if self.categories.iter().any(|c| c.key.trim().is_empty()) {
            return Err(Error::Config {
                message: "Product category keys cannot be empty".to_string(),
            });
        }
        Ok(self)
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid, an amount cannot be parsed,
/// or no usable category is configured.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str::<Settings>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?
        .validate()
}

/// Loads settings from a TOML file, falling back to defaults if it does not exist.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(
            "No settings file at {}, using built-in defaults",
            path.display()
        );
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `VEDSHOP_CONFIG`, or `./config.toml` if unset.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings(path)
}
