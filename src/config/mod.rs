/// Operator identity from environment variables
pub mod admin;

/// Database configuration and connection management
pub mod database;

/// Shop settings loaded from config.toml
pub mod settings;
