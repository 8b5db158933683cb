//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete,
//! button clicks, and plain messages that feed guided flows.

/// Autocomplete handlers for product codes
pub mod autocomplete;
/// Message and button routing
pub mod events;
/// Conversion of replies into Discord builders
pub mod render;
