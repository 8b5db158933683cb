//! Core business logic, independent of the chat framework.
//!
//! Every function takes a database connection and returns [`crate::errors::Result`],
//! so the same operations back slash commands, guided flows and tests.

pub mod course;
pub mod inquiry;
pub mod ledger;
pub mod money;
pub mod partner;
pub mod product;
pub mod user;
