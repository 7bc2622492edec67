//! Outbound integrations for the outfit planner.
//!
//! The planner only sees the `CompletionClient` trait from `wardrobe-core`;
//! this crate supplies the HTTP implementation behind it.

pub mod llm;

pub use llm::{completion_client, HttpCompletionClient};
