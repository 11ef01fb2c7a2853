//! Value objects for user-visible workflow state.

pub mod messages;

pub use messages::{RequestMessage, SubmitMessage};
