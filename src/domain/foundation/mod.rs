//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers, value objects, and error types that form
//! the vocabulary of the Crossroads domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{RunId, UserId};
pub use timestamp::Timestamp;
