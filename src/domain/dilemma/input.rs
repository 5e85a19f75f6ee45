//! DilemmaInput value object - the user's free-text submission.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Minimum accepted dilemma length in characters.
pub const MIN_DILEMMA_CHARS: usize = 20;

/// Maximum accepted dilemma length in characters.
pub const MAX_DILEMMA_CHARS: usize = 3000;

/// The user's dilemma text, validated at construction and immutable after.
///
/// Length bounds are checked before any model call is made, so an
/// out-of-bounds submission never costs a provider round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DilemmaInput(String);

impl DilemmaInput {
    /// Creates a validated dilemma input.
    ///
    /// Leading and trailing whitespace is trimmed before the length check.
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into().trim().to_string();
        let length = text.chars().count();

        if length < MIN_DILEMMA_CHARS || length > MAX_DILEMMA_CHARS {
            return Err(ValidationError::out_of_range(
                "dilemma",
                MIN_DILEMMA_CHARS,
                MAX_DILEMMA_CHARS,
                length,
            ));
        }

        Ok(Self(text))
    }

    /// Returns the dilemma text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the character count.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false: empty input cannot be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns a truncated preview for history listings.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.len() <= max_chars {
            self.0.clone()
        } else {
            let truncated: String = self.0.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }
}
