//! DecisionRecord - the structured artifact produced by a completed run.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// The final, validated decision record.
///
/// Every required field must be present and non-empty; a record that fails
/// validation is rejected rather than patched with placeholder values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// The single selected course of action.
    pub decision: String,
    /// Why this course of action was selected.
    pub rationale: String,
    /// Ordered risks of the selected course of action.
    pub risks: Vec<String>,
    /// Ordered concrete steps to execute the decision.
    pub action_plan: Vec<String>,
    /// Emotional signals detected in the dilemma, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<Vec<String>>,
    /// Cognitive distortion patterns detected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distortions: Option<Vec<String>>,
    /// Personalized capability affirmation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affirmation: Option<String>,
    /// When the record was produced.
    #[serde(default)]
    pub created_at: Timestamp,
}

impl DecisionRecord {
    /// Validates the non-empty invariants.
    ///
    /// `decision` and `rationale` must be non-empty strings, `risks` and
    /// `action_plan` must be non-empty sequences of non-empty strings, and
    /// optional fields follow the same per-element rule when present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.decision.trim().is_empty() {
            return Err(ValidationError::empty_field("decision"));
        }
        if self.rationale.trim().is_empty() {
            return Err(ValidationError::empty_field("rationale"));
        }

        Self::validate_sequence("risks", &self.risks)?;
        Self::validate_sequence("action_plan", &self.action_plan)?;

        if let Some(emotions) = &self.emotions {
            Self::validate_elements("emotions", emotions)?;
        }
        if let Some(distortions) = &self.distortions {
            Self::validate_elements("distortions", distortions)?;
        }
        if let Some(affirmation) = &self.affirmation {
            if affirmation.trim().is_empty() {
                return Err(ValidationError::empty_field("affirmation"));
            }
        }

        Ok(())
    }

    fn validate_sequence(field: &str, items: &[String]) -> Result<(), ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::empty_field(field));
        }
        Self::validate_elements(field, items)
    }

    fn validate_elements(field: &str, items: &[String]) -> Result<(), ValidationError> {
        for item in items {
            if item.trim().is_empty() {
                return Err(ValidationError::invalid_format(
                    field,
                    "contains an empty element",
                ));
            }
        }
        Ok(())
    }
}
