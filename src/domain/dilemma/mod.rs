//! Dilemma module - User input and the structured decision artifact.

mod coercion;
mod input;
mod record;

pub use coercion::{coerce, CoercionFailure};
pub use input::{DilemmaInput, MAX_DILEMMA_CHARS, MIN_DILEMMA_CHARS};
pub use record::DecisionRecord;
