//! Domain layer - Pure business logic with no infrastructure dependencies.

pub mod dilemma;
pub mod foundation;
pub mod pipeline;
