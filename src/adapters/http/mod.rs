//! HTTP adapters - REST API implementations.

pub mod dilemma;

pub use dilemma::{dilemma_router, DilemmaAppState};
