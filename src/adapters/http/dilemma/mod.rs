//! HTTP adapter for the dilemma pipeline.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::DilemmaAppState;
pub use routes::dilemma_router;
