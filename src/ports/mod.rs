//! Ports - trait seams between the domain and infrastructure.

mod model_client;
mod run_repository;

pub use model_client::{
    ModelClient, ModelError, ModelRequest, ModelResponse, ProviderInfo, RetryPolicy,
};
pub use run_repository::{DecisionSummary, RepositoryError, RunRepository};
