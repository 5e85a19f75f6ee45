//! Storage adapters - RunRepository implementations.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryRunRepository;
pub use postgres::PostgresRunRepository;
