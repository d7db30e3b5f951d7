use thiserror::Error;
use uuid::Uuid;

/// Failure classification exposed by the order service. Nothing from the
/// storage or catalog layers crosses this boundary except the message.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order with id {0} not found")]
    NotFound(Uuid),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Product validation failed: {0}")]
    ValidationFailed(String),
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
    #[error("Product enrichment failed: {0}")]
    EnrichmentFailed(String),
}

/// Errors raised by an [`OrderRepository`](super::ports::OrderRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("blocking task failed: {0}")]
    Task(String),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

/// Errors raised by a [`ProductCatalog`](super::ports::ProductCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product catalog request timed out")]
    Timeout,
    #[error("product catalog unreachable: {0}")]
    Transport(String),
    #[error("product catalog rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("product catalog unavailable ({status})")]
    Unavailable { status: u16 },
    #[error("invalid product catalog response: {0}")]
    InvalidResponse(String),
}
