//! Domain error types.

use common::TrainId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during booking operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Every admission tier on the train is full.
    #[error("No tickets available on train {train_id}")]
    NoTicketsAvailable { train_id: TrainId },

    /// A referenced user, train or booking does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The request itself is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A capacity counter would leave its bounds.
    ///
    /// The tier checks make this unreachable; seeing it means a logic
    /// defect, and the transaction is abandoned.
    #[error("Capacity invariant violated: {0}")]
    InvariantViolation(String),

    /// An error occurred in the reservation store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            other => DomainError::Store(other),
        }
    }
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
