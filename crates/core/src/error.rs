use crate::types::DbId;

/// Domain error surfaced at the scheduling boundary.
///
/// Every failure kind stays distinct so callers (HTTP, RPC, CLI) can map
/// them without string matching.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Illegal {entity} transition: {from} -> {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Scheduling conflict: {0}")]
    SchedulingConflict(String),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Consultation {consultation_id} has already been rated")]
    AlreadyRated { consultation_id: DbId },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Error returned by store and directory adapters.
///
/// Adapters know nothing about the domain taxonomy; the conversion into
/// [`CoreError`] happens at the scheduling boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The row addressed by a write does not exist.
    #[error("{entity} with id {id} does not exist")]
    Missing { entity: &'static str, id: DbId },

    /// The backend rejected a write because it would overlap an existing
    /// confirmed booking (e.g. a Postgres exclusion constraint).
    #[error("overlapping booking rejected by storage: {0}")]
    Overlap(String),

    /// Connection loss, constraint violation or any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Overlap(detail) => CoreError::SchedulingConflict(detail),
            StoreError::Backend(detail) => CoreError::Persistence(detail),
        }
    }
}
