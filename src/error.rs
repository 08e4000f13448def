//! Care Error Types
//!
//! Every failure the engine can report. Variants carry the ids and the
//! current vs requested values so callers can act without re-reading.

use thiserror::Error;

use crate::core_types::{EntityKind, HospitalId, PatientId};
use crate::store::StoreError;
use crate::transfer::state::TransferStatus;
use crate::transfer::types::TransferId;

/// Result alias used by the engine
pub type CareResult<T> = Result<T, CareError>;

/// Engine error types
///
/// Error codes are stable strings for API responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CareError {
    // === Lookup Errors ===
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    // === Validation Errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Patient {patient_id} is at hospital {actual}, expected hospital {expected}")]
    LocationMismatch {
        patient_id: PatientId,
        expected: HospitalId,
        actual: HospitalId,
    },

    #[error("Hospital {hospital_id} has no available beds (capacity {capacity})")]
    CapacityExceeded {
        hospital_id: HospitalId,
        capacity: u32,
    },

    #[error("Patient {patient_id} already has active transfer {existing} ({status})")]
    ConflictingTransfer {
        patient_id: PatientId,
        existing: TransferId,
        status: TransferStatus,
    },

    // === State Machine Errors ===
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransferStatus,
        to: TransferStatus,
    },

    #[error("Transfer {0} is already cancelled")]
    AlreadyCancelled(TransferId),

    // === System Errors ===
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Record store error: {0}")]
    Store(String),
}

impl CareError {
    /// Shorthand for a missing entity
    pub fn not_found(entity: EntityKind, key: impl ToString) -> Self {
        CareError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CareError::NotFound { .. } => "NOT_FOUND",
            CareError::InvalidInput(_) => "INVALID_INPUT",
            CareError::LocationMismatch { .. } => "LOCATION_MISMATCH",
            CareError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            CareError::ConflictingTransfer { .. } => "CONFLICTING_TRANSFER",
            CareError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CareError::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            CareError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            CareError::Store(_) => "STORE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            CareError::NotFound { .. } => 404,
            CareError::InvalidInput(_) => 400,
            CareError::LocationMismatch { .. }
            | CareError::CapacityExceeded { .. }
            | CareError::ConflictingTransfer { .. }
            | CareError::InvalidTransition { .. }
            | CareError::AlreadyCancelled(_) => 409,
            CareError::InvariantViolation(_) => 500,
            CareError::Store(_) => 503,
        }
    }
}

impl From<StoreError> for CareError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey { entity, key } => {
                CareError::InvalidInput(format!("{entity} with key '{key}' already exists"))
            }
            StoreError::Unavailable(msg) => CareError::Store(msg),
            // Lost compare-and-swap or a record vanished mid-operation:
            // another writer raced this one.
            other @ (StoreError::AlreadyExists { .. }
            | StoreError::Missing { .. }
            | StoreError::VersionConflict { .. }
            | StoreError::DuplicateMutation { .. }) => {
                CareError::InvariantViolation(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CareError::not_found(EntityKind::Patient, 7).code(),
            "NOT_FOUND"
        );
        assert_eq!(
            CareError::CapacityExceeded {
                hospital_id: 1,
                capacity: 5
            }
            .code(),
            "CAPACITY_EXCEEDED"
        );
        assert_eq!(
            CareError::AlreadyCancelled(TransferId::new()).code(),
            "ALREADY_CANCELLED"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(CareError::not_found(EntityKind::Hospital, 1).http_status(), 404);
        assert_eq!(CareError::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(
            CareError::InvalidTransition {
                from: TransferStatus::Completed,
                to: TransferStatus::Cancelled
            }
            .http_status(),
            409
        );
        assert_eq!(CareError::InvariantViolation("x".into()).http_status(), 500);
        assert_eq!(CareError::Store("down".into()).http_status(), 503);
    }

    #[test]
    fn test_from_store_error() {
        use crate::store::RecordKey;

        let conflict = StoreError::VersionConflict {
            key: RecordKey::Hospital(1),
            expected: 1,
            actual: 2,
        };
        assert!(matches!(
            CareError::from(conflict),
            CareError::InvariantViolation(_)
        ));

        let dup = StoreError::DuplicateKey {
            entity: EntityKind::Patient,
            key: "MRN1".into(),
        };
        assert_eq!(
            CareError::from(dup),
            CareError::InvalidInput("Patient with key 'MRN1' already exists".into())
        );

        assert_eq!(
            CareError::from(StoreError::Unavailable("down".into())),
            CareError::Store("down".into())
        );
    }

    #[test]
    fn test_display() {
        let err = CareError::LocationMismatch {
            patient_id: 3,
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Patient 3 is at hospital 2, expected hospital 1"
        );

        let err = CareError::InvalidTransition {
            from: TransferStatus::Completed,
            to: TransferStatus::InProgress,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition: COMPLETED -> IN_PROGRESS"
        );
    }
}
