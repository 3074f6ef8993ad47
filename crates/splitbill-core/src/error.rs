//! # Error Types
//!
//! Domain-specific error types for splitbill-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  splitbill-core errors (this file)                                     │
//! │  ├── CoreError        - Store Adapter failures (NotFound, Conflict...) │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  splitbill-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures → CoreError        │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Client                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The allocation calculator itself never fails; empty collections produce
//! zero-valued results.

use thiserror::Error;

use crate::types::{BillId, BillStatus, ItemId, ParticipantId};

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while validating or applying a mutation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input was rejected before anything was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// Item does not exist, or exists on another bill.
    #[error("Item {item_id} not found")]
    ItemNotFound { item_id: ItemId },

    /// Participant does not exist, or belongs to another bill.
    #[error("Participant {participant_id} not found in bill {bill_id}")]
    ParticipantNotFound {
        bill_id: BillId,
        participant_id: ParticipantId,
    },

    #[error("Item {item_id} is not assigned to participant {participant_id}")]
    AssignmentNotFound {
        item_id: ItemId,
        participant_id: ParticipantId,
    },

    /// The (item, participant) pair already exists.
    ///
    /// ## When This Occurs
    /// ```text
    /// assign(item 7, participant 2)  → Ok
    /// assign(item 7, participant 2)  → DuplicateAssignment
    /// ```
    /// Concurrent double submissions also land here; callers may treat it
    /// as an idempotent no-op.
    #[error("Item {item_id} is already assigned to participant {participant_id}")]
    DuplicateAssignment {
        item_id: ItemId,
        participant_id: ParticipantId,
    },

    #[error("Bill {bill_id} is {current}, cannot move to {requested}")]
    InvalidStatusTransition {
        bill_id: BillId,
        current: BillStatus,
        requested: BillStatus,
    },

    /// The external extraction workflow reported a failure.
    #[error("Extraction failed for bill {bill_id}: {reason}")]
    ExtractionFailed { bill_id: BillId, reason: String },

    /// The persistence layer failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse error categories, one per failure class callers handle differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ExternalWorkflow,
    Storage,
}

impl CoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::BillNotFound(_)
            | CoreError::ItemNotFound { .. }
            | CoreError::ParticipantNotFound { .. }
            | CoreError::AssignmentNotFound { .. } => ErrorKind::NotFound,
            CoreError::DuplicateAssignment { .. } | CoreError::InvalidStatusTransition { .. } => {
                ErrorKind::Conflict
            }
            CoreError::ExtractionFailed { .. } => ErrorKind::ExternalWorkflow,
            CoreError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Creates a storage error from anything printable.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        CoreError::Storage(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any mutation; nothing is partially applied.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Monetary amount below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} must be at least 1")]
    MustBePositive { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A partial update carried no fields.
    #[error("No fields to update")]
    NoChanges,

    /// Invalid format (e.g. non-finite number, malformed JSON).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An extracted line item failed validation.
    #[error("item {index}: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub(crate) fn out_of_range(field: &str, min: i64, max: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        }
    }

    /// The bill already has [`MAX_PARTICIPANTS`](crate::MAX_PARTICIPANTS).
    pub fn too_many_participants() -> Self {
        ValidationError::out_of_range("participants", 0, crate::MAX_PARTICIPANTS as i64)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateAssignment {
            item_id: 7,
            participant_id: 2,
        };
        assert_eq!(
            err.to_string(),
            "Item 7 is already assigned to participant 2"
        );

        let err = ValidationError::required("name");
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidItem {
            index: 3,
            source: Box::new(ValidationError::negative("price")),
        };
        assert_eq!(err.to_string(), "item 3: price must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::NoChanges.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_error_kinds() {
        let bill_id = Uuid::new_v4();
        assert_eq!(CoreError::BillNotFound(bill_id).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::ItemNotFound { item_id: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::DuplicateAssignment {
                item_id: 1,
                participant_id: 1
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::ExtractionFailed {
                bill_id,
                reason: "timeout".into()
            }
            .kind(),
            ErrorKind::ExternalWorkflow
        );
        assert_eq!(CoreError::storage("disk full").kind(), ErrorKind::Storage);
    }
}
