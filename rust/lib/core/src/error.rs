use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these,
// never on the human-readable message string.

/// Stable error code constants.
///
/// The CLI prints errors as `error[NOT_FOUND]: product lot 'x' not found`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const INVALID_QUANTITY: &str = "INVALID_QUANTITY";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const CORRUPT_RECORD: &str = "CORRUPT_RECORD";
    pub const AMBIGUOUS: &str = "AMBIGUOUS";
    pub const CYCLE_DETECTED: &str = "CYCLE_DETECTED";
    pub const CONFLICT: &str = "CONFLICT";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across the trace module and the CLI.
///
/// Each variant maps to a stable error code (see [`error_code`]).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate id or business key.
    #[error("{0}")]
    AlreadyExists(String),

    /// Non-positive, non-finite, or over-available quantity.
    #[error("{0}")]
    InvalidQuantity(String),

    /// Request is malformed (empty id, no inputs, ...).
    #[error("{0}")]
    Validation(String),

    /// Stored bytes do not decode into the expected record shape.
    #[error("{0}")]
    CorruptRecord(String),

    /// A uniqueness invariant was found violated at read time.
    #[error("{0}")]
    Ambiguous(String),

    /// The lineage walk revisited a product on its own path.
    #[error("{0}")]
    CycleDetected(String),

    /// A commit precondition failed; the state changed underneath the call.
    #[error("{0}")]
    Conflict(String),

    /// Storage backend failure, passed through.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::AlreadyExists(_) => error_code::ALREADY_EXISTS,
            ServiceError::InvalidQuantity(_) => error_code::INVALID_QUANTITY,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::CorruptRecord(_) => error_code::CORRUPT_RECORD,
            ServiceError::Ambiguous(_) => error_code::AMBIGUOUS,
            ServiceError::CycleDetected(_) => error_code::CYCLE_DETECTED,
            ServiceError::Conflict(_) => error_code::CONFLICT,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// Process exit code the CLI uses for this error.
    ///
    /// Caller mistakes exit with 1, data-integrity problems with 2,
    /// infrastructure failures with 3.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::NotFound(_)
            | ServiceError::AlreadyExists(_)
            | ServiceError::InvalidQuantity(_)
            | ServiceError::Validation(_)
            | ServiceError::Conflict(_) => 1,
            ServiceError::CorruptRecord(_)
            | ServiceError::Ambiguous(_)
            | ServiceError::CycleDetected(_) => 2,
            ServiceError::Storage(_) | ServiceError::Internal(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(ServiceError::AlreadyExists("x".into()).error_code(), "ALREADY_EXISTS");
        assert_eq!(ServiceError::InvalidQuantity("x".into()).error_code(), "INVALID_QUANTITY");
        assert_eq!(ServiceError::Validation("x".into()).error_code(), "VALIDATION_FAILED");
        assert_eq!(ServiceError::CorruptRecord("x".into()).error_code(), "CORRUPT_RECORD");
        assert_eq!(ServiceError::Ambiguous("x".into()).error_code(), "AMBIGUOUS");
        assert_eq!(ServiceError::CycleDetected("x".into()).error_code(), "CYCLE_DETECTED");
        assert_eq!(ServiceError::Conflict("x".into()).error_code(), "CONFLICT");
        assert_eq!(ServiceError::Storage("x".into()).error_code(), "STORAGE_ERROR");
        assert_eq!(ServiceError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn exit_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).exit_code(), 1);
        assert_eq!(ServiceError::Conflict("x".into()).exit_code(), 1);
        assert_eq!(ServiceError::CycleDetected("x".into()).exit_code(), 2);
        assert_eq!(ServiceError::Storage("x".into()).exit_code(), 3);
    }

    #[test]
    fn error_display_is_just_message() {
        assert_eq!(ServiceError::NotFound("lot 123".into()).to_string(), "lot 123");
        assert_eq!(ServiceError::AlreadyExists("dup key".into()).to_string(), "dup key");
        assert_eq!(ServiceError::InvalidQuantity("too much".into()).to_string(), "too much");
    }
}
