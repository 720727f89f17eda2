//! # Service Error Types
//!
//! The error type callers of the flows see. Wraps the lower layers
//! transparently so messages read as the underlying error.

use thiserror::Error;

use crate::ai::AiError;
use crate::receipt::ReceiptError;
use marula_core::error::{CoreError, ValidationError};
use marula_db::DbError;

/// Errors surfaced by the service flows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation (validation, balance bounds, state machine).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure on a primary write or read.
    ///
    /// Secondary-write failures never take this path; they are logged and
    /// swallowed inside the flow.
    #[error(transparent)]
    Db(#[from] DbError),

    /// AI endpoint or configuration failure.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Receipt printing failure.
    ///
    /// Flows catch and log these; the variant exists for callers that
    /// print receipts directly.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
