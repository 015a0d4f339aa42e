// errors.rs
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Internal Server Error")]
    InternalError,
}

/// Caller-side contract violations of the matcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Why a listing record can't take part in matching.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("listing {id}: missing required field `{field}`")]
    MissingField { id: i64, field: &'static str },
    #[error("listing {id}: {reason}")]
    Invalid { id: i64, reason: String },
}
