use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by account writes, reads and password checks.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A required field was empty after normalization.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Another account already holds this (normalized) email.
    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("account {0} not found")]
    NotFound(Uuid),

    /// Salt generation or hashing failed; the write was aborted.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The stored password is not a parseable digest.
    #[error("stored password is not a valid digest: {0}")]
    MalformedDigest(String),

    #[error("invalid password hashing parameters: {0}")]
    InvalidHashParams(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccountError {
    /// True for the uniqueness violation on email.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::DuplicateEmail(_))
    }
}
