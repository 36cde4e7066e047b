//! Core error types for curia.
//!
//! [`CuriaError`] covers every failure the query pipeline can report:
//! configuration mistakes caught while building a query, validation failures
//! caught before compilation, and errors surfaced verbatim by a database
//! driver.

use thiserror::Error;

/// The primary error type for curia.
///
/// The variants are grouped by when they are raised:
///
/// - configuration errors are programmer mistakes and are never retried
/// - validation errors reject a query before any SQL is produced
/// - database errors come from the execution adapter unchanged
#[derive(Error, Debug)]
pub enum CuriaError {
    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid, or an API was misused
    /// (unknown binding category, non-numeric increment amount, unknown
    /// connection name).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// The query description was rejected before compilation.
    #[error("Validation error: {0}")]
    ValidationError(String),

    // ── Database ─────────────────────────────────────────────────────

    /// A generic error reported by the database driver.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    /// A lookup that required a result found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CuriaError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::DatabaseError(message.into())
    }

    /// Returns `true` for errors raised by the driver rather than by curia.
    pub const fn is_database_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::IntegrityError(_) | Self::OperationalError(_)
        )
    }

    /// Returns `true` if this is a "does not exist" error.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DoesNotExist(_))
    }
}

/// A convenience type alias for `Result<T, CuriaError>`.
pub type CuriaResult<T> = Result<T, CuriaError>;
