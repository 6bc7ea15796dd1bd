//! Error handling for tokenline-store
//!
//! Wraps the core LedgerError facility with store-specific helpers

use tokenline_core::{LedgerError, LedgerErrorKind};

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Create an error of the given kind from a rusqlite error
pub fn from_rusqlite(kind: LedgerErrorKind, op: &str, err: rusqlite::Error) -> LedgerError {
    LedgerError::new(kind)
        .with_op(op)
        .with_message(err.to_string())
}

/// Create an error for a read that failed at the database
///
/// Row-shape failures (wrong type or missing column in a returned row) mean
/// the stored data has drifted from the schema and are classified `Decode`;
/// everything else is a `Query` failure.
pub fn read_error(op: &str, err: rusqlite::Error) -> LedgerError {
    let kind = match &err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnName(_) => LedgerErrorKind::Decode,
        _ => LedgerErrorKind::Query,
    };
    from_rusqlite(kind, op, err)
}

/// Create a decode error for a single malformed column
pub fn decode_error(column: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::new(LedgerErrorKind::Decode)
        .with_field(column)
        .with_message(reason)
}

/// Create a filter translation error for an offending field
pub fn filter_field_error(field: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::new(LedgerErrorKind::FilterBuild)
        .with_field(field)
        .with_message(reason)
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> LedgerError {
    LedgerError::new(LedgerErrorKind::Migration)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Check whether a rusqlite error is a uniqueness-constraint violation
///
/// Both UNIQUE-index and primary-key violations count: either one means the
/// row we tried to insert collides with an existing row.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
