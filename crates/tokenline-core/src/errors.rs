/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// in the Tokenline persistence layer. Each kind maps to a stable error code
/// that can be used for programmatic error handling, testing, and external
/// API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    // Mutating transaction lifecycle
    /// Transaction could not begin
    Transaction,
    /// Insert failed and the reconciliation read found no existing row
    InsertConflict,
    /// Delete statement failed inside a transaction
    Delete,
    /// Transaction commit failed (the transaction is already aborted)
    Commit,

    // Reads
    /// A read statement failed at the database
    Query,
    /// A returned row does not match the expected column shape or types
    Decode,

    // Filter translation
    /// A filter expression could not be translated into a query
    FilterBuild,

    // Ambient
    Migration,
    Serialization,
    Io,
}

impl LedgerErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            LedgerErrorKind::Transaction => "ERR_TRANSACTION",
            LedgerErrorKind::InsertConflict => "ERR_INSERT_CONFLICT",
            LedgerErrorKind::Delete => "ERR_DELETE",
            LedgerErrorKind::Commit => "ERR_COMMIT",
            LedgerErrorKind::Query => "ERR_QUERY",
            LedgerErrorKind::Decode => "ERR_DECODE",
            LedgerErrorKind::FilterBuild => "ERR_FILTER_BUILD",
            LedgerErrorKind::Migration => "ERR_MIGRATION",
            LedgerErrorKind::Serialization => "ERR_SERIALIZATION",
            LedgerErrorKind::Io => "ERR_IO",
        }
    }
}

/// Canonical structured error type
///
/// Provides a structured representation of errors with classification fields
/// for programmatic handling and rich context for debugging. No operation in
/// this layer retries automatically; every error is local to the call that
/// produced it.
#[derive(Debug, Clone)]
pub struct LedgerError {
    kind: LedgerErrorKind,
    op: Option<String>,
    field: Option<String>,
    namespace: Option<String>,
    message: String,
}

impl LedgerError {
    /// Create a new error with the specified kind
    pub fn new(kind: LedgerErrorKind) -> Self {
        Self {
            kind,
            op: None,
            field: None,
            namespace: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the offending field name (filter translation, row decoding)
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add namespace context
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> LedgerErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the offending field, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the namespace context, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, " (namespace: {})", namespace)?;
        }
        Ok(())
    }
}

impl std::error::Error for LedgerError {}
