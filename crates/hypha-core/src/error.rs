//! Error types for Hypha.
//!
//! This module provides a unified error type for all graph operations.
//! Validation failures leave the store untouched; callers can rely on
//! every `Err` return being a no-op on graph state.

use thiserror::Error;

/// Result type alias for Hypha operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Hypha operations.
///
/// Each variant includes a descriptive error message suitable for end-users.
/// Error codes follow the pattern `HYPHA-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Required argument was absent or empty (HYPHA-001).
    #[error("[HYPHA-001] Required argument '{0}' was absent or empty")]
    NullArgument(&'static str),

    /// Element id does not match the configured id type (HYPHA-002).
    #[error("[HYPHA-002] Id type mismatch: expected {expected}, got {actual}")]
    IdTypeMismatch {
        /// The type the store configuration demands.
        expected: String,
        /// The type of the value that was passed.
        actual: String,
    },

    /// Attribute value does not match the column type (HYPHA-003).
    #[error("[HYPHA-003] Type mismatch on column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Column id.
        column: String,
        /// Declared column type.
        expected: String,
        /// Type of the rejected value.
        actual: String,
    },

    /// The passed element does not belong to this store (HYPHA-004).
    ///
    /// Raised when a store id is stale, recycled, or from another store,
    /// and for operations on destroyed views and observers.
    #[error("[HYPHA-004] {0} does not belong to this store")]
    NotOwned(&'static str),

    /// A node with this user id already exists (HYPHA-005).
    #[error("[HYPHA-005] Node id already present")]
    DuplicateNode,

    /// An edge with this user id already exists (HYPHA-006).
    #[error("[HYPHA-006] Edge id already present")]
    DuplicateEdge,

    /// An edge with the same endpoints and type already exists (HYPHA-007).
    ///
    /// Also raised for a second self-loop of the same (node, type).
    #[error("[HYPHA-007] Parallel edge rejected: an edge with the same endpoints and type exists")]
    ParallelEdge,

    /// Unsupported attribute type for this operation (HYPHA-008).
    #[error("[HYPHA-008] Unsupported attribute type: {0}")]
    UnsupportedType(String),

    /// Set-algebra operation attempted on the main view (HYPHA-009).
    #[error("[HYPHA-009] Set-algebra operations are not supported on the main view")]
    MainView,

    /// Illegal lock upgrade or re-entrant write acquisition (HYPHA-010).
    #[error("[HYPHA-010] Lock misuse: {0}")]
    LockUpgrade(&'static str),

    /// Iterator or cursor misuse (HYPHA-011).
    ///
    /// Raised for `remove` before the first `next`, double removal, and
    /// stepping a finished cursor.
    #[error("[HYPHA-011] Cursor misuse: {0}")]
    CursorState(&'static str),

    /// Structural change observed by a detached cursor (HYPHA-012).
    #[error("[HYPHA-012] Concurrent structural modification: version moved from {observed} to {current}")]
    ConcurrentModification {
        /// Version the cursor observed at creation.
        observed: u64,
        /// Version at the failed step.
        current: u64,
    },

    /// Write attempted on a read-only column (HYPHA-013).
    #[error("[HYPHA-013] Column '{0}' is read-only")]
    ReadOnlyColumn(String),

    /// Edge endpoints are not both present in the view (HYPHA-014).
    #[error("[HYPHA-014] Edge endpoints must be in the view before the edge")]
    ViewClosure,

    /// No column with this id (HYPHA-015).
    #[error("[HYPHA-015] Column '{0}' not found")]
    ColumnNotFound(String),

    /// Malformed interval or timestamp text (HYPHA-016).
    #[error("[HYPHA-016] Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Timestamp or interval bound was NaN or inverted (HYPHA-017).
    #[error("[HYPHA-017] Invalid time value: {0}")]
    InvalidTime(&'static str),

    /// Edge type still has live edges (HYPHA-018).
    #[error("[HYPHA-018] Edge type is still in use and cannot be removed")]
    TypeInUse,

    /// Text could not be parsed as a value of the requested type (HYPHA-019).
    #[error("[HYPHA-019] Cannot parse '{text}' as {ty}")]
    InvalidValueFormat {
        /// Target attribute type.
        ty: String,
        /// The rejected text.
        text: String,
    },

    /// A column with this id already exists (HYPHA-020).
    #[error("[HYPHA-020] Column '{0}' already exists")]
    DuplicateColumn(String),
}

impl Error {
    /// Returns the error code (e.g., "HYPHA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NullArgument(_) => "HYPHA-001",
            Self::IdTypeMismatch { .. } => "HYPHA-002",
            Self::TypeMismatch { .. } => "HYPHA-003",
            Self::NotOwned(_) => "HYPHA-004",
            Self::DuplicateNode => "HYPHA-005",
            Self::DuplicateEdge => "HYPHA-006",
            Self::ParallelEdge => "HYPHA-007",
            Self::UnsupportedType(_) => "HYPHA-008",
            Self::MainView => "HYPHA-009",
            Self::LockUpgrade(_) => "HYPHA-010",
            Self::CursorState(_) => "HYPHA-011",
            Self::ConcurrentModification { .. } => "HYPHA-012",
            Self::ReadOnlyColumn(_) => "HYPHA-013",
            Self::ViewClosure => "HYPHA-014",
            Self::ColumnNotFound(_) => "HYPHA-015",
            Self::InvalidTimeFormat(_) => "HYPHA-016",
            Self::InvalidTime(_) => "HYPHA-017",
            Self::TypeInUse => "HYPHA-018",
            Self::InvalidValueFormat { .. } => "HYPHA-019",
            Self::DuplicateColumn(_) => "HYPHA-020",
        }
    }

    /// Returns true if this error indicates caller misuse of locks or
    /// cursors rather than a rejected operation.
    #[must_use]
    pub const fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::LockUpgrade(_) | Self::CursorState(_) | Self::ConcurrentModification { .. }
        )
    }
}
