//! Error taxonomy for the grid engine.
//!
//! Three failure families with very different blast radii:
//! - [`ValidationError`]: a staged filter condition is malformed. Caught
//!   before evaluation and surfaced inline in the filter editor; never
//!   touches row data.
//! - [`MutationError`]: a create/update/delete call against the backing
//!   store rejected. Triggers a rollback to the pre-mutation snapshot and
//!   is surfaced to the host as a recoverable notification.
//! - [`EditError`]: an edit commit could not even be dispatched (unknown
//!   row/column, read-only column, unparseable draft). Nothing was applied,
//!   so there is nothing to roll back.
//!
//! Out-of-range page jumps are deliberately *not* errors; see
//! [`crate::page::PageJumpRejected`].

use thiserror::Error;

/// A staged filter condition is malformed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown column {field:?}")]
    UnknownColumn { field: String },

    #[error("column {field:?} is not filterable")]
    NotFilterable { field: String },

    #[error("operator \"{operator}\" does not apply to {data_type} column {field:?}")]
    OperatorMismatch {
        field: String,
        operator: &'static str,
        data_type: &'static str,
    },
}

/// A mutation against the backing store failed after it was dispatched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("server rejected the request: {0}")]
    Server(String),
}

/// User input that does not parse for the target column's type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{input:?} is not a valid {expected}")]
pub struct ValueParseError {
    pub input: String,
    pub expected: &'static str,
}

/// An edit or delete could not be dispatched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no row with id {0:?}")]
    UnknownRow(String),

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("column {0:?} is not editable")]
    NotEditable(String),

    #[error(transparent)]
    BadValue(#[from] ValueParseError),
}
