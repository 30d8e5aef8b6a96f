//! Error types for the platform adapter.
//!
//! Every variant is a precondition violation: the adapter performs no I/O,
//! so there is no recoverable error class. A failed call never yields a
//! partial statement list.

use crate::catalog::CatalogObject;
use crate::types::LogicalType;

/// Errors raised when descriptors or diffs violate their contracts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// An identifier contains more than one schema separator.
    #[error("Ambiguous identifier '{0}': expected at most one schema separator")]
    AmbiguousIdentifier(String),

    /// An identifier (or one of its qualified parts) is empty.
    #[error("Identifier cannot be empty: '{0}'")]
    EmptyIdentifier(String),

    /// A column diff carries no changed properties.
    #[error("Column diff for '{table}.{column}' has an empty set of changed properties")]
    EmptyChangeSet {
        /// Table being altered.
        table: String,
        /// Old name of the column.
        column: String,
    },

    /// The same column name appears in more than one diff collection.
    #[error("Column '{column}' appears in more than one change collection of table '{table}'")]
    DuplicateColumn {
        /// Table being altered.
        table: String,
        /// The offending column name.
        column: String,
    },

    /// A foreign key must be named to be dropped.
    #[error("Cannot drop an unnamed foreign key on table '{table}'")]
    UnnamedForeignKey {
        /// Table owning the constraint.
        table: String,
    },

    /// A table-scoped catalog listing was requested without a table.
    #[error("Catalog listing {0:?} requires a table name")]
    MissingTable(CatalogObject),

    /// A native type spelling is not present in the mapping table.
    #[error("Unknown database type '{0}' requested for the postgresql platform")]
    UnknownNativeType(String),

    /// A logical type has no native spelling that maps back into its
    /// equivalence class.
    #[error("Type mapping is incomplete: logical type '{logical}' declares '{declaration}', which does not map back to it")]
    IncompleteTypeMapping {
        /// The logical type that failed validation.
        logical: LogicalType,
        /// The native declaration synthesized for it.
        declaration: String,
    },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
