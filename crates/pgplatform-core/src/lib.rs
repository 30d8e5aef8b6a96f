//! # pgplatform-core
//!
//! A PostgreSQL platform adapter: compiles backend-agnostic table
//! descriptions and schema diffs into PostgreSQL DDL, and builds the
//! read-only catalog queries whose rows map back into those descriptions.
//!
//! This crate provides:
//! - An identifier resolver that quotes names and turns table references
//!   into catalog predicates
//! - A logical/native type mapping engine
//! - A schema-diff compiler producing ordered ALTER TABLE statements
//! - Catalog introspection queries
//!
//! Nothing here opens a connection; every operation returns SQL text.
//!
//! ## Compiling a diff
//!
//! ```rust
//! use pgplatform_core::{
//!     ColumnDescriptor, ColumnDiff, ColumnProperty, LogicalType, PlatformConfig,
//!     PostgresPlatform, TableDiff,
//! };
//!
//! let platform = PostgresPlatform::new(PlatformConfig::default())?;
//! let diff = TableDiff::new("foo").change_column(ColumnDiff::new(
//!     "id",
//!     ColumnDescriptor::new("id", LogicalType::Integer).autoincrement(),
//!     [ColumnProperty::Autoincrement],
//! ));
//!
//! assert_eq!(
//!     platform.alter_table_sql(&diff)?,
//!     vec![
//!         "CREATE SEQUENCE foo_id_seq",
//!         "SELECT setval('foo_id_seq', (SELECT MAX(id) FROM foo))",
//!         "ALTER TABLE foo ALTER id SET DEFAULT nextval('foo_id_seq')",
//!     ]
//! );
//! # Ok::<(), pgplatform_core::PlatformError>(())
//! ```
//!
//! ## Resolving table references
//!
//! A qualified name filters on its schema; a bare one defers to the
//! session's `search_path` when the query runs:
//!
//! ```rust
//! use pgplatform_core::identifier::{resolve_table_reference, SchemaPredicate};
//!
//! let qualified = resolve_table_reference("myschema.mytable")?;
//! assert_eq!(qualified.schema, SchemaPredicate::Explicit("myschema".into()));
//!
//! let bare = resolve_table_reference("mytable")?;
//! assert_eq!(bare.schema, SchemaPredicate::SearchPath);
//! # Ok::<(), pgplatform_core::PlatformError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod ddl;
pub mod diff;
pub mod error;
pub mod expr;
pub mod identifier;
pub mod keywords;
pub mod platform;
pub mod schema;
pub mod types;

pub use catalog::{CatalogColumnRow, CatalogObject, CatalogTableRow};
pub use config::PlatformConfig;
pub use ddl::{AlterTableHooks, HookOutcome, IsolationLevel, NoHooks};
pub use diff::{ColumnDiff, ColumnProperty, RenamedColumn, RenamedIndex, TableDiff};
pub use error::{PlatformError, Result};
pub use expr::{DateIntervalUnit, DateOperator};
pub use identifier::{Identifier, SchemaPredicate, TableReference};
pub use keywords::{KeywordList, PostgresKeywords};
pub use platform::PostgresPlatform;
pub use schema::{
    ColumnDescriptor, DefaultValue, ForeignKeyAction, ForeignKeyDescriptor, ForeignKeyOptions,
    IndexDescriptor, SequenceDescriptor, TableDescriptor, TableOptions,
};
pub use types::{LogicalType, NativeClass, TypeMap};
