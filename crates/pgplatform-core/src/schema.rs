//! Schema descriptors.
//!
//! Value objects describing tables, columns, indexes, foreign keys and
//! sequences. They are built by the caller (or deserialized) and only read
//! by the platform.

use serde::{Deserialize, Serialize};

use crate::types::LogicalType;

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`, `nextval('seq')`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    ///
    /// Booleans render as `TRUE`/`FALSE` here; the platform applies its
    /// configured boolean encoding instead when declaring columns.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// A column as the caller wants it to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Logical type.
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
    /// Character length, if bounded.
    #[serde(default)]
    pub length: Option<u32>,
    /// Numeric precision.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Numeric scale.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Fixed-width character data.
    #[serde(default)]
    pub fixed: bool,
    /// Whether the column accepts NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<DefaultValue>,
    /// Whether the column is backed by a sequence.
    #[serde(default)]
    pub autoincrement: bool,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            length: None,
            precision: None,
            scale: None,
            fixed: false,
            nullable: true,
            default: None,
            autoincrement: false,
            comment: None,
        }
    }

    /// Sets the character length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the numeric precision.
    #[must_use]
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the numeric scale.
    #[must_use]
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the fixed-width flag.
    #[must_use]
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the column as sequence-backed.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns the comment if it is set and non-empty.
    #[must_use]
    pub fn non_empty_comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether this is a UNIQUE index.
    #[serde(default)]
    pub unique: bool,
    /// Whether this index backs the primary key.
    #[serde(default)]
    pub primary: bool,
    /// Partial index predicate (WHERE clause), if any.
    #[serde(default)]
    pub condition: Option<String>,
}

impl IndexDescriptor {
    /// Creates a plain index.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            unique: false,
            primary: false,
            condition: None,
        }
    }

    /// Marks the index as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index as the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    /// Restricts the index to rows matching `condition`.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Options of a foreign key constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignKeyOptions {
    /// MATCH type (`FULL`, `PARTIAL`, `SIMPLE`).
    pub match_type: Option<String>,
    /// ON UPDATE action.
    pub on_update: Option<ForeignKeyAction>,
    /// ON DELETE action.
    pub on_delete: Option<ForeignKeyAction>,
    /// Whether the constraint is DEFERRABLE.
    pub deferrable: bool,
    /// Whether the constraint is INITIALLY DEFERRED.
    pub deferred: bool,
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Constraint name.
    #[serde(default)]
    pub name: Option<String>,
    /// Columns in this table.
    pub local_columns: Vec<String>,
    /// Referenced table.
    pub foreign_table: String,
    /// Referenced columns.
    pub foreign_columns: Vec<String>,
    /// Constraint options.
    #[serde(default)]
    pub options: ForeignKeyOptions,
}

impl ForeignKeyDescriptor {
    /// Creates an unnamed foreign key with default options.
    #[must_use]
    pub fn new(local_columns: &[&str], foreign_table: impl Into<String>, foreign_columns: &[&str]) -> Self {
        Self {
            name: None,
            local_columns: local_columns.iter().map(|c| (*c).to_string()).collect(),
            foreign_table: foreign_table.into(),
            foreign_columns: foreign_columns.iter().map(|c| (*c).to_string()).collect(),
            options: ForeignKeyOptions::default(),
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the constraint options.
    #[must_use]
    pub fn options(mut self, options: ForeignKeyOptions) -> Self {
        self.options = options;
        self
    }
}

/// A standalone sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    /// Sequence name.
    pub name: String,
    /// Increment size.
    #[serde(default = "default_allocation_size")]
    pub allocation_size: i64,
    /// First value (also the minimum).
    #[serde(default = "default_initial_value")]
    pub initial_value: i64,
    /// Number of values to cache; `<= 1` means no CACHE clause.
    #[serde(default)]
    pub cache: i64,
}

const fn default_allocation_size() -> i64 {
    1
}

const fn default_initial_value() -> i64 {
    1
}

impl SequenceDescriptor {
    /// Creates a sequence incrementing by one from one.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allocation_size: 1,
            initial_value: 1,
            cache: 0,
        }
    }

    /// Sets the increment size.
    #[must_use]
    pub fn allocation_size(mut self, size: i64) -> Self {
        self.allocation_size = size;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial_value(mut self, value: i64) -> Self {
        self.initial_value = value;
        self
    }

    /// Sets the cache size.
    #[must_use]
    pub fn cache(mut self, cache: i64) -> Self {
        self.cache = cache;
        self
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, optionally schema-qualified.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Indexes on this table.
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    /// Foreign key constraints on this table.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Table options.
    #[serde(default)]
    pub options: TableOptions,
}

/// Options applied when creating a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Primary key columns. Falls back to the primary index when empty.
    pub primary: Vec<String>,
}

impl TableDescriptor {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            options: TableOptions::default(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index.
    #[must_use]
    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    /// Appends a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.options.primary = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key columns, deduplicated in order.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        let source: Vec<&str> = if self.options.primary.is_empty() {
            self.indexes
                .iter()
                .find(|idx| idx.primary)
                .map(|idx| idx.columns.iter().map(String::as_str).collect())
                .unwrap_or_default()
        } else {
            self.options.primary.iter().map(String::as_str).collect()
        };
        let mut seen = Vec::with_capacity(source.len());
        for col in source {
            if !seen.contains(&col) {
                seen.push(col);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_to_sql() {
        assert_eq!(DefaultValue::Null.to_sql(), "NULL");
        assert_eq!(DefaultValue::Integer(42).to_sql(), "42");
        assert_eq!(DefaultValue::String("it's".into()).to_sql(), "'it''s'");
        assert_eq!(
            DefaultValue::Expression("CURRENT_TIMESTAMP".into()).to_sql(),
            "CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_column_builder_methods() {
        let col = ColumnDescriptor::new("email", LogicalType::String)
            .length(120)
            .not_null()
            .comment("login");
        assert_eq!(col.length, Some(120));
        assert!(!col.nullable);
        assert_eq!(col.non_empty_comment(), Some("login"));
        assert_eq!(ColumnDescriptor::new("x", LogicalType::Text).comment("").non_empty_comment(), None);
    }

    #[test]
    fn test_primary_key_columns() {
        let table = TableDescriptor::new("t").primary_key(&["a", "b", "a"]);
        assert_eq!(table.primary_key_columns(), vec!["a", "b"]);

        let table = TableDescriptor::new("t").index(IndexDescriptor::new("t_pkey", &["id"]).primary());
        assert_eq!(table.primary_key_columns(), vec!["id"]);
        assert!(TableDescriptor::new("t").primary_key_columns().is_empty());
    }

    #[test]
    fn test_column_deserializes_with_defaults() {
        let col: ColumnDescriptor =
            serde_json::from_str(r#"{"name": "id", "type": "integer", "autoincrement": true}"#)
                .unwrap();
        assert_eq!(col.logical_type, LogicalType::Integer);
        assert!(col.nullable);
        assert!(col.autoincrement);
        assert_eq!(col.default, None);
    }
}
