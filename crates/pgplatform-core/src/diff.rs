//! Table and column diffs consumed by the DDL compiler.
//!
//! A [`TableDiff`] is produced by an external comparator and describes how
//! one table changes. The compiler only reads it; [`TableDiff::validate`]
//! checks the structural invariants before any statement is emitted.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::schema::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor};

// ================================================================
// Column diffs
// ================================================================

/// A column property that a [`ColumnDiff`] reports as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnProperty {
    /// Logical type.
    Type,
    /// Character length.
    Length,
    /// Numeric precision.
    Precision,
    /// Numeric scale.
    Scale,
    /// Default value.
    Default,
    /// Nullability.
    NotNull,
    /// Sequence backing.
    Autoincrement,
    /// Column comment.
    Comment,
    /// Fixed-width flag.
    Fixed,
}

impl ColumnProperty {
    /// Properties whose change is absorbed when the native type is
    /// insensitive to them.
    pub const LENGTH_LIKE: [Self; 3] = [Self::Type, Self::Length, Self::Fixed];
}

/// How one column changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiff {
    /// Name of the column before the change.
    pub old_column_name: String,
    /// The column after the change.
    pub column: ColumnDescriptor,
    /// The column before the change, when known.
    #[serde(default)]
    pub from_column: Option<ColumnDescriptor>,
    /// Properties that differ between the two states.
    pub changed_properties: BTreeSet<ColumnProperty>,
}

impl ColumnDiff {
    /// Creates a diff for `column`, previously named `old_column_name`.
    #[must_use]
    pub fn new(
        old_column_name: impl Into<String>,
        column: ColumnDescriptor,
        changed: impl IntoIterator<Item = ColumnProperty>,
    ) -> Self {
        Self {
            old_column_name: old_column_name.into(),
            column,
            from_column: None,
            changed_properties: changed.into_iter().collect(),
        }
    }

    /// Records the prior column state.
    #[must_use]
    pub fn from_column(mut self, from_column: ColumnDescriptor) -> Self {
        self.from_column = Some(from_column);
        self
    }

    /// Checks whether `property` changed.
    #[must_use]
    pub fn has_changed(&self, property: ColumnProperty) -> bool {
        self.changed_properties.contains(&property)
    }

    /// Checks whether any of `properties` changed.
    #[must_use]
    pub fn has_any_changed(&self, properties: &[ColumnProperty]) -> bool {
        properties.iter().any(|p| self.has_changed(*p))
    }

    /// Checks whether every changed property is in `allowed`.
    #[must_use]
    pub fn only_changed(&self, allowed: &[ColumnProperty]) -> bool {
        self.changed_properties.iter().all(|p| allowed.contains(p))
    }
}

/// A column renamed without other changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamedColumn {
    /// Name before the rename.
    pub old_name: String,
    /// The column under its new name.
    pub column: ColumnDescriptor,
}

/// An index renamed without other changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedIndex {
    /// Name before the rename.
    pub old_name: String,
    /// The index under its new name.
    pub index: IndexDescriptor,
}

// ================================================================
// Table diff
// ================================================================

/// How one table changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDiff {
    /// Current table name, optionally schema-qualified.
    pub name: String,
    /// New table name, if the table is renamed.
    pub new_name: Option<String>,
    /// Columns to add.
    pub added_columns: Vec<ColumnDescriptor>,
    /// Columns to drop.
    pub removed_columns: Vec<ColumnDescriptor>,
    /// Columns to alter.
    pub changed_columns: Vec<ColumnDiff>,
    /// Columns to rename.
    pub renamed_columns: Vec<RenamedColumn>,
    /// Indexes to create.
    pub added_indexes: Vec<IndexDescriptor>,
    /// Indexes to recreate.
    pub changed_indexes: Vec<IndexDescriptor>,
    /// Indexes to drop.
    pub removed_indexes: Vec<IndexDescriptor>,
    /// Indexes to rename.
    pub renamed_indexes: Vec<RenamedIndex>,
    /// Foreign keys to add.
    pub added_foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Foreign keys to recreate.
    pub changed_foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Foreign keys to drop.
    pub removed_foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDiff {
    /// Creates an empty diff for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Renames the table.
    #[must_use]
    pub fn rename_to(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// Adds a column.
    #[must_use]
    pub fn add_column(mut self, column: ColumnDescriptor) -> Self {
        self.added_columns.push(column);
        self
    }

    /// Drops a column.
    #[must_use]
    pub fn remove_column(mut self, column: ColumnDescriptor) -> Self {
        self.removed_columns.push(column);
        self
    }

    /// Alters a column.
    #[must_use]
    pub fn change_column(mut self, diff: ColumnDiff) -> Self {
        self.changed_columns.push(diff);
        self
    }

    /// Renames a column.
    #[must_use]
    pub fn rename_column(mut self, old_name: impl Into<String>, column: ColumnDescriptor) -> Self {
        self.renamed_columns.push(RenamedColumn {
            old_name: old_name.into(),
            column,
        });
        self
    }

    /// Returns whether the diff carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_name.is_none()
            && self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.changed_indexes.is_empty()
            && self.removed_indexes.is_empty()
            && self.renamed_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.changed_foreign_keys.is_empty()
            && self.removed_foreign_keys.is_empty()
    }

    /// Checks the structural invariants of the diff.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::EmptyChangeSet`] when a column diff reports
    /// no changed properties, and [`PlatformError::DuplicateColumn`] when a
    /// column name, old or new, appears in more than one column entry.
    pub fn validate(&self) -> Result<()> {
        if let Some(diff) = self
            .changed_columns
            .iter()
            .find(|d| d.changed_properties.is_empty())
        {
            return Err(PlatformError::EmptyChangeSet {
                table: self.name.clone(),
                column: diff.old_column_name.clone(),
            });
        }

        // Changed and renamed entries claim both their old and new names.
        let entries = self
            .added_columns
            .iter()
            .map(|c| entry_names(&c.name, &c.name))
            .chain(self.removed_columns.iter().map(|c| entry_names(&c.name, &c.name)))
            .chain(
                self.changed_columns
                    .iter()
                    .map(|d| entry_names(&d.old_column_name, &d.column.name)),
            )
            .chain(
                self.renamed_columns
                    .iter()
                    .map(|r| entry_names(&r.old_name, &r.column.name)),
            );

        let mut seen = HashSet::new();
        for name in entries.flatten() {
            if !seen.insert(name) {
                return Err(PlatformError::DuplicateColumn {
                    table: self.name.clone(),
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn entry_names<'a>(old: &'a str, new: &'a str) -> Vec<&'a str> {
    if old == new {
        vec![old]
    } else {
        vec![old, new]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;

    #[test]
    fn test_validate_accepts_disjoint_collections() {
        let diff = TableDiff::new("users")
            .add_column(ColumnDescriptor::new("email", LogicalType::String))
            .remove_column(ColumnDescriptor::new("legacy", LogicalType::Text))
            .change_column(ColumnDiff::new(
                "age",
                ColumnDescriptor::new("age", LogicalType::BigInt),
                [ColumnProperty::Type],
            ))
            .rename_column("nick", ColumnDescriptor::new("nickname", LogicalType::String));
        assert!(diff.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_change_set() {
        let diff = TableDiff::new("users").change_column(ColumnDiff::new(
            "age",
            ColumnDescriptor::new("age", LogicalType::Integer),
            [],
        ));
        assert_eq!(
            diff.validate(),
            Err(PlatformError::EmptyChangeSet {
                table: "users".into(),
                column: "age".into(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_column() {
        let diff = TableDiff::new("users")
            .add_column(ColumnDescriptor::new("email", LogicalType::String))
            .remove_column(ColumnDescriptor::new("email", LogicalType::String));
        assert!(matches!(
            diff.validate(),
            Err(PlatformError::DuplicateColumn { column, .. }) if column == "email"
        ));
    }

    #[test]
    fn test_validate_rejects_rename_onto_added_column() {
        let diff = TableDiff::new("t")
            .add_column(ColumnDescriptor::new("b", LogicalType::Text))
            .rename_column("a", ColumnDescriptor::new("b", LogicalType::Text));
        assert!(matches!(
            diff.validate(),
            Err(PlatformError::DuplicateColumn { column, .. }) if column == "b"
        ));

        let swapped = TableDiff::new("t")
            .remove_column(ColumnDescriptor::new("b", LogicalType::Text))
            .change_column(ColumnDiff::new(
                "a",
                ColumnDescriptor::new("b", LogicalType::Text),
                [ColumnProperty::Comment],
            ));
        assert!(swapped.validate().is_err());
    }

    #[test]
    fn test_change_set_queries() {
        let diff = ColumnDiff::new(
            "name",
            ColumnDescriptor::new("name", LogicalType::String),
            [ColumnProperty::Length, ColumnProperty::Fixed],
        );
        assert!(diff.has_changed(ColumnProperty::Length));
        assert!(!diff.has_changed(ColumnProperty::Type));
        assert!(diff.only_changed(&ColumnProperty::LENGTH_LIKE));
        assert!(diff.has_any_changed(&[ColumnProperty::Type, ColumnProperty::Fixed]));
    }

    #[test]
    fn test_table_diff_from_json() {
        let json = r#"{
            "name": "app.users",
            "changed_columns": [{
                "old_column_name": "active",
                "column": {"name": "active", "type": "boolean", "nullable": false},
                "changed_properties": ["notnull", "default"]
            }]
        }"#;
        let diff: TableDiff = serde_json::from_str(json).unwrap();
        assert_eq!(diff.name, "app.users");
        let change = &diff.changed_columns[0];
        assert!(change.has_changed(ColumnProperty::NotNull));
        assert!(change.has_changed(ColumnProperty::Default));
        assert!(!change.column.nullable);
        assert!(diff.added_columns.is_empty());
    }

    #[test]
    fn test_is_empty() {
        assert!(TableDiff::new("t").is_empty());
        assert!(!TableDiff::new("t").rename_to("u").is_empty());
    }
}
