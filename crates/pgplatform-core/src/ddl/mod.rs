//! Schema-diff DDL compiler.
//!
//! Turns a [`TableDiff`] into the ordered ALTER TABLE statements that carry
//! the table from its old shape to its new one:
//!
//! 1. drop removed and changed foreign keys, then indexes;
//! 2. rename the table;
//! 3. column statements: added, removed, changed, renamed;
//! 4. add foreign keys, create indexes, rename indexes;
//! 5. column comments.
//!
//! Statements emitted after the rename address the table by its new name.
//! Statements returned by hooks follow the default sequence.

pub mod hooks;
pub mod statements;

use tracing::{debug, trace};

use crate::diff::{ColumnDiff, ColumnProperty, TableDiff};
use crate::error::Result;
use crate::identifier::{quote_literal, Identifier};
use crate::platform::PostgresPlatform;
use crate::schema::ColumnDescriptor;
use crate::types::equivalent_ignoring_length;

pub use hooks::{AlterTableHooks, HookOutcome, NoHooks};
pub use statements::IsolationLevel;

/// Properties that require the column type to be restated.
const TYPE_PROPERTIES: [ColumnProperty; 5] = [
    ColumnProperty::Type,
    ColumnProperty::Precision,
    ColumnProperty::Scale,
    ColumnProperty::Length,
    ColumnProperty::Fixed,
];

/// Accumulates the statements of one compilation.
#[derive(Debug, Default)]
struct AlterBuffers {
    sql: Vec<String>,
    comments: Vec<String>,
    hook_sql: Vec<String>,
}

impl AlterBuffers {
    /// Records a hook outcome and returns whether it claimed the event.
    fn claim(&mut self, outcome: HookOutcome) -> bool {
        match outcome {
            HookOutcome::NotHandled => false,
            HookOutcome::Handled(statements) => {
                self.hook_sql.extend(statements);
                true
            }
        }
    }
}

impl PostgresPlatform {
    /// Compiles a table diff into ALTER statements.
    ///
    /// # Errors
    ///
    /// Fails without producing any statement when the diff violates its
    /// invariants or names an invalid identifier.
    pub fn alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        self.alter_table_sql_with_hooks(diff, &NoHooks)
    }

    /// Compiles a table diff, offering every event to `hooks` first.
    ///
    /// # Errors
    ///
    /// Same as [`alter_table_sql`](Self::alter_table_sql).
    pub fn alter_table_sql_with_hooks(
        &self,
        diff: &TableDiff,
        hooks: &dyn AlterTableHooks,
    ) -> Result<Vec<String>> {
        diff.validate()?;
        let old_table = Identifier::parse(&diff.name)?;
        let new_table = diff.new_name.as_deref().map(Identifier::parse).transpose()?;

        let mut table_sql = Vec::new();
        let rename_claimed = match hooks.on_alter_table(diff, self) {
            HookOutcome::NotHandled => false,
            HookOutcome::Handled(statements) => {
                debug!(table = %old_table, "table event handled by hook");
                table_sql = statements;
                true
            }
        };
        let rename = new_table
            .filter(|_| !rename_claimed)
            .map(|new_name| old_table.renamed_to(&new_name));
        let target = rename.as_ref().unwrap_or(&old_table);
        let target_name = target.raw().to_string();

        let mut out = AlterBuffers::default();
        out.sql.extend(self.pre_alter_index_foreign_key_sql(diff)?);

        if let Some(new_name) = &rename {
            out.sql.push(format!(
                "ALTER TABLE {} RENAME TO {}",
                old_table.quoted(self.keywords()),
                new_name.quoted_name(self.keywords())
            ));
        }

        let table = target.quoted(self.keywords());

        for column in &diff.added_columns {
            if out.claim(hooks.on_add_column(column, diff, self)) {
                continue;
            }
            out.sql.push(format!(
                "ALTER TABLE {table} ADD {}",
                self.column_declaration(column)
            ));
            if let Some(comment) = column.non_empty_comment() {
                out.comments
                    .push(self.comment_on_column_sql(&target_name, &column.name, Some(comment))?);
            }
        }

        for column in &diff.removed_columns {
            if out.claim(hooks.on_remove_column(column, diff, self)) {
                continue;
            }
            out.sql.push(format!(
                "ALTER TABLE {table} DROP {}",
                self.quote_name(&column.name)
            ));
        }

        for change in &diff.changed_columns {
            if out.claim(hooks.on_change_column(change, diff, self)) {
                continue;
            }
            self.changed_column_sql(target, &target_name, change, &mut out)?;
        }

        for renamed in &diff.renamed_columns {
            if out.claim(hooks.on_rename_column(&renamed.old_name, &renamed.column, diff, self)) {
                continue;
            }
            out.sql.push(format!(
                "ALTER TABLE {table} RENAME COLUMN {} TO {}",
                self.quote_name(&renamed.old_name),
                self.quote_name(&renamed.column.name)
            ));
        }

        out.sql
            .extend(self.post_alter_index_foreign_key_sql(diff, &target_name)?);

        let AlterBuffers {
            mut sql,
            comments,
            hook_sql,
        } = out;
        sql.extend(comments);
        sql.extend(table_sql);
        sql.extend(hook_sql);

        debug!(
            table = %old_table,
            statements = sql.len(),
            "compiled table diff"
        );
        Ok(sql)
    }

    /// Drops removed and changed foreign keys, then removed and changed
    /// indexes. Runs against the table's old name.
    ///
    /// # Errors
    ///
    /// Fails when the table name is invalid or a dropped foreign key is
    /// unnamed.
    pub fn pre_alter_index_foreign_key_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        for fk in diff
            .removed_foreign_keys
            .iter()
            .chain(&diff.changed_foreign_keys)
        {
            sql.push(self.drop_foreign_key_sql(fk, &diff.name)?);
        }
        for index in diff.removed_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.drop_index_sql(index, &diff.name)?);
        }
        Ok(sql)
    }

    /// Adds added and changed foreign keys, creates added and changed
    /// indexes, then renames renamed indexes.
    ///
    /// # Errors
    ///
    /// Fails when a table name is invalid.
    pub fn post_alter_index_foreign_key_sql(
        &self,
        diff: &TableDiff,
        table: &str,
    ) -> Result<Vec<String>> {
        let mut sql = Vec::new();
        for fk in diff
            .added_foreign_keys
            .iter()
            .chain(&diff.changed_foreign_keys)
        {
            sql.push(self.create_foreign_key_sql(fk, table)?);
        }
        for index in diff.added_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.create_index_sql(index, table)?);
        }
        for renamed in &diff.renamed_indexes {
            sql.push(self.rename_index_sql(&renamed.old_name, &renamed.index, table)?);
        }
        Ok(sql)
    }

    fn changed_column_sql(
        &self,
        table: &Identifier,
        table_name: &str,
        change: &ColumnDiff,
        out: &mut AlterBuffers,
    ) -> Result<()> {
        if is_storage_equivalent(change) {
            trace!(
                table = table_name,
                column = %change.old_column_name,
                "skipping change with identical native storage"
            );
            return Ok(());
        }

        let column = &change.column;
        let quoted_table = table.quoted(self.keywords());
        let old_column = self.quote_name(&change.old_column_name);
        let alter = format!("ALTER TABLE {quoted_table} ALTER {old_column}");

        if change.has_any_changed(&TYPE_PROPERTIES) {
            // SERIAL is a pseudo-type; ALTER ... TYPE needs the plain one.
            let plain = ColumnDescriptor {
                autoincrement: false,
                ..column.clone()
            };
            out.sql
                .push(format!("{alter} TYPE {}", self.type_declaration(&plain)));
        }

        let sequence = table.sibling(
            self.identity_sequence_name(table.name(), &change.old_column_name),
        );
        let sequence_sql = sequence.quoted(self.keywords());
        let sequence_literal = quote_literal(&sequence_sql);
        let enables_sequence =
            column.autoincrement && change.has_changed(ColumnProperty::Autoincrement);

        let restate_default = change.has_changed(ColumnProperty::Default)
            || change.has_changed(ColumnProperty::Type);
        let default_written = restate_default && !column.autoincrement;
        if default_written {
            out.sql.push(match self.default_expression(column) {
                Some(expr) => format!("{alter} SET DEFAULT {expr}"),
                None => format!("{alter} DROP DEFAULT"),
            });
        } else if restate_default && !enables_sequence {
            // A sequence-backed column keeps its nextval() default.
            out.sql
                .push(format!("{alter} SET DEFAULT nextval({sequence_literal})"));
        }

        if change.has_changed(ColumnProperty::NotNull) {
            let action = if column.nullable { "DROP" } else { "SET" };
            out.sql.push(format!("{alter} {action} NOT NULL"));
        }

        if change.has_changed(ColumnProperty::Autoincrement) {
            if enables_sequence {
                out.sql.push(format!("CREATE SEQUENCE {sequence_sql}"));
                out.sql.push(format!(
                    "SELECT setval({sequence_literal}, (SELECT MAX({old_column}) FROM {quoted_table}))"
                ));
                out.sql
                    .push(format!("{alter} SET DEFAULT nextval({sequence_literal})"));
            } else if !default_written {
                // The sequence may be shared; only the default goes.
                out.sql.push(format!("{alter} DROP DEFAULT"));
            }
        }

        if change.has_changed(ColumnProperty::Comment) {
            out.comments.push(self.comment_on_column_sql(
                table_name,
                &column.name,
                column.non_empty_comment(),
            )?);
        }
        Ok(())
    }
}

/// Checks whether a change leaves the native column untouched: both states
/// share a storage class that ignores length, and nothing but type, length
/// or fixed-width changed.
fn is_storage_equivalent(change: &ColumnDiff) -> bool {
    let to = change.column.logical_type;
    match &change.from_column {
        Some(from) => {
            equivalent_ignoring_length(from.logical_type, to)
                && change.only_changed(&ColumnProperty::LENGTH_LIKE)
        }
        None => {
            !to.native_class().depends_on_length()
                && !change.has_changed(ColumnProperty::Type)
                && change.only_changed(&[ColumnProperty::Length, ColumnProperty::Fixed])
        }
    }
}
