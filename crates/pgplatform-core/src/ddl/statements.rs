//! Single-statement DDL templates.
//!
//! These cover the objects the ALTER TABLE compiler delegates to (indexes,
//! foreign keys, comments) plus plain CREATE/DROP templates for tables,
//! sequences, schemas, views and databases.

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::identifier::{quote_literal, Identifier, SCHEMA_SEPARATOR};
use crate::platform::PostgresPlatform;
use crate::schema::{ForeignKeyDescriptor, IndexDescriptor, SequenceDescriptor, TableDescriptor};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// READ UNCOMMITTED.
    ReadUncommitted,
    /// READ COMMITTED.
    ReadCommitted,
    /// REPEATABLE READ.
    RepeatableRead,
    /// SERIALIZABLE.
    Serializable,
}

impl IsolationLevel {
    /// Returns the SQL keyword for the level.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl PostgresPlatform {
    // ============================================================
    // Tables
    // ============================================================

    /// Generates the statements creating `table`: the CREATE TABLE itself,
    /// then its secondary indexes, foreign keys and column comments.
    ///
    /// # Errors
    ///
    /// Fails when the table or a referenced table name is invalid.
    pub fn create_table_sql(&self, table: &TableDescriptor) -> Result<Vec<String>> {
        let name = self.quote_identifier(&table.name)?;
        let mut fields: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_declaration(c))
            .collect();

        let primary = table.primary_key_columns();
        if !primary.is_empty() {
            fields.push(format!("PRIMARY KEY({})", self.column_list(primary)));
        }

        let mut sql = vec![format!("CREATE TABLE {name} ({})", fields.join(", "))];
        for index in table.indexes.iter().filter(|idx| !idx.primary) {
            sql.push(self.create_index_sql(index, &table.name)?);
        }
        for fk in &table.foreign_keys {
            sql.push(self.create_foreign_key_sql(fk, &table.name)?);
        }
        for column in &table.columns {
            if let Some(comment) = column.non_empty_comment() {
                sql.push(self.comment_on_column_sql(&table.name, &column.name, Some(comment))?);
            }
        }
        Ok(sql)
    }

    /// `TRUNCATE t[ CASCADE]`.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn truncate_table_sql(&self, table: &str, cascade: bool) -> Result<String> {
        let name = self.quote_identifier(table)?;
        Ok(if cascade {
            format!("TRUNCATE {name} CASCADE")
        } else {
            format!("TRUNCATE {name}")
        })
    }

    /// Inserts a row consisting only of the identity column's default.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn empty_identity_insert_sql(&self, table: &str, column: &str) -> Result<String> {
        Ok(format!(
            "INSERT INTO {} ({}) VALUES (DEFAULT)",
            self.quote_identifier(table)?,
            self.quote_name(column)
        ))
    }

    // ============================================================
    // Indexes
    // ============================================================

    /// Creates an index, or adds the primary key for a primary index.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn create_index_sql(&self, index: &IndexDescriptor, table: &str) -> Result<String> {
        let table = self.quote_identifier(table)?;
        let columns = self.column_list(index.columns.iter().map(String::as_str));
        if index.primary {
            return Ok(format!("ALTER TABLE {table} ADD PRIMARY KEY ({columns})"));
        }
        let unique = if index.unique { "UNIQUE " } else { "" };
        let mut sql = format!(
            "CREATE {unique}INDEX {} ON {table} ({columns})",
            self.quote_name(&index.name)
        );
        if let Some(condition) = &index.condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        Ok(sql)
    }

    /// Drops an index, or the primary key constraint for a primary index.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn drop_index_sql(&self, index: &IndexDescriptor, table: &str) -> Result<String> {
        if index.primary {
            return self.drop_constraint_sql(&index.name, table);
        }
        Ok(format!(
            "DROP INDEX {}",
            self.index_name_in_table_schema(&index.name, table)?
        ))
    }

    /// Renames an index. Indexes live in their table's schema.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn rename_index_sql(
        &self,
        old_name: &str,
        index: &IndexDescriptor,
        table: &str,
    ) -> Result<String> {
        Ok(format!(
            "ALTER INDEX {} RENAME TO {}",
            self.index_name_in_table_schema(old_name, table)?,
            self.quote_name(&index.name)
        ))
    }

    fn index_name_in_table_schema(&self, index: &str, table: &str) -> Result<String> {
        let table = Identifier::parse(table)?;
        let index = self.quote_name(index);
        Ok(match table.namespace() {
            Some(schema) => format!("{}{SCHEMA_SEPARATOR}{index}", self.quote_name(schema)),
            None => index,
        })
    }

    // ============================================================
    // Constraints
    // ============================================================

    /// `ALTER TABLE t ADD CONSTRAINT ... FOREIGN KEY ...`.
    ///
    /// # Errors
    ///
    /// Fails when the owning or referenced table name is invalid.
    pub fn create_foreign_key_sql(&self, fk: &ForeignKeyDescriptor, table: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(table)?,
            self.foreign_key_declaration(fk)?
        ))
    }

    /// Renders `[CONSTRAINT n ]FOREIGN KEY (...) REFERENCES r (...) <options>`.
    ///
    /// # Errors
    ///
    /// Fails when the referenced table name is invalid.
    pub fn foreign_key_declaration(&self, fk: &ForeignKeyDescriptor) -> Result<String> {
        let mut sql = String::new();
        if let Some(name) = &fk.name {
            sql.push_str("CONSTRAINT ");
            sql.push_str(&self.quote_name(name));
            sql.push(' ');
        }
        sql.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.column_list(fk.local_columns.iter().map(String::as_str)),
            self.quote_identifier(&fk.foreign_table)?,
            self.column_list(fk.foreign_columns.iter().map(String::as_str)),
        ));
        sql.push_str(&self.advanced_foreign_key_options(fk));
        Ok(sql)
    }

    /// Renders MATCH, referential actions and deferral options.
    #[must_use]
    pub fn advanced_foreign_key_options(&self, fk: &ForeignKeyDescriptor) -> String {
        let opts = &fk.options;
        let mut sql = String::new();
        if let Some(match_type) = &opts.match_type {
            sql.push_str(" MATCH ");
            sql.push_str(match_type);
        }
        if let Some(action) = opts.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = opts.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        sql.push_str(if opts.deferrable {
            " DEFERRABLE"
        } else {
            " NOT DEFERRABLE"
        });
        sql.push_str(if opts.deferred {
            " INITIALLY DEFERRED"
        } else {
            " INITIALLY IMMEDIATE"
        });
        sql
    }

    /// Drops a named foreign key.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnnamedForeignKey`] when the constraint has
    /// no name, or fails when `table` is invalid.
    pub fn drop_foreign_key_sql(&self, fk: &ForeignKeyDescriptor, table: &str) -> Result<String> {
        let name = fk
            .name
            .as_deref()
            .ok_or_else(|| PlatformError::UnnamedForeignKey {
                table: table.to_string(),
            })?;
        self.drop_constraint_sql(name, table)
    }

    /// `ALTER TABLE t DROP CONSTRAINT n`.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn drop_constraint_sql(&self, name: &str, table: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table)?,
            self.quote_name(name)
        ))
    }

    /// `COMMENT ON COLUMN t.c IS '...'`; `None` clears the comment.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn comment_on_column_sql(
        &self,
        table: &str,
        column: &str,
        comment: Option<&str>,
    ) -> Result<String> {
        let comment = comment.map_or_else(|| "NULL".to_string(), quote_literal);
        Ok(format!(
            "COMMENT ON COLUMN {}.{} IS {comment}",
            self.quote_identifier(table)?,
            self.quote_name(column)
        ))
    }

    // ============================================================
    // Sequences
    // ============================================================

    /// `CREATE SEQUENCE s INCREMENT BY n MINVALUE i START i[ CACHE c]`.
    ///
    /// # Errors
    ///
    /// Fails when the sequence name is invalid.
    pub fn create_sequence_sql(&self, sequence: &SequenceDescriptor) -> Result<String> {
        Ok(format!(
            "CREATE SEQUENCE {} INCREMENT BY {} MINVALUE {} START {}{}",
            self.quote_identifier(&sequence.name)?,
            sequence.allocation_size,
            sequence.initial_value,
            sequence.initial_value,
            sequence_cache_clause(sequence)
        ))
    }

    /// `ALTER SEQUENCE s INCREMENT BY n[ CACHE c]`.
    ///
    /// # Errors
    ///
    /// Fails when the sequence name is invalid.
    pub fn alter_sequence_sql(&self, sequence: &SequenceDescriptor) -> Result<String> {
        Ok(format!(
            "ALTER SEQUENCE {} INCREMENT BY {}{}",
            self.quote_identifier(&sequence.name)?,
            sequence.allocation_size,
            sequence_cache_clause(sequence)
        ))
    }

    /// `DROP SEQUENCE s CASCADE`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn drop_sequence_sql(&self, name: &str) -> Result<String> {
        Ok(format!("DROP SEQUENCE {} CASCADE", self.quote_identifier(name)?))
    }

    /// `SELECT NEXTVAL('s')`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn sequence_next_val_sql(&self, name: &str) -> Result<String> {
        Ok(format!(
            "SELECT NEXTVAL({})",
            quote_literal(&self.quote_identifier(name)?)
        ))
    }

    // ============================================================
    // Schemas, views, databases, sessions
    // ============================================================

    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn create_schema_sql(&self, name: &str) -> Result<String> {
        Ok(format!("CREATE SCHEMA {}", self.quote_identifier(name)?))
    }

    /// `CREATE VIEW v AS <sql>`; the query is used verbatim.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn create_view_sql(&self, name: &str, sql: &str) -> Result<String> {
        Ok(format!("CREATE VIEW {} AS {sql}", self.quote_identifier(name)?))
    }

    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn drop_view_sql(&self, name: &str) -> Result<String> {
        Ok(format!("DROP VIEW {}", self.quote_identifier(name)?))
    }

    /// # Errors
    ///
    /// Fails when `name` is not a valid identifier.
    pub fn create_database_sql(&self, name: &str) -> Result<String> {
        Ok(format!("CREATE DATABASE {}", self.quote_identifier(name)?))
    }

    /// Sets the default isolation level for the session.
    #[must_use]
    pub fn set_transaction_isolation_sql(&self, level: IsolationLevel) -> String {
        format!(
            "SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL {}",
            level.as_sql()
        )
    }

    fn column_list<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> String {
        columns
            .into_iter()
            .map(|c| self.quote_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn sequence_cache_clause(sequence: &SequenceDescriptor) -> String {
    if sequence.cache > 1 {
        format!(" CACHE {}", sequence.cache)
    } else {
        String::new()
    }
}
