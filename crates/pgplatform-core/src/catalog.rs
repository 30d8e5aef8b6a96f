//! Catalog introspection queries and row mapping.
//!
//! Every query is read-only and filters out the server's own namespaces.
//! Table filters go through [`resolve_table_reference`], so a bare table
//! name is matched against the session's `search_path` when the query runs.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{PlatformError, Result};
use crate::identifier::resolve_table_reference;
use crate::platform::{PostgresPlatform, DEFAULT_SCHEMA_NAME};
use crate::schema::{ColumnDescriptor, DefaultValue};
use crate::types::LogicalType;

/// Namespaces that never hold user tables.
const SYSTEM_NAMESPACE_FILTER: &str = "NOT IN ('pg_catalog', 'information_schema', 'pg_toast')";

/// `nextval('seq'::regclass)` defaults mark sequence-backed columns.
static NEXTVAL_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^nextval\('(.+)'(::[a-z ]+)?\)$").expect("Invalid nextval regex")
});

/// A literal default cast to the column type: `'abc'::character varying`.
static CAST_LITERAL_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^'((?:[^']|'')*)'::[a-z_ ]+(\[\])?$").expect("Invalid cast literal regex")
});

/// A bare or parenthesised integer literal: `0`, `(-1)`.
static INTEGER_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?(-?\d+)\)?$").expect("Invalid integer default regex"));

/// `(n)` or `(p,s)` modifiers of a formatted type.
static TYPE_MODIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+)(?:\s*,\s*(\d+))?\)").expect("Invalid type modifier regex")
});

/// Kind of catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogObject {
    /// Databases on the server.
    Databases,
    /// User schemas.
    Namespaces,
    /// Sequences in user schemas.
    Sequences,
    /// Tables in user schemas.
    Tables,
    /// Views.
    Views,
    /// Columns of one table.
    Columns,
    /// Indexes of one table.
    Indexes,
    /// Unique and primary constraints of one table.
    Constraints,
    /// Foreign keys of one table.
    ForeignKeys,
}

impl CatalogObject {
    /// Returns whether the listing is scoped to a table.
    #[must_use]
    pub const fn requires_table(self) -> bool {
        matches!(
            self,
            Self::Columns | Self::Indexes | Self::Constraints | Self::ForeignKeys
        )
    }
}

impl PostgresPlatform {
    /// Builds the listing query for `object`.
    ///
    /// Table-scoped listings use `table`; the others ignore it.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::MissingTable`] when a table-scoped listing
    /// gets no table, and fails when the table name is invalid.
    pub fn catalog_query(&self, object: CatalogObject, table: Option<&str>) -> Result<String> {
        let table = match table {
            Some(table) => table,
            None if object.requires_table() => return Err(PlatformError::MissingTable(object)),
            None => "",
        };
        match object {
            CatalogObject::Databases => Ok(self.list_databases_sql()),
            CatalogObject::Namespaces => Ok(self.list_namespaces_sql()),
            CatalogObject::Sequences => Ok(self.list_sequences_sql()),
            CatalogObject::Tables => Ok(self.list_tables_sql()),
            CatalogObject::Views => Ok(self.list_views_sql()),
            CatalogObject::Columns => self.list_table_columns_sql(table),
            CatalogObject::Indexes => self.list_table_indexes_sql(table),
            CatalogObject::Constraints => self.list_table_constraints_sql(table),
            CatalogObject::ForeignKeys => self.list_table_foreign_keys_sql(table),
        }
    }

    /// Lists every database on the server.
    #[must_use]
    pub fn list_databases_sql(&self) -> String {
        "SELECT datname FROM pg_database".to_string()
    }

    /// Lists user schemas.
    #[must_use]
    pub fn list_namespaces_sql(&self) -> String {
        "SELECT schema_name AS nspname \
         FROM information_schema.schemata \
         WHERE schema_name NOT LIKE 'pg\\_%' \
         AND schema_name != 'information_schema'"
            .to_string()
    }

    /// Lists sequences outside the system schemas.
    #[must_use]
    pub fn list_sequences_sql(&self) -> String {
        "SELECT c.relname, n.nspname AS schemaname \
         FROM pg_class c, pg_namespace n \
         WHERE relkind = 'S' AND n.oid = c.relnamespace \
         AND (n.nspname NOT LIKE 'pg_%' AND n.nspname != 'information_schema')"
            .to_string()
    }

    /// Lists user tables, skipping the PostGIS bookkeeping tables.
    #[must_use]
    pub fn list_tables_sql(&self) -> String {
        "SELECT quote_ident(tablename) AS table_name, schemaname AS schema_name \
         FROM pg_tables \
         WHERE schemaname NOT LIKE 'pg_%' \
         AND schemaname != 'information_schema' \
         AND tablename != 'geometry_columns' \
         AND tablename != 'spatial_ref_sys'"
            .to_string()
    }

    /// Lists user views with their definitions.
    #[must_use]
    pub fn list_views_sql(&self) -> String {
        format!(
            "SELECT quote_ident(viewname) AS viewname, schemaname, definition \
             FROM pg_views \
             WHERE schemaname {SYSTEM_NAMESPACE_FILTER}"
        )
    }

    /// Lists the foreign keys of `table` with their definitions.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn list_table_foreign_keys_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT quote_ident(r.conname) AS conname, \
             pg_catalog.pg_get_constraintdef(r.oid, true) AS condef \
             FROM pg_catalog.pg_constraint r \
             WHERE r.conrelid = (\
             SELECT c.oid FROM pg_catalog.pg_class c, pg_catalog.pg_namespace n \
             WHERE {} AND n.oid = c.relnamespace\
             ) AND r.contype = 'f'",
            table_where_clause(table, "c", "n")?
        ))
    }

    /// Lists the unique and primary constraints of `table`.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn list_table_constraints_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT quote_ident(relname) AS relname \
             FROM pg_class \
             WHERE oid IN (\
             SELECT indexrelid FROM pg_index, pg_class sc, pg_namespace sn \
             WHERE {} AND sc.relnamespace = sn.oid AND sc.oid = pg_index.indrelid \
             AND (indisunique = 't' OR indisprimary = 't')\
             )",
            table_where_clause(table, "sc", "sn")?
        ))
    }

    /// Lists the indexes of `table`.
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn list_table_indexes_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT quote_ident(relname) AS relname, pg_index.indisunique, pg_index.indisprimary, \
             pg_index.indkey, pg_index.indrelid, \
             pg_get_expr(indpred, indrelid) AS \"where\" \
             FROM pg_class, pg_index \
             WHERE oid IN (\
             SELECT indexrelid FROM pg_index si, pg_class sc, pg_namespace sn \
             WHERE {} AND sc.oid = si.indrelid AND sc.relnamespace = sn.oid\
             ) AND pg_index.indexrelid = oid",
            table_where_clause(table, "sc", "sn")?
        ))
    }

    /// Lists the columns of `table` in ordinal order. Rows deserialize
    /// into [`CatalogColumnRow`].
    ///
    /// # Errors
    ///
    /// Fails when `table` is not a valid identifier.
    pub fn list_table_columns_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT a.attnum, \
             quote_ident(a.attname) AS field, \
             t.typname AS type, \
             format_type(a.atttypid, a.atttypmod) AS complete_type, \
             (SELECT t1.typname FROM pg_catalog.pg_type t1 WHERE t1.oid = t.typbasetype) AS domain_type, \
             (SELECT format_type(t2.typbasetype, t2.typtypmod) FROM pg_catalog.pg_type t2 \
             WHERE t2.typtype = 'd' AND t2.oid = a.atttypid) AS domain_complete_type, \
             a.attnotnull AS isnotnull, \
             (SELECT 't' FROM pg_index WHERE c.oid = pg_index.indrelid \
             AND pg_index.indkey[0] = a.attnum AND pg_index.indisprimary = 't') AS pri, \
             (SELECT pg_get_expr(adbin, adrelid) FROM pg_attrdef \
             WHERE c.oid = pg_attrdef.adrelid AND pg_attrdef.adnum = a.attnum) AS default, \
             (SELECT pg_description.description FROM pg_description \
             WHERE pg_description.objoid = c.oid AND a.attnum = pg_description.objsubid) AS comment \
             FROM pg_attribute a, pg_class c, pg_type t, pg_namespace n \
             WHERE {} \
             AND a.attnum > 0 \
             AND a.attrelid = c.oid \
             AND a.atttypid = t.oid \
             AND n.oid = c.relnamespace \
             ORDER BY a.attnum",
            table_where_clause(table, "c", "n")?
        ))
    }

    /// Maps one row of [`list_table_columns_sql`](Self::list_table_columns_sql)
    /// to a column descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnknownNativeType`]
    /// when the column's native type is not mapped.
    pub fn portable_column(&self, row: &CatalogColumnRow) -> Result<ColumnDescriptor> {
        let (native, complete) = match (&row.domain_type, &row.domain_complete_type) {
            (Some(base), Some(complete)) => (base.as_str(), complete.as_str()),
            (Some(base), None) => (base.as_str(), row.complete_type.as_str()),
            _ => (row.type_name.as_str(), row.complete_type.as_str()),
        };
        let logical_type = self.logical_type(native)?;

        let mut column = ColumnDescriptor::new(row.field.clone(), logical_type);
        column.nullable = !row.is_not_null;
        column.comment = row.comment.clone();
        column.fixed = matches!(native.to_ascii_lowercase().as_str(), "bpchar" | "char" | "character");

        if let Some(caps) = TYPE_MODIFIERS.captures(complete) {
            let first = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let second = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            match logical_type {
                LogicalType::Decimal => {
                    column.precision = first;
                    column.scale = second.or(Some(0));
                }
                LogicalType::String => column.length = first,
                _ => {}
            }
        }

        match row.default.as_deref() {
            Some(default) if NEXTVAL_DEFAULT.is_match(default) => {
                trace!(column = %row.field, "sequence-backed column");
                column.autoincrement = true;
            }
            Some(default) => column.default = self.portable_default(default, logical_type),
            None => {}
        }
        Ok(column)
    }

    fn portable_default(&self, default: &str, logical_type: LogicalType) -> Option<DefaultValue> {
        let default = default.trim();
        if default.eq_ignore_ascii_case("NULL") || default.starts_with("NULL::") {
            return None;
        }
        if let Some(caps) = CAST_LITERAL_DEFAULT.captures(default) {
            let literal = caps.get(1).map_or("", |m| m.as_str()).replace("''", "'");
            return Some(match logical_type {
                LogicalType::Boolean => DefaultValue::Boolean(self.convert_from_boolean(&literal)),
                _ => DefaultValue::String(literal),
            });
        }
        if logical_type == LogicalType::Boolean
            && (default.eq_ignore_ascii_case("true") || default.eq_ignore_ascii_case("false"))
        {
            return Some(DefaultValue::Boolean(self.convert_from_boolean(default)));
        }
        if logical_type.is_integer() {
            if let Some(value) = INTEGER_DEFAULT
                .captures(default)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
            {
                return Some(DefaultValue::Integer(value));
            }
        }
        Some(DefaultValue::Expression(default.to_string()))
    }
}

/// Builds the WHERE clause selecting `table` in the catalog.
///
/// The namespace predicate is an explicit schema when `table` is qualified
/// and the session's `search_path` otherwise.
///
/// # Errors
///
/// Fails when `table` is not a valid identifier.
pub fn table_where_clause(table: &str, class_alias: &str, namespace_alias: &str) -> Result<String> {
    let reference = resolve_table_reference(table)?;
    Ok(format!(
        "{namespace_alias}.nspname {SYSTEM_NAMESPACE_FILTER} AND {class_alias}.relname = {} AND {}",
        reference.table_literal(),
        reference
            .schema
            .equality(&format!("{namespace_alias}.nspname"))
    ))
}

/// One row of the per-table column listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumnRow {
    /// Ordinal position.
    #[serde(default)]
    pub attnum: i32,
    /// Column name as returned by `quote_ident`.
    pub field: String,
    /// Catalog type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Formatted type including modifiers.
    pub complete_type: String,
    /// Base type when the column uses a domain.
    #[serde(default)]
    pub domain_type: Option<String>,
    /// Formatted base type when the column uses a domain.
    #[serde(default)]
    pub domain_complete_type: Option<String>,
    /// NOT NULL constraint present.
    #[serde(rename = "isnotnull", default)]
    pub is_not_null: bool,
    /// `t` when the column leads the primary key.
    #[serde(default)]
    pub pri: Option<String>,
    /// Default expression.
    #[serde(default)]
    pub default: Option<String>,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl CatalogColumnRow {
    /// Returns whether the column leads the primary key.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.pri.as_deref() == Some("t")
    }
}

/// One row of the table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTableRow {
    /// Table name as returned by `quote_ident`.
    pub table_name: String,
    /// Owning schema.
    pub schema_name: String,
}

impl CatalogTableRow {
    /// Returns the name to use in DDL; tables in the default schema stay
    /// unqualified.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.schema_name == DEFAULT_SCHEMA_NAME {
            self.table_name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.table_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    fn platform() -> PostgresPlatform {
        PostgresPlatform::new(PlatformConfig::default()).unwrap()
    }

    fn row(field: &str, type_name: &str, complete: &str) -> CatalogColumnRow {
        CatalogColumnRow {
            field: field.to_string(),
            type_name: type_name.to_string(),
            complete_type: complete.to_string(),
            ..CatalogColumnRow::default()
        }
    }

    #[test]
    fn test_where_clause_with_explicit_schema() {
        assert_eq!(
            table_where_clause("myschema.mytable", "c", "n").unwrap(),
            "n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
             AND c.relname = 'mytable' AND n.nspname = 'myschema'"
        );
    }

    #[test]
    fn test_where_clause_defers_to_search_path() {
        let clause = table_where_clause("mytable", "sc", "sn").unwrap();
        assert!(clause.contains("sc.relname = 'mytable'"));
        assert!(clause.ends_with(&format!(
            "sn.nspname = {}",
            crate::identifier::SEARCH_PATH_EXPRESSION
        )));
    }

    #[test]
    fn test_where_clause_strips_identifier_quotes() {
        let clause = table_where_clause("\"Orders\"", "c", "n").unwrap();
        assert!(clause.contains("c.relname = 'Orders'"));
    }

    #[test]
    fn test_table_scoped_queries_use_resolver() {
        let p = platform();
        for object in [
            CatalogObject::Columns,
            CatalogObject::Indexes,
            CatalogObject::Constraints,
            CatalogObject::ForeignKeys,
        ] {
            assert!(object.requires_table());
            let sql = p.catalog_query(object, Some("app.users")).unwrap();
            assert!(sql.contains("relname = 'users'"), "{sql}");
            assert!(sql.contains("nspname = 'app'"), "{sql}");
            assert!(sql.contains("'pg_toast'"), "{sql}");
        }
        assert!(matches!(
            p.catalog_query(CatalogObject::Columns, Some("a.b.c")),
            Err(PlatformError::AmbiguousIdentifier(_))
        ));
    }

    #[test]
    fn test_table_scoped_query_without_table_fails() {
        let p = platform();
        assert_eq!(
            p.catalog_query(CatalogObject::Columns, None),
            Err(PlatformError::MissingTable(CatalogObject::Columns))
        );
        assert_eq!(
            p.catalog_query(CatalogObject::Tables, None),
            Ok(p.list_tables_sql())
        );
    }

    #[test]
    fn test_listings_skip_system_objects() {
        let p = platform();
        let tables = p.list_tables_sql();
        assert!(tables.contains("'geometry_columns'"));
        assert!(tables.contains("'spatial_ref_sys'"));
        assert!(tables.contains("NOT LIKE 'pg_%'"));
        assert!(p.list_sequences_sql().contains("relkind = 'S'"));
        assert!(p.list_views_sql().contains("'information_schema'"));
        assert_eq!(p.list_databases_sql(), "SELECT datname FROM pg_database");
    }

    #[test]
    fn test_portable_varchar_column() {
        let mut r = row("email", "varchar", "character varying(120)");
        r.is_not_null = true;
        r.default = Some("'n/a'::character varying".into());
        r.comment = Some("login".into());
        let col = platform().portable_column(&r).unwrap();
        assert_eq!(col.logical_type, LogicalType::String);
        assert_eq!(col.length, Some(120));
        assert!(!col.fixed);
        assert!(!col.nullable);
        assert_eq!(col.default, Some(DefaultValue::String("n/a".into())));
        assert_eq!(col.comment.as_deref(), Some("login"));
    }

    #[test]
    fn test_portable_serial_column() {
        let mut r = row("id", "int4", "integer");
        r.default = Some("nextval('users_id_seq'::regclass)".into());
        r.pri = Some("t".into());
        let col = platform().portable_column(&r).unwrap();
        assert_eq!(col.logical_type, LogicalType::Integer);
        assert!(col.autoincrement);
        assert_eq!(col.default, None);
        assert!(r.is_primary());
    }

    #[test]
    fn test_portable_numeric_and_char() {
        let col = platform()
            .portable_column(&row("price", "numeric", "numeric(12,2)"))
            .unwrap();
        assert_eq!((col.precision, col.scale), (Some(12), Some(2)));

        let col = platform()
            .portable_column(&row("code", "bpchar", "character(3)"))
            .unwrap();
        assert!(col.fixed);
        assert_eq!(col.length, Some(3));
    }

    #[test]
    fn test_portable_defaults() {
        let p = platform();
        let mut r = row("active", "bool", "boolean");
        r.default = Some("false".into());
        assert_eq!(
            p.portable_column(&r).unwrap().default,
            Some(DefaultValue::Boolean(false))
        );

        let mut r = row("n", "int4", "integer");
        r.default = Some("(-1)".into());
        assert_eq!(p.portable_column(&r).unwrap().default, Some(DefaultValue::Integer(-1)));

        let mut r = row("created", "timestamp", "timestamp(0) without time zone");
        r.default = Some("now()".into());
        assert_eq!(
            p.portable_column(&r).unwrap().default,
            Some(DefaultValue::Expression("now()".into()))
        );

        let mut r = row("note", "text", "text");
        r.default = Some("'it''s'::text".into());
        assert_eq!(
            p.portable_column(&r).unwrap().default,
            Some(DefaultValue::String("it's".into()))
        );
    }

    #[test]
    fn test_portable_domain_column() {
        let mut r = row("email", "email_address", "email_address");
        r.domain_type = Some("varchar".into());
        r.domain_complete_type = Some("character varying(200)".into());
        let col = platform().portable_column(&r).unwrap();
        assert_eq!(col.logical_type, LogicalType::String);
        assert_eq!(col.length, Some(200));
    }

    #[test]
    fn test_portable_unknown_type_fails() {
        assert!(matches!(
            platform().portable_column(&row("doc", "tsvector", "tsvector")),
            Err(PlatformError::UnknownNativeType(_))
        ));
    }

    #[test]
    fn test_table_row_qualified_name() {
        let public = CatalogTableRow {
            table_name: "users".into(),
            schema_name: "public".into(),
        };
        assert_eq!(public.qualified_name(), "users");
        let other = CatalogTableRow {
            table_name: "orders".into(),
            schema_name: "shop".into(),
        };
        assert_eq!(other.qualified_name(), "shop.orders");
    }
}
