//! The PostgreSQL platform.
//!
//! [`PostgresPlatform`] bundles the immutable configuration, the validated
//! type map and the keyword list. Every DDL and catalog builder hangs off
//! it; none of them touch a connection.

use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::Result;
use crate::identifier::{quote_literal, quote_name, Identifier};
use crate::keywords::{KeywordList, PostgresKeywords};
use crate::schema::{ColumnDescriptor, DefaultValue};
use crate::types::{self, LogicalType, TypeMap, VARCHAR_DEFAULT_LENGTH, VARCHAR_MAX_LENGTH};

/// Schema that exists in every database.
pub const DEFAULT_SCHEMA_NAME: &str = "public";

/// Text spellings read back as `false`.
const FALSE_STRINGS: &[&str] = &["false", "f", "n", "no", "off", "0"];

/// PostgreSQL platform adapter.
#[derive(Debug, Clone)]
pub struct PostgresPlatform {
    config: PlatformConfig,
    types: TypeMap,
    keywords: PostgresKeywords,
}

impl PostgresPlatform {
    /// Creates a platform with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the type map, including any extra spellings from `config`,
    /// does not round-trip every logical type.
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let types = TypeMap::new(
            config
                .extra_type_mappings
                .iter()
                .map(|(native, logical)| (native.as_str(), *logical)),
        )?;
        debug!(
            boolean_strings = config.use_boolean_true_false_strings,
            extra_types = config.extra_type_mappings.len(),
            "postgresql platform initialised"
        );
        Ok(Self {
            config,
            types,
            keywords: PostgresKeywords::new(),
        })
    }

    /// Returns the configuration the platform was built with.
    #[must_use]
    pub const fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Returns the native/logical type map.
    #[must_use]
    pub const fn type_map(&self) -> &TypeMap {
        &self.types
    }

    /// Returns the reserved keyword list.
    #[must_use]
    pub fn keywords(&self) -> &dyn KeywordList {
        &self.keywords
    }

    // ============================================================
    // Platform facts
    // ============================================================

    /// Returns the platform name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        "postgresql"
    }

    /// Returns the schema used when none is given.
    #[must_use]
    pub const fn default_schema_name(&self) -> &'static str {
        DEFAULT_SCHEMA_NAME
    }

    /// Checks whether `schema` must be created before use.
    #[must_use]
    pub fn schema_needs_creation(&self, schema: &str) -> bool {
        !matches!(schema, "default" | DEFAULT_SCHEMA_NAME)
    }

    /// Sequences are available.
    #[must_use]
    pub const fn supports_sequences(&self) -> bool {
        true
    }

    /// Tables can live in named schemas.
    #[must_use]
    pub const fn supports_schemas(&self) -> bool {
        true
    }

    /// Auto-increment columns are available.
    #[must_use]
    pub const fn supports_identity_columns(&self) -> bool {
        true
    }

    /// Column comments use `COMMENT ON`.
    #[must_use]
    pub const fn supports_comment_on_statement(&self) -> bool {
        true
    }

    /// Indexes may carry a `WHERE` condition.
    #[must_use]
    pub const fn supports_partial_indexes(&self) -> bool {
        true
    }

    /// Identity columns are backed by a sequence rather than a native
    /// identity clause.
    #[must_use]
    pub const fn uses_sequence_emulated_identity_columns(&self) -> bool {
        true
    }

    /// Id generation prefers sequences over identity columns.
    #[must_use]
    pub const fn prefers_sequences(&self) -> bool {
        true
    }

    /// GUIDs map to the native `UUID` type.
    #[must_use]
    pub const fn has_native_guid_type(&self) -> bool {
        true
    }

    /// Returns the name of the sequence backing an identity column.
    #[must_use]
    pub fn identity_sequence_name(&self, table: &str, column: &str) -> String {
        format!("{table}_{column}_seq")
    }

    /// Returns the longest length a `VARCHAR` column may declare.
    #[must_use]
    pub const fn varchar_max_length(&self) -> u32 {
        VARCHAR_MAX_LENGTH
    }

    /// Returns the length used when a string column declares none.
    #[must_use]
    pub const fn varchar_default_length(&self) -> u32 {
        VARCHAR_DEFAULT_LENGTH
    }

    /// Binary columns have no length bound on this platform.
    #[must_use]
    pub const fn binary_max_length(&self) -> Option<u32> {
        None
    }

    /// Binary columns have no default length on this platform.
    #[must_use]
    pub const fn binary_default_length(&self) -> Option<u32> {
        None
    }

    // ============================================================
    // Quoting
    // ============================================================

    /// Quotes a possibly schema-qualified object name.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a valid [`Identifier`].
    pub fn quote_identifier(&self, name: &str) -> Result<String> {
        Ok(Identifier::parse(name)?.quoted(&self.keywords))
    }

    /// Quotes an unqualified name such as a column.
    #[must_use]
    pub fn quote_name(&self, name: &str) -> String {
        quote_name(name, &self.keywords)
    }

    // ============================================================
    // Booleans
    // ============================================================

    /// Renders a boolean as a literal value using the configured encoding.
    #[must_use]
    pub fn convert_boolean(&self, value: bool) -> String {
        let encoded = if self.config.use_boolean_true_false_strings {
            if value {
                "true"
            } else {
                "false"
            }
        } else if value {
            "1"
        } else {
            "0"
        };
        encoded.to_string()
    }

    /// Converts a boolean to the value bound as a statement parameter.
    #[must_use]
    pub fn convert_boolean_to_db_value(&self, value: bool) -> i32 {
        i32::from(value)
    }

    /// Reads a boolean back from its text form.
    #[must_use]
    pub fn convert_from_boolean(&self, value: &str) -> bool {
        let value = value.trim();
        !FALSE_STRINGS.iter().any(|f| f.eq_ignore_ascii_case(value))
    }

    // ============================================================
    // Declarations
    // ============================================================

    /// Synthesizes the native type declaration for a column.
    #[must_use]
    pub fn type_declaration(&self, column: &ColumnDescriptor) -> String {
        types::type_declaration(column)
    }

    /// Renders the column's default as a SQL expression.
    ///
    /// Sequence-backed columns never carry an explicit default; the
    /// `SERIAL` pseudo-type supplies one.
    #[must_use]
    pub fn default_expression(&self, column: &ColumnDescriptor) -> Option<String> {
        if column.autoincrement {
            return None;
        }
        let default = column.default.as_ref()?;
        let sql = match default {
            DefaultValue::Boolean(b) => quote_literal(&self.convert_boolean(*b)),
            DefaultValue::String(s) if is_current_temporal(column.logical_type, s) => s.clone(),
            DefaultValue::String(s) => quote_literal(s),
            DefaultValue::Null
            | DefaultValue::Integer(_)
            | DefaultValue::Float(_)
            | DefaultValue::Expression(_) => default.to_sql(),
        };
        Some(sql)
    }

    /// Returns `" DEFAULT <expr>"`, or an empty string.
    #[must_use]
    pub fn default_clause(&self, column: &ColumnDescriptor) -> String {
        self.default_expression(column)
            .map(|expr| format!(" DEFAULT {expr}"))
            .unwrap_or_default()
    }

    /// Renders `name type [DEFAULT x] [NOT NULL]`.
    #[must_use]
    pub fn column_declaration(&self, column: &ColumnDescriptor) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_name(&column.name),
            self.type_declaration(column)
        );
        sql.push_str(&self.default_clause(column));
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    /// Maps a native spelling to its logical type.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnknownNativeType`](crate::PlatformError::UnknownNativeType)
    /// for unmapped spellings.
    pub fn logical_type(&self, spelling: &str) -> Result<LogicalType> {
        self.types.logical_type(spelling)
    }
}

/// `CURRENT_*` keywords pass through unquoted on matching temporal columns.
fn is_current_temporal(logical: LogicalType, value: &str) -> bool {
    match logical {
        LogicalType::DateTime | LogicalType::DateTimeTz => {
            value.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
        }
        LogicalType::Date => value.eq_ignore_ascii_case("CURRENT_DATE"),
        LogicalType::Time => value.eq_ignore_ascii_case("CURRENT_TIME"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> PostgresPlatform {
        PostgresPlatform::new(PlatformConfig::default()).unwrap()
    }

    #[test]
    fn test_platform_facts() {
        let p = platform();
        assert_eq!(p.name(), "postgresql");
        assert_eq!(p.default_schema_name(), "public");
        assert!(!p.schema_needs_creation("public"));
        assert!(!p.schema_needs_creation("default"));
        assert!(p.schema_needs_creation("app"));
        assert!(p.supports_sequences());
        assert!(p.uses_sequence_emulated_identity_columns());
        assert_eq!(p.identity_sequence_name("foo", "id"), "foo_id_seq");
        assert_eq!(p.varchar_max_length(), 65535);
        assert_eq!(p.binary_max_length(), None);
        assert_eq!(p.binary_default_length(), None);
    }

    #[test]
    fn test_boolean_conversion() {
        let p = platform();
        assert_eq!(p.convert_boolean(true), "true");
        assert_eq!(p.convert_boolean(false), "false");
        assert_eq!(p.convert_boolean_to_db_value(true), 1);

        let numeric = PostgresPlatform::new(PlatformConfig::new().boolean_strings(false)).unwrap();
        assert_eq!(numeric.convert_boolean(true), "1");
        assert_eq!(numeric.convert_boolean(false), "0");
    }

    #[test]
    fn test_convert_from_boolean() {
        let p = platform();
        for falsy in ["false", "F", "n", "NO", "off", "0"] {
            assert!(!p.convert_from_boolean(falsy), "{falsy}");
        }
        for truthy in ["true", "t", "y", "yes", "on", "1"] {
            assert!(p.convert_from_boolean(truthy), "{truthy}");
        }
    }

    #[test]
    fn test_column_declaration() {
        let p = platform();
        let col = ColumnDescriptor::new("email", LogicalType::String)
            .length(120)
            .not_null()
            .default_value(DefaultValue::String("n/a".into()));
        assert_eq!(
            p.column_declaration(&col),
            "email VARCHAR(120) DEFAULT 'n/a' NOT NULL"
        );

        let col = ColumnDescriptor::new("user", LogicalType::Integer);
        assert_eq!(p.column_declaration(&col), "\"user\" INT");
    }

    #[test]
    fn test_boolean_default_uses_configured_encoding() {
        let col = ColumnDescriptor::new("active", LogicalType::Boolean)
            .default_value(DefaultValue::Boolean(true));
        assert_eq!(platform().default_clause(&col), " DEFAULT 'true'");

        let numeric = PostgresPlatform::new(PlatformConfig::new().boolean_strings(false)).unwrap();
        assert_eq!(numeric.default_clause(&col), " DEFAULT '1'");
    }

    #[test]
    fn test_temporal_keyword_defaults_stay_raw() {
        let p = platform();
        let col = ColumnDescriptor::new("created", LogicalType::DateTime)
            .default_value(DefaultValue::String("CURRENT_TIMESTAMP".into()));
        assert_eq!(p.default_clause(&col), " DEFAULT CURRENT_TIMESTAMP");

        let col = ColumnDescriptor::new("label", LogicalType::String)
            .default_value(DefaultValue::String("CURRENT_TIMESTAMP".into()));
        assert_eq!(p.default_clause(&col), " DEFAULT 'CURRENT_TIMESTAMP'");
    }

    #[test]
    fn test_serial_columns_have_no_default() {
        let col = ColumnDescriptor::new("id", LogicalType::Integer)
            .autoincrement()
            .default_value(DefaultValue::Integer(1));
        assert_eq!(platform().column_declaration(&col), "id SERIAL");
    }

    #[test]
    fn test_extra_type_mapping() {
        let p = PostgresPlatform::new(PlatformConfig::new().type_mapping("citext", LogicalType::Text))
            .unwrap();
        assert_eq!(p.logical_type("CITEXT").unwrap(), LogicalType::Text);
        assert!(p.logical_type("tsvector").is_err());
    }

    #[test]
    fn test_platform_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresPlatform>();
    }
}
