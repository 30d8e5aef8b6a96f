//! Identifier quoting and schema-qualification.
//!
//! Identifiers are the only externally-sourced names that reach generated
//! SQL. They pass through [`Identifier::quoted`] when used as object names
//! and through [`quote_literal`] when compared against catalog columns.
//!
//! A table reference may carry a single schema qualifier (`schema.name`).
//! When it does not, catalog queries cannot know which schema the session
//! will resolve it to, so [`resolve_table_reference`] emits an expression
//! that lets the database evaluate its own `search_path` at execution time.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PlatformError, Result};
use crate::keywords::KeywordList;

/// Identifier quote character.
pub const QUOTE_CHAR: char = '"';

/// Schema separator inside a qualified identifier.
pub const SCHEMA_SEPARATOR: char = '.';

/// Expression resolving the session's schema search order at execution
/// time. `"$user"` is replaced by the current user and blanks removed
/// before splitting the setting on commas.
pub const SEARCH_PATH_EXPRESSION: &str = "ANY(string_to_array((select replace(replace(setting,'\"$user\"',user),' ','') from pg_catalog.pg_settings where name = 'search_path'),','))";

/// Names that can appear unquoted.
static PLAIN_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("Invalid plain identifier regex")
});

/// One dot-separated part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NamePart {
    value: String,
    /// The part was supplied already wrapped in quotes.
    explicit: bool,
}

impl NamePart {
    fn unquote(raw_part: &str) -> Self {
        let trimmed = raw_part.trim();
        let explicit = trimmed.len() >= 2
            && trimmed.starts_with(QUOTE_CHAR)
            && trimmed.ends_with(QUOTE_CHAR);
        let value = if explicit {
            trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
        } else {
            trimmed.to_string()
        };
        Self { value, explicit }
    }

    /// Returns the part as it must be written to parse back unchanged.
    fn source(&self) -> String {
        if self.explicit {
            quote_single_identifier(&self.value)
        } else {
            self.value.clone()
        }
    }

    fn parse(raw_part: &str, raw: &str) -> Result<Self> {
        let part = Self::unquote(raw_part);
        if part.value.is_empty() {
            return Err(PlatformError::EmptyIdentifier(raw.to_string()));
        }
        Ok(part)
    }

    fn quoted(&self, keywords: &dyn KeywordList) -> String {
        if self.explicit || requires_quoting(&self.value, keywords) {
            quote_single_identifier(&self.value)
        } else {
            self.value.clone()
        }
    }
}

/// A possibly schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    namespace: Option<NamePart>,
    name: NamePart,
}

impl Identifier {
    /// Parses a raw name such as `users`, `app.users` or `"Order"."Line"`.
    ///
    /// Separators inside quoted parts are not treated as qualifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::AmbiguousIdentifier`] when the name has more
    /// than one schema separator, and [`PlatformError::EmptyIdentifier`]
    /// when a part is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = split_qualified(raw);
        match parts.as_slice() {
            [name] => Ok(Self {
                raw: raw.to_string(),
                namespace: None,
                name: NamePart::parse(name, raw)?,
            }),
            [namespace, name] => Ok(Self {
                raw: raw.to_string(),
                namespace: Some(NamePart::parse(namespace, raw)?),
                name: NamePart::parse(name, raw)?,
            }),
            _ => Err(PlatformError::AmbiguousIdentifier(raw.to_string())),
        }
    }

    /// Returns the name exactly as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the unqualified, unquoted name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name.value
    }

    /// Returns the schema qualifier, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_ref().map(|ns| ns.value.as_str())
    }

    /// Returns whether a schema qualifier is present.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }

    /// Returns `schema.name` (or `name`) without quoting.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{ns}{SCHEMA_SEPARATOR}{}", self.name()),
            None => self.name().to_string(),
        }
    }

    /// Returns the SQL form, quoting each part that needs it.
    #[must_use]
    pub fn quoted(&self, keywords: &dyn KeywordList) -> String {
        match &self.namespace {
            Some(ns) => format!(
                "{}{SCHEMA_SEPARATOR}{}",
                ns.quoted(keywords),
                self.name.quoted(keywords)
            ),
            None => self.name.quoted(keywords),
        }
    }

    /// Returns the SQL form of the unqualified name only.
    #[must_use]
    pub fn quoted_name(&self, keywords: &dyn KeywordList) -> String {
        self.name.quoted(keywords)
    }

    /// Returns an identifier in the same schema with a different name.
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        let name = NamePart {
            value: name.into(),
            explicit: false,
        };
        let raw = match &self.namespace {
            Some(ns) => format!("{}{SCHEMA_SEPARATOR}{}", ns.value, name.value),
            None => name.value.clone(),
        };
        Self {
            raw,
            namespace: self.namespace.clone(),
            name,
        }
    }
}

impl Identifier {
    /// Returns `renamed`'s name placed in this identifier's schema.
    ///
    /// A renamed table stays in its schema; any qualifier on the new name
    /// is ignored.
    #[must_use]
    pub fn renamed_to(&self, renamed: &Self) -> Self {
        let name = renamed.name.clone();
        let raw = match &self.namespace {
            Some(ns) => format!("{}{SCHEMA_SEPARATOR}{}", ns.source(), name.source()),
            None => name.source(),
        };
        Self {
            raw,
            namespace: self.namespace.clone(),
            name,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Splits on schema separators that are not inside quotes.
fn split_qualified(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        if c == QUOTE_CHAR {
            in_quotes = !in_quotes;
        } else if c == SCHEMA_SEPARATOR && !in_quotes {
            parts.push(&raw[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

/// Checks whether a bare name must be quoted to survive as-is.
#[must_use]
pub fn requires_quoting(name: &str, keywords: &dyn KeywordList) -> bool {
    keywords.is_keyword(name) || !PLAIN_IDENTIFIER.is_match(name)
}

/// Quotes an unqualified name such as a column.
///
/// Dots are part of the name. A name supplied in quotes stays quoted.
#[must_use]
pub fn quote_name(name: &str, keywords: &dyn KeywordList) -> String {
    NamePart::unquote(name).quoted(keywords)
}

/// Quotes a single name unconditionally, doubling embedded quotes.
#[must_use]
pub fn quote_single_identifier(name: &str) -> String {
    format!("{QUOTE_CHAR}{}{QUOTE_CHAR}", name.replace('"', "\"\""))
}

/// Renders a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// How a catalog query restricts the schema of a table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaPredicate {
    /// The reference named its schema.
    Explicit(String),
    /// No schema given; defer to the session's search path.
    SearchPath,
}

impl SchemaPredicate {
    /// Returns the right-hand side of the comparison.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Explicit(schema) => quote_literal(schema),
            Self::SearchPath => SEARCH_PATH_EXPRESSION.to_string(),
        }
    }

    /// Returns `{column} = <predicate>`.
    #[must_use]
    pub fn equality(&self, column: &str) -> String {
        format!("{column} = {}", self.to_sql())
    }
}

/// A table reference split into its schema predicate and bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// Schema restriction for catalog lookups.
    pub schema: SchemaPredicate,
    /// The table name with any qualifier removed.
    pub table: Identifier,
}

impl TableReference {
    /// Returns the bare table name as a string literal.
    #[must_use]
    pub fn table_literal(&self) -> String {
        quote_literal(self.table.name())
    }
}

/// Splits a table reference for use in catalog WHERE clauses.
///
/// # Errors
///
/// Fails when the reference is not a valid [`Identifier`].
pub fn resolve_table_reference(table: &str) -> Result<TableReference> {
    let ident = Identifier::parse(table)?;
    let schema = match ident.namespace() {
        Some(ns) => SchemaPredicate::Explicit(ns.to_string()),
        None => SchemaPredicate::SearchPath,
    };
    let table = Identifier {
        raw: ident.name().to_string(),
        namespace: None,
        name: ident.name.clone(),
    };
    Ok(TableReference { schema, table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::PostgresKeywords;

    const KW: PostgresKeywords = PostgresKeywords::new();

    #[test]
    fn test_plain_names_pass_through() {
        let ident = Identifier::parse("users").unwrap();
        assert_eq!(ident.quoted(&KW), "users");
        assert_eq!(ident.name(), "users");
        assert!(!ident.is_qualified());
    }

    #[test]
    fn test_keywords_are_quoted() {
        let ident = Identifier::parse("user").unwrap();
        assert_eq!(ident.quoted(&KW), "\"user\"");
        let ident = Identifier::parse("order.select").unwrap();
        assert_eq!(ident.quoted(&KW), "\"order\".\"select\"");
    }

    #[test]
    fn test_special_characters_are_quoted_and_escaped() {
        let ident = Identifier::parse("my table").unwrap();
        assert_eq!(ident.quoted(&KW), "\"my table\"");
        assert_eq!(quote_single_identifier("a\"b"), "\"a\"\"b\"");
        let ident = Identifier::parse("1st").unwrap();
        assert_eq!(ident.quoted(&KW), "\"1st\"");
    }

    #[test]
    fn test_explicitly_quoted_parts_stay_quoted() {
        let ident = Identifier::parse("\"Users\"").unwrap();
        assert_eq!(ident.name(), "Users");
        assert_eq!(ident.quoted(&KW), "\"Users\"");

        let ident = Identifier::parse("\"odd.schema\".items").unwrap();
        assert_eq!(ident.namespace(), Some("odd.schema"));
        assert_eq!(ident.name(), "items");
        assert_eq!(ident.quoted(&KW), "\"odd.schema\".items");
    }

    #[test]
    fn test_schema_qualified() {
        let ident = Identifier::parse("app.users").unwrap();
        assert_eq!(ident.namespace(), Some("app"));
        assert_eq!(ident.name(), "users");
        assert_eq!(ident.qualified_name(), "app.users");
        assert_eq!(ident.quoted_name(&KW), "users");
        assert_eq!(ident.to_string(), "app.users");
    }

    #[test]
    fn test_more_than_one_separator_is_rejected() {
        let err = Identifier::parse("db.app.users").unwrap_err();
        assert_eq!(
            err,
            PlatformError::AmbiguousIdentifier("db.app.users".to_string())
        );
    }

    #[test]
    fn test_empty_parts_are_rejected() {
        assert!(matches!(
            Identifier::parse(""),
            Err(PlatformError::EmptyIdentifier(_))
        ));
        assert!(matches!(
            Identifier::parse("app."),
            Err(PlatformError::EmptyIdentifier(_))
        ));
    }

    #[test]
    fn test_sibling_keeps_namespace() {
        let ident = Identifier::parse("app.users").unwrap();
        let seq = ident.sibling("users_id_seq");
        assert_eq!(seq.qualified_name(), "app.users_id_seq");
        assert_eq!(seq.quoted(&KW), "app.users_id_seq");
    }

    #[test]
    fn test_quote_name_keeps_dots() {
        assert_eq!(quote_name("id", &KW), "id");
        assert_eq!(quote_name("order", &KW), "\"order\"");
        assert_eq!(quote_name("a.b", &KW), "\"a.b\"");
        assert_eq!(quote_name("\"Mixed\"", &KW), "\"Mixed\"");
    }

    #[test]
    fn test_renamed_to_stays_in_schema() {
        let old = Identifier::parse("app.users").unwrap();
        let renamed = old.renamed_to(&Identifier::parse("\"People\"").unwrap());
        assert_eq!(renamed.raw(), "app.\"People\"");
        assert_eq!(renamed.quoted(&KW), "app.\"People\"");

        let renamed = old.renamed_to(&Identifier::parse("other.members").unwrap());
        assert_eq!(renamed.qualified_name(), "app.members");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_resolve_qualified_reference() {
        let reference = resolve_table_reference("myschema.mytable").unwrap();
        assert_eq!(
            reference.schema,
            SchemaPredicate::Explicit("myschema".to_string())
        );
        assert_eq!(reference.table.name(), "mytable");
        assert_eq!(reference.schema.equality("n.nspname"), "n.nspname = 'myschema'");
    }

    #[test]
    fn test_resolve_bare_reference_defers_to_search_path() {
        let reference = resolve_table_reference("mytable").unwrap();
        assert_eq!(reference.schema, SchemaPredicate::SearchPath);
        let sql = reference.schema.equality("n.nspname");
        assert!(sql.starts_with("n.nspname = ANY(string_to_array("));
        assert!(sql.contains("'search_path'"));
        assert!(!sql.contains("'public'"));
    }

    #[test]
    fn test_resolve_escapes_literals() {
        let reference = resolve_table_reference("o'neil.it's").unwrap();
        assert_eq!(reference.schema.to_sql(), "'o''neil'");
        assert_eq!(reference.table_literal(), "'it''s'");
    }

    #[test]
    fn test_resolve_rejects_ambiguous_reference() {
        assert!(matches!(
            resolve_table_reference("a.b.c"),
            Err(PlatformError::AmbiguousIdentifier(_))
        ));
    }
}
