//! Reserved keyword lists consulted by the identifier resolver.

/// A set of reserved words for one SQL dialect.
pub trait KeywordList: Send + Sync {
    /// Returns the name of the keyword list.
    fn name(&self) -> &'static str;

    /// Returns the reserved words, uppercase.
    fn keywords(&self) -> &'static [&'static str];

    /// Checks whether `word` is reserved. Comparison is case-insensitive.
    fn is_keyword(&self, word: &str) -> bool {
        self.keywords()
            .iter()
            .any(|kw| kw.eq_ignore_ascii_case(word))
    }
}

/// PostgreSQL reserved keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresKeywords;

impl PostgresKeywords {
    /// Creates the PostgreSQL keyword list.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

const POSTGRES_KEYWORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "AS",
    "ASC",
    "AUTHORIZATION",
    "BETWEEN",
    "BINARY",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FOR",
    "FOREIGN",
    "FREEZE",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "ILIKE",
    "IN",
    "INITIALLY",
    "INNER",
    "INTERSECT",
    "INTO",
    "IS",
    "ISNULL",
    "JOIN",
    "LEADING",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NATURAL",
    "NEW",
    "NOT",
    "NOTNULL",
    "NULL",
    "OFF",
    "OFFSET",
    "OLD",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "OUTER",
    "OVERLAPS",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "SELECT",
    "SESSION_USER",
    "SIMILAR",
    "SOME",
    "TABLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VERBOSE",
    "WHEN",
    "WHERE",
];

impl KeywordList for PostgresKeywords {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn keywords(&self) -> &'static [&'static str] {
        POSTGRES_KEYWORDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_keyword_case_insensitive() {
        let kw = PostgresKeywords::new();
        assert!(kw.is_keyword("SELECT"));
        assert!(kw.is_keyword("select"));
        assert!(kw.is_keyword("UsEr"));
        assert!(!kw.is_keyword("users"));
        assert!(!kw.is_keyword(""));
    }

    #[test]
    fn test_keywords_are_uppercase() {
        let kw = PostgresKeywords::new();
        assert!(kw
            .keywords()
            .iter()
            .all(|w| w.chars().all(|c| c.is_ascii_uppercase() || c == '_')));
    }
}
