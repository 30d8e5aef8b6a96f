//! Logical column types and their PostgreSQL spellings.
//!
//! The catalog reports many spellings for one logical type (`int4`,
//! `serial`, `integer`, ...), so the native-to-logical direction is a
//! lookup table. The logical-to-native direction is synthesized from a
//! column's flags: autoincrement integers become `SERIAL`, character
//! columns pick `CHAR`/`VARCHAR` with a length fallback, and every binary
//! flavour folds into the unbounded `BYTEA`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::schema::ColumnDescriptor;

/// Upper bound for `VARCHAR` lengths. Longer strings are declared `TEXT`.
pub const VARCHAR_MAX_LENGTH: u32 = 65535;

/// Length used for character columns declared without one.
pub const VARCHAR_DEFAULT_LENGTH: u32 = 255;

/// Precision used for decimal columns declared without one.
pub const DECIMAL_DEFAULT_PRECISION: u32 = 10;

/// Scale used for decimal columns declared without one.
pub const DECIMAL_DEFAULT_SCALE: u32 = 0;

/// Backend-independent column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// 16-bit integer.
    SmallInt,
    /// Boolean.
    Boolean,
    /// Unbounded character data.
    Text,
    /// Bounded character data, fixed or variable width.
    String,
    /// Exact numeric with precision and scale.
    Decimal,
    /// Double precision float.
    Float,
    /// Calendar date.
    Date,
    /// Timestamp without time zone.
    DateTime,
    /// Timestamp with time zone.
    DateTimeTz,
    /// Time of day.
    Time,
    /// UUID.
    Guid,
    /// Binary large object.
    Blob,
    /// Bounded binary data.
    Binary,
}

impl LogicalType {
    /// Every logical type, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Integer,
        Self::BigInt,
        Self::SmallInt,
        Self::Boolean,
        Self::Text,
        Self::String,
        Self::Decimal,
        Self::Float,
        Self::Date,
        Self::DateTime,
        Self::DateTimeTz,
        Self::Time,
        Self::Guid,
        Self::Blob,
        Self::Binary,
    ];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::SmallInt => "smallint",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::String => "string",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::DateTimeTz => "datetimetz",
            Self::Time => "time",
            Self::Guid => "guid",
            Self::Blob => "blob",
            Self::Binary => "binary",
        }
    }

    /// Returns the physical type this logical type is stored as.
    #[must_use]
    pub const fn native_class(self) -> NativeClass {
        match self {
            Self::Integer => NativeClass::Integer,
            Self::BigInt => NativeClass::BigInt,
            Self::SmallInt => NativeClass::SmallInt,
            Self::Boolean => NativeClass::Boolean,
            Self::Text => NativeClass::Text,
            Self::String => NativeClass::Character,
            Self::Decimal => NativeClass::Numeric,
            Self::Float => NativeClass::DoublePrecision,
            Self::Date => NativeClass::Date,
            Self::DateTime => NativeClass::Timestamp,
            Self::DateTimeTz => NativeClass::TimestampTz,
            Self::Time => NativeClass::Time,
            Self::Guid => NativeClass::Uuid,
            Self::Blob | Self::Binary => NativeClass::Bytea,
        }
    }

    /// Returns whether the integer family applies.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::BigInt | Self::SmallInt)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equivalence classes of native storage.
///
/// Two logical types in the same class produce the same column on disk
/// (modulo length modifiers for [`NativeClass::Character`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeClass {
    /// `INT` / `SERIAL`.
    Integer,
    /// `BIGINT` / `BIGSERIAL`.
    BigInt,
    /// `SMALLINT`.
    SmallInt,
    /// `BOOLEAN`.
    Boolean,
    /// `TEXT`.
    Text,
    /// `VARCHAR(n)` / `CHAR(n)`.
    Character,
    /// `NUMERIC(p, s)`.
    Numeric,
    /// `DOUBLE PRECISION`.
    DoublePrecision,
    /// `DATE`.
    Date,
    /// `TIMESTAMP WITHOUT TIME ZONE`.
    Timestamp,
    /// `TIMESTAMP WITH TIME ZONE`.
    TimestampTz,
    /// `TIME`.
    Time,
    /// `UUID`.
    Uuid,
    /// `BYTEA`.
    Bytea,
}

impl NativeClass {
    /// Returns whether the declaration depends on the length and
    /// fixed-width flags of a column.
    #[must_use]
    pub const fn depends_on_length(self) -> bool {
        matches!(self, Self::Character)
    }
}

/// Returns whether a column moving from `from` to `to` keeps the same
/// native declaration regardless of length and fixed-width changes.
#[must_use]
pub fn equivalent_ignoring_length(from: LogicalType, to: LogicalType) -> bool {
    let class = to.native_class();
    from.native_class() == class && !class.depends_on_length()
}

/// Catalog spellings and the logical types they map to.
const NATIVE_TYPE_MAPPINGS: &[(&str, LogicalType)] = &[
    ("smallint", LogicalType::SmallInt),
    ("int2", LogicalType::SmallInt),
    ("serial", LogicalType::Integer),
    ("serial4", LogicalType::Integer),
    ("int", LogicalType::Integer),
    ("int4", LogicalType::Integer),
    ("integer", LogicalType::Integer),
    ("bigserial", LogicalType::BigInt),
    ("serial8", LogicalType::BigInt),
    ("bigint", LogicalType::BigInt),
    ("int8", LogicalType::BigInt),
    ("bool", LogicalType::Boolean),
    ("boolean", LogicalType::Boolean),
    ("text", LogicalType::Text),
    ("varchar", LogicalType::String),
    ("character varying", LogicalType::String),
    ("interval", LogicalType::String),
    ("_varchar", LogicalType::String),
    ("char", LogicalType::String),
    ("character", LogicalType::String),
    ("bpchar", LogicalType::String),
    ("inet", LogicalType::String),
    ("date", LogicalType::Date),
    ("datetime", LogicalType::DateTime),
    ("timestamp", LogicalType::DateTime),
    ("timestamptz", LogicalType::DateTimeTz),
    ("time", LogicalType::Time),
    ("timetz", LogicalType::Time),
    ("float", LogicalType::Float),
    ("float4", LogicalType::Float),
    ("float8", LogicalType::Float),
    ("double", LogicalType::Float),
    ("double precision", LogicalType::Float),
    ("real", LogicalType::Float),
    ("decimal", LogicalType::Decimal),
    ("money", LogicalType::Decimal),
    ("numeric", LogicalType::Decimal),
    ("year", LogicalType::Date),
    ("uuid", LogicalType::Guid),
    ("bytea", LogicalType::Blob),
];

/// Reduces a declaration or catalog spelling to its lookup key.
///
/// Lowercases, drops `(n)` modifiers and folds the `WITH/WITHOUT TIME ZONE`
/// suffixes: `TIMESTAMP(0) WITH TIME ZONE` becomes `timestamptz`.
#[must_use]
pub fn normalize_native_type(spelling: &str) -> String {
    let mut stripped = String::with_capacity(spelling.len());
    let mut depth = 0usize;
    for c in spelling.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(base) = collapsed.strip_suffix(" without time zone") {
        return base.to_string();
    }
    if let Some(base) = collapsed.strip_suffix(" with time zone") {
        return match base {
            "timestamp" => "timestamptz".to_string(),
            "time" => "timetz".to_string(),
            other => other.to_string(),
        };
    }
    collapsed
}

/// Bidirectional mapping between native spellings and logical types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    mappings: BTreeMap<String, LogicalType>,
}

impl TypeMap {
    /// Builds the mapping table, adding `extra` spellings on top of the
    /// built-in ones, and checks it for completeness.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::IncompleteTypeMapping`] if a logical type's
    /// declaration does not map back into its own equivalence class.
    pub fn new<'a>(extra: impl IntoIterator<Item = (&'a str, LogicalType)>) -> Result<Self> {
        let mut mappings: BTreeMap<String, LogicalType> = NATIVE_TYPE_MAPPINGS
            .iter()
            .map(|(native, logical)| ((*native).to_string(), *logical))
            .collect();
        for (native, logical) in extra {
            mappings.insert(normalize_native_type(native), logical);
        }
        let map = Self { mappings };
        map.validate()?;
        Ok(map)
    }

    /// Checks that every logical type round-trips through its declaration.
    fn validate(&self) -> Result<()> {
        for logical in LogicalType::ALL {
            let mut probes = vec![ColumnDescriptor::new("probe", logical)];
            if matches!(logical, LogicalType::Integer | LogicalType::BigInt) {
                probes.push(ColumnDescriptor::new("probe", logical).autoincrement());
            }
            for probe in probes {
                let declaration = type_declaration(&probe);
                let round_trips = self
                    .lookup(&declaration)
                    .is_some_and(|back| back.native_class() == logical.native_class());
                if !round_trips {
                    return Err(PlatformError::IncompleteTypeMapping {
                        logical,
                        declaration,
                    });
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, spelling: &str) -> Option<LogicalType> {
        self.mappings.get(&normalize_native_type(spelling)).copied()
    }

    /// Maps a native spelling (catalog name or full declaration) to its
    /// logical type.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnknownNativeType`] for unmapped spellings.
    pub fn logical_type(&self, spelling: &str) -> Result<LogicalType> {
        self.lookup(spelling).ok_or_else(|| {
            debug!(spelling, "no logical type mapping for native spelling");
            PlatformError::UnknownNativeType(spelling.to_string())
        })
    }

    /// Checks whether a native spelling is mapped.
    #[must_use]
    pub fn has_native_type(&self, spelling: &str) -> bool {
        self.lookup(spelling).is_some()
    }

    /// Iterates over all `(spelling, logical type)` pairs in spelling order.
    pub fn native_spellings(&self) -> impl Iterator<Item = (&str, LogicalType)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns every spelling that maps to `logical`.
    #[must_use]
    pub fn spellings_for(&self, logical: LogicalType) -> Vec<&str> {
        self.native_spellings()
            .filter(|(_, l)| *l == logical)
            .map(|(s, _)| s)
            .collect()
    }
}

/// Synthesizes the native type declaration for a column.
#[must_use]
pub fn type_declaration(column: &ColumnDescriptor) -> String {
    match column.logical_type {
        LogicalType::Integer if column.autoincrement => "SERIAL".to_string(),
        LogicalType::Integer => "INT".to_string(),
        LogicalType::BigInt if column.autoincrement => "BIGSERIAL".to_string(),
        LogicalType::BigInt => "BIGINT".to_string(),
        LogicalType::SmallInt => "SMALLINT".to_string(),
        LogicalType::Boolean => "BOOLEAN".to_string(),
        LogicalType::Text => "TEXT".to_string(),
        LogicalType::String => varchar_declaration(column.length, column.fixed),
        LogicalType::Decimal => format!(
            "NUMERIC({}, {})",
            column.precision.unwrap_or(DECIMAL_DEFAULT_PRECISION),
            column.scale.unwrap_or(DECIMAL_DEFAULT_SCALE)
        ),
        LogicalType::Float => "DOUBLE PRECISION".to_string(),
        LogicalType::Date => "DATE".to_string(),
        LogicalType::DateTime => "TIMESTAMP(0) WITHOUT TIME ZONE".to_string(),
        LogicalType::DateTimeTz => "TIMESTAMP(0) WITH TIME ZONE".to_string(),
        LogicalType::Time => "TIME(0) WITHOUT TIME ZONE".to_string(),
        LogicalType::Guid => "UUID".to_string(),
        // No native fixed/variable binary distinction.
        LogicalType::Blob | LogicalType::Binary => "BYTEA".to_string(),
    }
}

fn varchar_declaration(length: Option<u32>, fixed: bool) -> String {
    let length = length
        .filter(|len| *len > 0)
        .unwrap_or(VARCHAR_DEFAULT_LENGTH);
    if length > VARCHAR_MAX_LENGTH {
        return "TEXT".to_string();
    }
    if fixed {
        format!("CHAR({length})")
    } else {
        format!("VARCHAR({length})")
    }
}
