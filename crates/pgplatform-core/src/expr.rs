//! SQL expression fragments in PostgreSQL syntax.
//!
//! Arguments are SQL expressions and are inserted verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::PostgresPlatform;

/// Unit of a date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateIntervalUnit {
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Weeks.
    Week,
    /// Months.
    Month,
    /// Expressed as three months.
    Quarter,
    /// Years.
    Year,
}

impl DateIntervalUnit {
    /// Returns the PostgreSQL interval unit keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Second => "SECOND",
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Quarter => "QUARTER",
            Self::Year => "YEAR",
        }
    }
}

impl fmt::Display for DateIntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Direction of date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperator {
    /// `date + interval`.
    Add,
    /// `date - interval`.
    Sub,
}

impl DateOperator {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
        }
    }
}

impl PostgresPlatform {
    /// `SUBSTRING(value FROM from[ FOR length])`.
    #[must_use]
    pub fn substring_expression(&self, value: &str, from: &str, length: Option<&str>) -> String {
        match length {
            Some(length) => format!("SUBSTRING({value} FROM {from} FOR {length})"),
            None => format!("SUBSTRING({value} FROM {from})"),
        }
    }

    /// Position of `substr` in `string`, 1-based, 0 when absent.
    ///
    /// With a start position the search runs on the suffix and the result
    /// is shifted back into the full string.
    #[must_use]
    pub fn locate_expression(&self, string: &str, substr: &str, start: Option<i64>) -> String {
        match start {
            Some(start) => {
                let suffix = self.substring_expression(string, &start.to_string(), None);
                format!(
                    "CASE WHEN (POSITION({substr} IN {suffix}) = 0) THEN 0 \
                     ELSE (POSITION({substr} IN {suffix}) + {}) END",
                    start.saturating_sub(1)
                )
            }
            None => format!("POSITION({substr} IN {string})"),
        }
    }

    /// Difference in days between two dates.
    #[must_use]
    pub fn date_diff_expression(&self, date1: &str, date2: &str) -> String {
        format!("(DATE({date1})-DATE({date2}))")
    }

    /// Adds or subtracts `interval` units to `date`.
    #[must_use]
    pub fn date_arithmetic_expression(
        &self,
        date: &str,
        operator: DateOperator,
        interval: i64,
        unit: DateIntervalUnit,
    ) -> String {
        let (interval, unit) = match unit {
            DateIntervalUnit::Quarter => (interval.saturating_mul(3), DateIntervalUnit::Month),
            other => (interval, other),
        };
        format!(
            "({date} {} ({interval} || ' {unit}')::interval)",
            operator.as_sql()
        )
    }

    /// Shorthand for [`DateOperator::Add`] arithmetic.
    #[must_use]
    pub fn date_add_expression(&self, date: &str, interval: i64, unit: DateIntervalUnit) -> String {
        self.date_arithmetic_expression(date, DateOperator::Add, interval, unit)
    }

    /// Shorthand for [`DateOperator::Sub`] arithmetic.
    #[must_use]
    pub fn date_sub_expression(&self, date: &str, interval: i64, unit: DateIntervalUnit) -> String {
        self.date_arithmetic_expression(date, DateOperator::Sub, interval, unit)
    }

    /// Current timestamp without fractional seconds.
    #[must_use]
    pub const fn now_expression(&self) -> &'static str {
        "LOCALTIMESTAMP(0)"
    }

    /// Pattern-matching operator.
    #[must_use]
    pub const fn regexp_expression(&self) -> &'static str {
        "SIMILAR TO"
    }

    /// Server-side UUID generation (`uuid-ossp`).
    #[must_use]
    pub const fn guid_expression(&self) -> &'static str {
        "UUID_GENERATE_V4()"
    }

    /// Shared row lock clause.
    #[must_use]
    pub const fn read_lock_sql(&self) -> &'static str {
        "FOR SHARE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    fn platform() -> PostgresPlatform {
        PostgresPlatform::new(PlatformConfig::default()).unwrap()
    }

    #[test]
    fn test_substring() {
        let p = platform();
        assert_eq!(p.substring_expression("name", "2", None), "SUBSTRING(name FROM 2)");
        assert_eq!(
            p.substring_expression("name", "2", Some("3")),
            "SUBSTRING(name FROM 2 FOR 3)"
        );
    }

    #[test]
    fn test_locate() {
        let p = platform();
        assert_eq!(p.locate_expression("name", "'a'", None), "POSITION('a' IN name)");
        assert_eq!(
            p.locate_expression("name", "'a'", Some(3)),
            "CASE WHEN (POSITION('a' IN SUBSTRING(name FROM 3)) = 0) THEN 0 \
             ELSE (POSITION('a' IN SUBSTRING(name FROM 3)) + 2) END"
        );
    }

    #[test]
    fn test_date_arithmetic() {
        let p = platform();
        assert_eq!(
            p.date_add_expression("created", 5, DateIntervalUnit::Day),
            "(created + (5 || ' DAY')::interval)"
        );
        assert_eq!(
            p.date_sub_expression("created", 2, DateIntervalUnit::Quarter),
            "(created - (6 || ' MONTH')::interval)"
        );
        assert_eq!(p.date_diff_expression("a", "b"), "(DATE(a)-DATE(b))");
    }

    #[test]
    fn test_extreme_intervals_saturate() {
        let p = platform();
        assert_eq!(
            p.date_add_expression("d", i64::MAX, DateIntervalUnit::Quarter),
            format!("(d + ({} || ' MONTH')::interval)", i64::MAX)
        );
        assert_eq!(
            p.date_sub_expression("d", i64::MIN, DateIntervalUnit::Quarter),
            format!("(d - ({} || ' MONTH')::interval)", i64::MIN)
        );
        let sql = p.locate_expression("name", "'a'", Some(i64::MIN));
        assert!(sql.ends_with(&format!("+ {}) END", i64::MIN)), "{sql}");
    }

    #[test]
    fn test_constant_fragments() {
        let p = platform();
        assert_eq!(p.now_expression(), "LOCALTIMESTAMP(0)");
        assert_eq!(p.regexp_expression(), "SIMILAR TO");
        assert_eq!(p.guid_expression(), "UUID_GENERATE_V4()");
        assert_eq!(p.read_lock_sql(), "FOR SHARE");
    }
}
