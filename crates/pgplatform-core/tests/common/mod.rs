#![allow(dead_code)]

use pgplatform_core::{
    ColumnDescriptor, ColumnDiff, ColumnProperty, LogicalType, PlatformConfig, PostgresPlatform,
    TableDiff,
};

pub fn platform() -> PostgresPlatform {
    PostgresPlatform::new(PlatformConfig::default())
        .unwrap_or_else(|e| panic!("Failed to build platform: {e}"))
}

pub fn compile(diff: &TableDiff) -> Vec<String> {
    platform()
        .alter_table_sql(diff)
        .unwrap_or_else(|e| panic!("Failed to compile diff for {}: {e}", diff.name))
}

pub fn column(name: &str, logical_type: LogicalType) -> ColumnDescriptor {
    ColumnDescriptor::new(name, logical_type)
}

pub fn changed(
    table: &str,
    column: ColumnDescriptor,
    props: impl IntoIterator<Item = ColumnProperty>,
) -> TableDiff {
    let name = column.name.clone();
    TableDiff::new(table).change_column(ColumnDiff::new(name, column, props))
}

/// Index of the first statement starting with `prefix`.
pub fn position(sql: &[String], prefix: &str) -> usize {
    sql.iter()
        .position(|s| s.starts_with(prefix))
        .unwrap_or_else(|| panic!("No statement starting with {prefix:?} in {sql:#?}"))
}
