//! Extension points for ALTER TABLE compilation.

use crate::diff::{ColumnDiff, TableDiff};
use crate::platform::PostgresPlatform;
use crate::schema::ColumnDescriptor;

/// Result of offering an event to a hook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookOutcome {
    /// The compiler generates its default statements.
    #[default]
    NotHandled,
    /// The hook owns the event; its statements replace the default ones
    /// and are appended after the default sequence.
    Handled(Vec<String>),
}

impl HookOutcome {
    /// Returns whether the hook claimed the event.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// Hooks consulted for each event of an ALTER TABLE compilation.
///
/// Every method defaults to [`HookOutcome::NotHandled`].
pub trait AlterTableHooks {
    /// Called for each added column.
    fn on_add_column(
        &self,
        _column: &ColumnDescriptor,
        _diff: &TableDiff,
        _platform: &PostgresPlatform,
    ) -> HookOutcome {
        HookOutcome::NotHandled
    }

    /// Called for each removed column.
    fn on_remove_column(
        &self,
        _column: &ColumnDescriptor,
        _diff: &TableDiff,
        _platform: &PostgresPlatform,
    ) -> HookOutcome {
        HookOutcome::NotHandled
    }

    /// Called for each changed column.
    fn on_change_column(
        &self,
        _change: &ColumnDiff,
        _diff: &TableDiff,
        _platform: &PostgresPlatform,
    ) -> HookOutcome {
        HookOutcome::NotHandled
    }

    /// Called for each renamed column.
    fn on_rename_column(
        &self,
        _old_name: &str,
        _column: &ColumnDescriptor,
        _diff: &TableDiff,
        _platform: &PostgresPlatform,
    ) -> HookOutcome {
        HookOutcome::NotHandled
    }

    /// Called once per table. Claiming it suppresses the table rename.
    fn on_alter_table(&self, _diff: &TableDiff, _platform: &PostgresPlatform) -> HookOutcome {
        HookOutcome::NotHandled
    }
}

/// Hooks that never claim an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl AlterTableHooks for NoHooks {}
