//! Multi-select state for bulk operations.
//!
//! The selection is owned by the caller and never persisted. Engine bulk
//! operations only take the ids it holds.
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::{AppState, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, task_id: &str) -> bool {
        self.ids.contains(task_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn select(&mut self, task_id: impl Into<String>) {
        self.ids.insert(task_id.into());
    }

    /// Flip one task in or out of the selection.
    pub fn toggle(&mut self, task_id: &str) {
        if !self.ids.remove(task_id) {
            self.ids.insert(task_id.to_string());
        }
    }

    /// Replace the selection with exactly `tasks`.
    pub fn select_all<'t>(&mut self, tasks: impl IntoIterator<Item = &'t Arc<Task>>) {
        self.ids = tasks.into_iter().map(|t| t.id.clone()).collect();
    }

    /// Clear the selection when every one of `tasks` is already selected,
    /// otherwise select exactly `tasks`. Used for a column's "select all"
    /// checkbox.
    pub fn toggle_all<'t>(&mut self, tasks: impl IntoIterator<Item = &'t Arc<Task>>) {
        let ids: BTreeSet<String> = tasks.into_iter().map(|t| t.id.clone()).collect();
        if !ids.is_empty() && ids.iter().all(|id| self.ids.contains(id)) {
            self.ids.clear();
        } else {
            self.ids = ids;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist in `state`.
    pub fn retain_existing(&mut self, state: &AppState) {
        self.ids.retain(|id| state.task(id).is_some());
    }

    /// Selected ids in board order: column rank first, then task rank.
    /// Ids missing from `state` are left out.
    pub fn in_board_order(&self, state: &AppState) -> Vec<String> {
        state
            .sorted_columns()
            .into_iter()
            .flat_map(|column| state.column_tasks(&column.id))
            .filter(|task| self.ids.contains(&task.id))
            .map(|task| task.id.clone())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
