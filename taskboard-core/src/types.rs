use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Titles and ids of the board a fresh install starts with.
pub const DEFAULT_COLUMNS: &[(&str, &str)] = &[
    ("col-1", "To Do"),
    ("col-2", "In Progress"),
    ("col-3", "Done"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub column_id: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    pub order: usize,
}

/// Payload for creating a task. Only `text` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

impl From<&str> for TaskDraft {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TaskDraft {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Partial update for a task; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.description.is_none()
            && self.labels.is_none()
            && self.completed.is_none()
    }
}

/// Root snapshot of the board.
///
/// Snapshots are immutable: every engine operation returns a new `AppState`
/// that shares the `Arc`s of all records it did not touch. A no-op returns a
/// snapshot for which [`AppState::ptr_eq`] holds against its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub(crate) columns: Arc<[Arc<Column>]>,
    pub(crate) tasks: Arc<[Arc<Task>]>,
}

impl AppState {
    /// Build a snapshot from raw records without validating them.
    pub fn new(columns: Vec<Column>, tasks: Vec<Task>) -> Self {
        Self::from_shared(
            columns.into_iter().map(Arc::new).collect(),
            tasks.into_iter().map(Arc::new).collect(),
        )
    }

    pub(crate) fn from_shared(columns: Vec<Arc<Column>>, tasks: Vec<Arc<Task>>) -> Self {
        Self {
            columns: columns.into(),
            tasks: tasks.into(),
        }
    }

    pub(crate) fn with_columns(&self, columns: Vec<Arc<Column>>) -> Self {
        Self {
            columns: columns.into(),
            tasks: Arc::clone(&self.tasks),
        }
    }

    pub(crate) fn with_tasks(&self, tasks: Vec<Arc<Task>>) -> Self {
        Self {
            columns: Arc::clone(&self.columns),
            tasks: tasks.into(),
        }
    }

    /// True when both snapshots share the same column and task collections,
    /// i.e. nothing changed between them.
    pub fn ptr_eq(&self, other: &AppState) -> bool {
        Arc::ptr_eq(&self.columns, &other.columns) && Arc::ptr_eq(&self.tasks, &other.tasks)
    }

    /// Columns in storage order. Use [`AppState::sorted_columns`] for rank order.
    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    /// Tasks in storage order. Use [`AppState::column_tasks`] for rank order.
    pub fn tasks(&self) -> &[Arc<Task>] {
        &self.tasks
    }

    pub fn column(&self, column_id: &str) -> Option<&Arc<Column>> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn sorted_columns(&self) -> Vec<&Arc<Column>> {
        let mut columns: Vec<&Arc<Column>> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        columns
    }

    /// Tasks of one column sorted by rank. Ties keep storage order.
    pub fn column_tasks(&self, column_id: &str) -> Vec<&Arc<Task>> {
        let mut tasks: Vec<&Arc<Task>> = self
            .tasks
            .iter()
            .filter(|t| t.column_id == column_id)
            .collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }

    /// Every label used on the board, sorted and deduplicated.
    pub fn all_labels(&self) -> Vec<String> {
        self.tasks
            .iter()
            .flat_map(|t| t.labels.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for AppState {
    /// The three-column board used when nothing has been persisted yet.
    fn default() -> Self {
        let columns = DEFAULT_COLUMNS
            .iter()
            .enumerate()
            .map(|(order, (id, title))| Column {
                id: id.to_string(),
                title: title.to_string(),
                order,
            })
            .collect();
        Self::new(columns, Vec::new())
    }
}

impl PartialEq for AppState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.columns == other.columns && self.tasks == other.tasks)
    }
}

impl Eq for AppState {}
