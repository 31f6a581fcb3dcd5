//! Board state engine: pure transitions over [`AppState`] snapshots.
//!
//! Every operation borrows the current snapshot and returns the next one.
//! Records that an operation does not touch keep their `Arc`, and an
//! operation that changes nothing returns a snapshot that is `ptr_eq` to its
//! input. Unknown ids are no-ops: ids can go stale between the moment a
//! gesture is captured and the moment it is dispatched.
//!
//! Rank invariants held after every operation:
//! - column ranks are exactly `0..columns.len()`
//! - within each column, task ranks are exactly `0..n` (deletions and moves
//!   compact the affected columns eagerly)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ids;
use crate::types::{AppState, Column, Task, TaskDraft, TaskPatch};

impl AppState {
    /// Append a column titled `Column {n}` with a generated id.
    pub fn add_column(&self) -> AppState {
        self.add_column_with_id(ids::column_id())
    }

    pub fn add_column_with_id(&self, column_id: impl Into<String>) -> AppState {
        let id = column_id.into();
        if self.column(&id).is_some() {
            log::debug!("add_column: id {} already in use", id);
            return self.clone();
        }
        let column = Column {
            title: format!("Column {}", self.columns.len() + 1),
            order: next_rank(self.columns.iter().map(|c| c.order)),
            id,
        };
        let mut columns = self.columns.to_vec();
        columns.push(Arc::new(column));
        columns.sort_by_key(|c| c.order);
        self.with_columns(columns)
    }

    /// Remove a column together with every task that references it.
    pub fn delete_column(&self, column_id: &str) -> AppState {
        if self.column(column_id).is_none() {
            log::debug!("delete_column: unknown column {}", column_id);
            return self.clone();
        }
        let mut remaining: Vec<Arc<Column>> = self
            .columns
            .iter()
            .filter(|c| c.id != column_id)
            .cloned()
            .collect();
        remaining.sort_by_key(|c| c.order);
        let tasks = self
            .tasks
            .iter()
            .filter(|t| t.column_id != column_id)
            .cloned()
            .collect();
        AppState::from_shared(rerank_columns(remaining), tasks)
    }

    /// Replace a column title verbatim. A title that is blank after trimming
    /// is rejected and the previous title stays.
    pub fn update_column_title(&self, column_id: &str, title: &str) -> AppState {
        if title.trim().is_empty() {
            log::debug!("update_column_title: blank title for {} ignored", column_id);
            return self.clone();
        }
        self.map_columns(|column| {
            (column.id == column_id).then(|| Column {
                title: title.to_string(),
                ..column.clone()
            })
        })
    }

    /// Move the column at rank position `start` to position `end`, then
    /// assign every column its new position as rank.
    pub fn reorder_columns(&self, start: usize, end: usize) -> AppState {
        let mut sorted: Vec<Arc<Column>> = self.sorted_columns().into_iter().cloned().collect();
        if !move_item(&mut sorted, start, end) {
            log::debug!(
                "reorder_columns: {} -> {} out of range for {} columns",
                start,
                end,
                sorted.len()
            );
            return self.clone();
        }
        let columns = rerank_columns(sorted);
        if same_records(&columns, &self.columns) {
            return self.clone();
        }
        self.with_columns(columns)
    }

    /// Append a task to a column with a generated id.
    pub fn add_task(&self, column_id: &str, draft: impl Into<TaskDraft>) -> AppState {
        self.add_task_with_id(column_id, ids::task_id(), draft)
    }

    /// Append a task after the highest rank of `column_id`.
    ///
    /// Text and description are trimmed; labels are trimmed, blanks dropped
    /// and duplicates removed keeping the first occurrence. Blank text, an
    /// unknown column or an id already in use leave the state unchanged.
    pub fn add_task_with_id(
        &self,
        column_id: &str,
        task_id: impl Into<String>,
        draft: impl Into<TaskDraft>,
    ) -> AppState {
        let draft = draft.into();
        let id = task_id.into();
        let text = draft.text.trim();
        if text.is_empty() {
            return self.clone();
        }
        if self.column(column_id).is_none() {
            log::debug!("add_task: unknown column {}", column_id);
            return self.clone();
        }
        if self.task(&id).is_some() {
            log::debug!("add_task: id {} already in use", id);
            return self.clone();
        }

        let task = Task {
            id,
            column_id: column_id.to_string(),
            text: text.to_string(),
            description: draft
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            labels: normalize_labels(draft.labels.iter().flatten()),
            completed: false,
            order: next_rank(
                self.tasks
                    .iter()
                    .filter(|t| t.column_id == column_id)
                    .map(|t| t.order),
            ),
        };
        let mut tasks = self.tasks.to_vec();
        tasks.push(Arc::new(task));
        self.with_tasks(tasks)
    }

    pub fn delete_task(&self, task_id: &str) -> AppState {
        self.delete_tasks(&[task_id])
    }

    /// Remove every listed task and compact the ranks of the columns they
    /// were in.
    pub fn delete_tasks<S: AsRef<str>>(&self, task_ids: &[S]) -> AppState {
        let doomed: HashSet<&str> = task_ids.iter().map(|id| id.as_ref()).collect();
        let mut touched: HashSet<String> = HashSet::new();
        let remaining: Vec<Arc<Task>> = self
            .tasks
            .iter()
            .filter(|t| {
                if doomed.contains(t.id.as_str()) {
                    touched.insert(t.column_id.clone());
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        if touched.is_empty() {
            return self.clone();
        }
        self.with_tasks(compact_columns(remaining, &touched))
    }

    /// Shallow-merge `patch` onto a task.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> AppState {
        self.map_tasks(|task| {
            if task.id != task_id {
                return None;
            }
            let mut next = task.clone();
            if let Some(text) = &patch.text {
                next.text = text.clone();
            }
            if let Some(description) = &patch.description {
                next.description = description.clone();
            }
            if let Some(labels) = &patch.labels {
                next.labels = normalize_labels(labels);
            }
            if let Some(completed) = patch.completed {
                next.completed = completed;
            }
            Some(next)
        })
    }

    pub fn set_tasks_completed<S: AsRef<str>>(&self, task_ids: &[S], completed: bool) -> AppState {
        let selected: HashSet<&str> = task_ids.iter().map(|id| id.as_ref()).collect();
        self.map_tasks(|task| {
            selected.contains(task.id.as_str()).then(|| Task {
                completed,
                ..task.clone()
            })
        })
    }

    pub fn move_task_to_column(&self, task_id: &str, target_column_id: &str) -> AppState {
        self.move_tasks_to_column(&[task_id], target_column_id)
    }

    /// Move tasks into `target_column_id`, appended after the tasks already
    /// there as one block in the order the ids were given.
    ///
    /// Unknown and repeated ids are skipped. Tasks that already live in the
    /// target are moved to the end as well. Source columns are compacted.
    pub fn move_tasks_to_column<S: AsRef<str>>(
        &self,
        task_ids: &[S],
        target_column_id: &str,
    ) -> AppState {
        if self.column(target_column_id).is_none() {
            log::debug!("move_tasks_to_column: unknown column {}", target_column_id);
            return self.clone();
        }

        let mut seen: HashSet<String> = HashSet::new();
        let batch: Vec<&Arc<Task>> = task_ids
            .iter()
            .filter_map(|id| self.task(id.as_ref()))
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        if batch.is_empty() {
            return self.clone();
        }

        let base = next_rank(
            self.tasks
                .iter()
                .filter(|t| t.column_id == target_column_id && !seen.contains(&t.id))
                .map(|t| t.order),
        );
        let batch_ranks: HashMap<String, usize> = batch
            .iter()
            .enumerate()
            .map(|(offset, task)| (task.id.clone(), base + offset))
            .collect();
        let mut touched: HashSet<String> = batch.iter().map(|t| t.column_id.clone()).collect();
        touched.insert(target_column_id.to_string());

        let tasks: Vec<Arc<Task>> = self
            .tasks
            .iter()
            .map(|task| match batch_ranks.get(&task.id) {
                Some(&order) => replace_if_changed(
                    task,
                    Task {
                        column_id: target_column_id.to_string(),
                        order,
                        ..Task::clone(task)
                    },
                ),
                None => Arc::clone(task),
            })
            .collect();
        let tasks = compact_columns(tasks, &touched);
        if same_records(&tasks, &self.tasks) {
            return self.clone();
        }
        self.with_tasks(tasks)
    }

    /// Move the task at rank position `start` of a column to position `end`
    /// and renumber that column. Other columns are untouched.
    pub fn reorder_tasks(&self, column_id: &str, start: usize, end: usize) -> AppState {
        let mut ranked = self.column_tasks(column_id);
        if !move_item(&mut ranked, start, end) {
            log::debug!(
                "reorder_tasks: {} -> {} out of range for column {} ({} tasks)",
                start,
                end,
                column_id,
                ranked.len()
            );
            return self.clone();
        }
        let ranks: HashMap<String, usize> = ranked
            .iter()
            .enumerate()
            .map(|(rank, task)| (task.id.clone(), rank))
            .collect();
        self.map_tasks(|task| {
            if task.column_id != column_id {
                return None;
            }
            ranks.get(&task.id).map(|&order| Task {
                order,
                ..task.clone()
            })
        })
    }

    /// Rebuild the task list, replacing records for which `f` returns a
    /// different value. Returns `self` unchanged when nothing differs.
    fn map_tasks(&self, mut f: impl FnMut(&Task) -> Option<Task>) -> AppState {
        let tasks: Vec<Arc<Task>> = self
            .tasks
            .iter()
            .map(|task| match f(&**task) {
                Some(next) => replace_if_changed(task, next),
                None => Arc::clone(task),
            })
            .collect();
        if same_records(&tasks, &self.tasks) {
            return self.clone();
        }
        self.with_tasks(tasks)
    }

    fn map_columns(&self, mut f: impl FnMut(&Column) -> Option<Column>) -> AppState {
        let columns: Vec<Arc<Column>> = self
            .columns
            .iter()
            .map(|column| match f(&**column) {
                Some(next) => replace_if_changed(column, next),
                None => Arc::clone(column),
            })
            .collect();
        if same_records(&columns, &self.columns) {
            return self.clone();
        }
        self.with_columns(columns)
    }
}

/// Remove the element at `start` and reinsert it at `end`.
/// Returns false, leaving `items` alone, when either index is out of range.
fn move_item<T>(items: &mut Vec<T>, start: usize, end: usize) -> bool {
    if start >= items.len() || end >= items.len() {
        return false;
    }
    let item = items.remove(start);
    items.insert(end, item);
    true
}

fn next_rank(ranks: impl Iterator<Item = usize>) -> usize {
    ranks.max().map_or(0, |max| max + 1)
}

fn replace_if_changed<T: Clone + PartialEq>(current: &Arc<T>, next: T) -> Arc<T> {
    if **current == next {
        Arc::clone(current)
    } else {
        Arc::new(next)
    }
}

fn same_records<T>(a: &[Arc<T>], b: &[Arc<T>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}

/// Assign each column its position in `sorted` as rank.
fn rerank_columns(sorted: Vec<Arc<Column>>) -> Vec<Arc<Column>> {
    sorted
        .iter()
        .enumerate()
        .map(|(order, column)| {
            replace_if_changed(
                column,
                Column {
                    order,
                    ..Column::clone(column)
                },
            )
        })
        .collect()
}

/// Renumber the tasks of each listed column to `0..n`, keeping their rank
/// order (ties keep storage order).
pub(crate) fn compact_columns(
    mut tasks: Vec<Arc<Task>>,
    columns: &HashSet<String>,
) -> Vec<Arc<Task>> {
    for column_id in columns {
        let mut positions: Vec<usize> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| &t.column_id == column_id)
            .map(|(i, _)| i)
            .collect();
        positions.sort_by_key(|&i| tasks[i].order);
        for (rank, i) in positions.into_iter().enumerate() {
            if tasks[i].order != rank {
                let next = Task {
                    order: rank,
                    ..Task::clone(&tasks[i])
                };
                tasks[i] = Arc::new(next);
            }
        }
    }
    tasks
}

/// Trim labels, drop blanks and keep only the first occurrence of each.
pub(crate) fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}
