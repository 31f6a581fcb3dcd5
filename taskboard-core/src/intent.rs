//! Drag and drop decoding.
//!
//! A drop is described by what was dragged and what it landed on. Task
//! indices are positions in the list the user was looking at, which may be
//! filtered by a search, so [`resolve_drop`] maps them back to positions in
//! the unfiltered rank order before anything touches the board.
use serde::{Deserialize, Serialize};

use crate::types::{AppState, Task};

/// The thing being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DragSource {
    #[serde(rename_all = "camelCase")]
    Task {
        task_id: String,
        column_id: String,
        index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Column { column_id: String, index: usize },
}

/// The element a drag was released over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DropTarget {
    #[serde(rename_all = "camelCase")]
    Task { column_id: String, index: usize },
    #[serde(rename_all = "camelCase")]
    Column { column_id: String, index: usize },
}

/// A board change decoded from a gesture, in canonical positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardIntent {
    #[serde(rename_all = "camelCase")]
    ReorderTasks {
        column_id: String,
        start: usize,
        end: usize,
    },
    #[serde(rename_all = "camelCase")]
    MoveTask { task_id: String, column_id: String },
    ReorderColumns { start: usize, end: usize },
}

impl BoardIntent {
    pub fn apply(&self, state: &AppState) -> AppState {
        match self {
            BoardIntent::ReorderTasks {
                column_id,
                start,
                end,
            } => state.reorder_tasks(column_id, *start, *end),
            BoardIntent::MoveTask { task_id, column_id } => {
                state.move_task_to_column(task_id, column_id)
            }
            BoardIntent::ReorderColumns { start, end } => state.reorder_columns(*start, *end),
        }
    }
}

/// Turn a drop into a board intent, or `None` when the drop changes nothing.
///
/// `visible` is the predicate the dragged-over list was filtered with (for
/// example [`crate::search::TaskFilter::accepts`]). For a task dropped on
/// another task of the same column, the target index is looked up in the
/// filtered list to find the destination task, and the reorder uses the
/// source and destination tasks' positions in the full rank order.
pub fn resolve_drop<F>(
    state: &AppState,
    source: &DragSource,
    target: &DropTarget,
    visible: F,
) -> Option<BoardIntent>
where
    F: Fn(&Task) -> bool,
{
    match (source, target) {
        (
            DragSource::Task {
                task_id,
                column_id,
                index,
            },
            DropTarget::Task {
                column_id: target_column,
                index: target_index,
            },
        ) => {
            if column_id != target_column || index == target_index {
                return None;
            }
            let full = state.column_tasks(column_id);
            let dest_id = full
                .iter()
                .filter(|t| {
                    let task: &Task = t;
                    visible(task)
                })
                .nth(*target_index)
                .map(|t| t.id.as_str())?;
            if dest_id == task_id {
                return None;
            }
            let start = full.iter().position(|t| &t.id == task_id)?;
            let end = full.iter().position(|t| t.id == dest_id)?;
            Some(BoardIntent::ReorderTasks {
                column_id: column_id.clone(),
                start,
                end,
            })
        }
        (
            DragSource::Task {
                task_id, column_id, ..
            },
            DropTarget::Column {
                column_id: target_column,
                ..
            },
        ) => (column_id != target_column).then(|| BoardIntent::MoveTask {
            task_id: task_id.clone(),
            column_id: target_column.clone(),
        }),
        (
            DragSource::Column { index, .. },
            DropTarget::Column {
                index: target_index,
                ..
            },
        ) => (index != target_index).then_some(BoardIntent::ReorderColumns {
            start: *index,
            end: *target_index,
        }),
        (DragSource::Column { .. }, DropTarget::Task { .. }) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn board() -> AppState {
        let task = |id: &str, order| Task {
            id: id.into(),
            column_id: "c1".into(),
            text: format!("{} item", id),
            description: String::new(),
            labels: Vec::new(),
            completed: false,
            order,
        };
        AppState::new(
            vec![
                Column {
                    id: "c1".into(),
                    title: "One".into(),
                    order: 0,
                },
                Column {
                    id: "c2".into(),
                    title: "Two".into(),
                    order: 1,
                },
            ],
            vec![
                task("apple", 0),
                task("banana", 1),
                task("apricot", 2),
                task("cherry", 3),
            ],
        )
    }

    fn drag_task(task_id: &str, index: usize) -> DragSource {
        DragSource::Task {
            task_id: task_id.into(),
            column_id: "c1".into(),
            index,
        }
    }

    #[test]
    fn test_reorder_resolves_filtered_indices() {
        let state = board();
        // Only "apple" and "apricot" are visible; apricot sits at visible
        // index 1 but canonical index 2.
        let visible = |t: &Task| t.id.starts_with("ap");
        let target = DropTarget::Task {
            column_id: "c1".into(),
            index: 1,
        };
        let intent = resolve_drop(&state, &drag_task("apple", 0), &target, visible).unwrap();
        assert_eq!(
            intent,
            BoardIntent::ReorderTasks {
                column_id: "c1".into(),
                start: 0,
                end: 2,
            }
        );

        let next = intent.apply(&state);
        let ids: Vec<&str> = next.column_tasks("c1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["banana", "apricot", "apple", "cherry"]);
    }

    #[test]
    fn test_drop_on_self_or_same_index_is_none() {
        let state = board();
        let target = DropTarget::Task {
            column_id: "c1".into(),
            index: 0,
        };
        assert!(resolve_drop(&state, &drag_task("apple", 0), &target, |_| true).is_none());
        // Visible index 1 resolves back to the dragged task itself.
        let target = DropTarget::Task {
            column_id: "c1".into(),
            index: 1,
        };
        let only_banana = |t: &Task| t.id != "apple";
        assert!(resolve_drop(&state, &drag_task("banana", 0), &target, only_banana).is_some());
        let self_drop = |t: &Task| t.id == "apple" || t.id == "banana";
        assert!(resolve_drop(&state, &drag_task("banana", 0), &target, self_drop).is_none());
    }

    #[test]
    fn test_drop_on_other_column_moves() {
        let state = board();
        let target = DropTarget::Column {
            column_id: "c2".into(),
            index: 1,
        };
        let intent = resolve_drop(&state, &drag_task("cherry", 3), &target, |_| true).unwrap();
        let next = intent.apply(&state);
        assert_eq!(next.task("cherry").unwrap().column_id, "c2");

        let same = DropTarget::Column {
            column_id: "c1".into(),
            index: 0,
        };
        assert!(resolve_drop(&state, &drag_task("cherry", 3), &same, |_| true).is_none());
    }

    #[test]
    fn test_column_drops() {
        let state = board();
        let source = DragSource::Column {
            column_id: "c1".into(),
            index: 0,
        };
        let target = DropTarget::Column {
            column_id: "c2".into(),
            index: 1,
        };
        let intent = resolve_drop(&state, &source, &target, |_| true).unwrap();
        assert_eq!(intent, BoardIntent::ReorderColumns { start: 0, end: 1 });

        let onto_task = DropTarget::Task {
            column_id: "c2".into(),
            index: 0,
        };
        assert!(resolve_drop(&state, &source, &onto_task, |_| true).is_none());
    }

    #[test]
    fn test_payload_wire_shape() {
        let json = serde_json::to_value(drag_task("apple", 0)).unwrap();
        assert_eq!(json["type"], "task");
        assert_eq!(json["taskId"], "apple");
        assert_eq!(json["columnId"], "c1");
    }
}
