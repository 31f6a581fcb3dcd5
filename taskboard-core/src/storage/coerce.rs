//! Defensive coercion of stored snapshots.
//!
//! Older or hand-edited blobs may miss fields or carry the wrong types. They
//! are coerced into a valid board instead of being rejected:
//! - missing or empty `columns` → the default columns
//! - non-array `tasks` → no tasks
//! - non-string text fields → empty string, invalid `labels` → none
//! - missing `completed` → false, missing numeric `order` → 0
//!
//! Records without an id, duplicate ids and tasks pointing at a column that
//! does not exist are dropped. Ranks are then renumbered to `0..n`, keeping
//! the stored order, so the engine never sees a gap or a tie.
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::board::normalize_labels;
use crate::types::{AppState, Column, Task};

pub fn coerce_snapshot(value: &Value) -> AppState {
    let mut columns = coerce_columns(value.get("columns"));
    if columns.is_empty() {
        columns = AppState::default()
            .columns()
            .iter()
            .map(|c| (c.order as f64, Column::clone(c)))
            .collect();
    }
    let ranks = renumber(&columns, |_| "");
    let columns: Vec<Column> = columns
        .into_iter()
        .zip(ranks)
        .map(|((_, column), order)| Column { order, ..column })
        .collect();

    let known: HashSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
    let mut tasks = coerce_tasks(value.get("tasks"));
    let before = tasks.len();
    tasks.retain(|(_, t)| known.contains(t.column_id.as_str()));
    if tasks.len() < before {
        log::warn!(
            target: "taskboard.storage",
            "Dropped {} task(s) referencing unknown columns",
            before - tasks.len()
        );
    }

    let ranks = renumber(&tasks, |t| t.column_id.as_str());
    let tasks: Vec<Task> = tasks
        .into_iter()
        .zip(ranks)
        .map(|((_, task), order)| Task { order, ..task })
        .collect();

    AppState::new(columns, tasks)
}

/// Dense ranks `0..n` per scope, following the stored rank keys. Ties keep
/// storage order, and the records themselves are not reordered.
fn renumber<T>(records: &[(f64, T)], scope: impl Fn(&T) -> &str) -> Vec<usize> {
    let mut by_key: Vec<usize> = (0..records.len()).collect();
    by_key.sort_by(|&a, &b| by_rank(records[a].0, records[b].0));

    let mut next: HashMap<&str, usize> = HashMap::new();
    let mut ranks = vec![0; records.len()];
    for i in by_key {
        let slot = next.entry(scope(&records[i].1)).or_insert(0);
        ranks[i] = *slot;
        *slot += 1;
    }
    ranks
}

fn coerce_columns(raw: Option<&Value>) -> Vec<(f64, Column)> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let id = string_field(item, "id");
            if id.is_empty() || !seen.insert(id.clone()) {
                return None;
            }
            let title = string_field(item, "title");
            let title = if title.trim().is_empty() {
                format!("Column {}", position + 1)
            } else {
                title
            };
            Some((rank_key(item), Column { id, title, order: 0 }))
        })
        .collect()
}

fn coerce_tasks(raw: Option<&Value>) -> Vec<(f64, Task)> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| {
            let id = string_field(item, "id");
            if id.is_empty() || !seen.insert(id.clone()) {
                return None;
            }
            let labels = item
                .get("labels")
                .and_then(Value::as_array)
                .map(|labels| normalize_labels(labels.iter().filter_map(Value::as_str)))
                .unwrap_or_default();
            let task = Task {
                id,
                column_id: string_field(item, "columnId"),
                text: string_field(item, "text"),
                description: string_field(item, "description"),
                labels,
                completed: item.get("completed").is_some_and(truthy),
                order: 0,
            };
            Some((rank_key(item), task))
        })
        .collect()
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn rank_key(item: &Value) -> f64 {
    item.get("order").and_then(Value::as_f64).unwrap_or(0.0)
}

fn by_rank(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Loose truthiness, as older blobs stored flags as numbers or strings.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_are_defaulted() {
        let state = coerce_snapshot(&json!({
            "columns": [{ "id": "c1", "title": "Todo", "order": 0 }],
            "tasks": [
                { "id": "t1", "columnId": "c1", "text": "Plan" },
                { "id": "t2", "columnId": "c1", "text": 42, "labels": "nope", "completed": 1, "order": 1 }
            ]
        }));
        let t1 = state.task("t1").unwrap();
        assert_eq!(t1.description, "");
        assert!(t1.labels.is_empty());
        assert!(!t1.completed);
        assert_eq!(t1.order, 0);

        let t2 = state.task("t2").unwrap();
        assert_eq!(t2.text, "");
        assert!(t2.labels.is_empty());
        assert!(t2.completed);
        assert_eq!(t2.order, 1);
    }

    #[test]
    fn test_missing_columns_fall_back_to_defaults() {
        let state = coerce_snapshot(&json!({ "columns": [], "tasks": "oops" }));
        assert_eq!(state, AppState::default());

        let state = coerce_snapshot(&json!(null));
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_dangling_and_anonymous_tasks_dropped() {
        let state = coerce_snapshot(&json!({
            "columns": [{ "id": "c1", "title": "Todo", "order": 0 }],
            "tasks": [
                { "id": "t1", "columnId": "gone", "text": "Orphan" },
                { "columnId": "c1", "text": "No id" },
                { "id": "t2", "columnId": "c1", "text": "Kept" },
                { "id": "t2", "columnId": "c1", "text": "Duplicate" }
            ]
        }));
        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.task("t2").unwrap().text, "Kept");
    }

    #[test]
    fn test_ranks_renumbered_in_stored_order() {
        let state = coerce_snapshot(&json!({
            "columns": [
                { "id": "b", "title": "B", "order": 7 },
                { "id": "a", "title": "A", "order": 3 }
            ],
            "tasks": [
                { "id": "t1", "columnId": "a", "text": "x", "order": 10 },
                { "id": "t2", "columnId": "a", "text": "y", "order": 2 },
                { "id": "t3", "columnId": "a", "text": "z" },
                { "id": "t4", "columnId": "b", "text": "w", "order": 5 }
            ]
        }));
        assert_eq!(state.column("a").unwrap().order, 0);
        assert_eq!(state.column("b").unwrap().order, 1);
        let ids: Vec<&str> = state.column_tasks("a").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
        assert_eq!(state.task("t4").unwrap().order, 0);
    }

    #[test]
    fn test_labels_filtered_and_deduplicated() {
        let state = coerce_snapshot(&json!({
            "columns": [{ "id": "c1", "title": "Todo", "order": 0 }],
            "tasks": [{ "id": "t1", "columnId": "c1", "text": "x", "labels": ["a", 3, "a", "b"] }]
        }));
        assert_eq!(state.task("t1").unwrap().labels, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_blank_column_title_replaced() {
        let state = coerce_snapshot(&json!({
            "columns": [{ "id": "c1", "title": "  ", "order": 0 }]
        }));
        assert_eq!(state.column("c1").unwrap().title, "Column 1");
    }
}
