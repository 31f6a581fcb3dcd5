//! Executes parsed commands against a board session.
//!
//! The engine ignores stale ids silently; here they are checked up front so
//! the user hears about typos.
use anyhow::{bail, Result};
use taskboard_core::ids;
use taskboard_core::selection::Selection;
use taskboard_core::storage::SnapshotStore;
use taskboard_core::{AppState, BoardSession, SearchMode, TaskDraft, TaskFilter, TaskPatch};

use crate::render;
use crate::{ColumnCommands, Commands, TaskCommands};

/// Run one command and return what should be printed.
pub fn run<S: SnapshotStore>(
    session: &mut BoardSession<S>,
    command: Commands,
    mode: SearchMode,
) -> Result<String> {
    match command {
        Commands::Show { query, plain } => {
            let filter = TaskFilter::new(query.unwrap_or_default(), pick_mode(mode, plain));
            Ok(render::board(session.state(), &filter))
        }
        Commands::Search { query, plain } => {
            let filter = TaskFilter::new(query, pick_mode(mode, plain));
            Ok(render::search_results(session.state(), &filter))
        }
        Commands::Column { command } => run_column(session, command),
        Commands::Task { command } => run_task(session, command),
    }
}

fn pick_mode(configured: SearchMode, plain: bool) -> SearchMode {
    if plain {
        SearchMode::Plain
    } else {
        configured
    }
}

fn run_column<S: SnapshotStore>(
    session: &mut BoardSession<S>,
    command: ColumnCommands,
) -> Result<String> {
    match command {
        ColumnCommands::Add { title } => {
            let id = ids::column_id();
            session.apply(|s| {
                let next = s.add_column_with_id(id.clone());
                match title.as_deref() {
                    Some(title) => next.update_column_title(&id, title),
                    None => next,
                }
            });
            let title = column_title(session.state(), &id)?;
            Ok(format!("Added column \"{}\" ({})", title, id))
        }
        ColumnCommands::Rename { id, title } => {
            require_column(session.state(), &id)?;
            if title.trim().is_empty() {
                bail!("Column title cannot be blank");
            }
            session.apply(|s| s.update_column_title(&id, &title));
            Ok(format!("Renamed column {} to \"{}\"", id, title))
        }
        ColumnCommands::Delete { id } => {
            let title = column_title(session.state(), &id)?;
            let removed = session.state().column_tasks(&id).len();
            session.apply(|s| s.delete_column(&id));
            Ok(format!(
                "Deleted column \"{}\" and {} task(s)",
                title, removed
            ))
        }
        ColumnCommands::Move { from, to } => {
            let count = session.state().columns().len();
            if from >= count || to >= count {
                bail!("Column positions must be below {}", count);
            }
            session.apply(|s| s.reorder_columns(from, to));
            Ok(format!("Moved column {} to position {}", from, to))
        }
    }
}

fn run_task<S: SnapshotStore>(
    session: &mut BoardSession<S>,
    command: TaskCommands,
) -> Result<String> {
    match command {
        TaskCommands::Add {
            column,
            text,
            description,
            labels,
        } => {
            require_column(session.state(), &column)?;
            if text.trim().is_empty() {
                bail!("Task text cannot be blank");
            }
            let mut draft = TaskDraft::new(text).labels(labels);
            if let Some(description) = description {
                draft = draft.description(description);
            }
            let id = ids::task_id();
            session.apply(|s| s.add_task_with_id(&column, id.clone(), draft));
            Ok(format!("Added task {}", id))
        }
        TaskCommands::Edit {
            id,
            text,
            description,
            labels,
            clear_labels,
        } => {
            require_tasks(session.state(), std::slice::from_ref(&id))?;
            if text.as_deref().is_some_and(|t| t.trim().is_empty()) {
                bail!("Task text cannot be blank");
            }
            let patch = TaskPatch {
                text: text.map(|t| t.trim().to_string()),
                description: description.map(|d| d.trim().to_string()),
                labels: if clear_labels {
                    Some(Vec::new())
                } else if labels.is_empty() {
                    None
                } else {
                    Some(labels)
                },
                completed: None,
            };
            if patch.is_empty() {
                bail!("Nothing to change; pass --text, --description or --label");
            }
            let changed = session.apply(|s| s.update_task(&id, &patch));
            Ok(if changed {
                format!("Updated task {}", id)
            } else {
                format!("Task {} already up to date", id)
            })
        }
        TaskCommands::Done { ids } => set_completed(session, ids, true),
        TaskCommands::Reopen { ids } => set_completed(session, ids, false),
        TaskCommands::Delete { ids } => {
            let selection = select(session.state(), ids)?;
            let doomed = selection.in_board_order(session.state());
            session.apply(|s| s.delete_tasks(&doomed));
            Ok(format!("Deleted {} task(s)", doomed.len()))
        }
        TaskCommands::Move { column, ids } => {
            let title = column_title(session.state(), &column)?;
            require_tasks(session.state(), &ids)?;
            session.apply(|s| s.move_tasks_to_column(&ids, &column));
            Ok(format!("Moved {} task(s) to \"{}\"", dedup_count(&ids), title))
        }
        TaskCommands::Reorder { column, from, to } => {
            require_column(session.state(), &column)?;
            let count = session.state().column_tasks(&column).len();
            if from >= count || to >= count {
                bail!("Task positions in {} must be below {}", column, count);
            }
            session.apply(|s| s.reorder_tasks(&column, from, to));
            Ok(format!("Moved task {} to position {} in {}", from, to, column))
        }
    }
}

fn set_completed<S: SnapshotStore>(
    session: &mut BoardSession<S>,
    ids: Vec<String>,
    completed: bool,
) -> Result<String> {
    let selection = select(session.state(), ids)?;
    let targets = selection.in_board_order(session.state());
    session.apply(|s| s.set_tasks_completed(&targets, completed));
    let verb = if completed { "Completed" } else { "Reopened" };
    Ok(format!("{} {} task(s)", verb, targets.len()))
}

/// Build a selection from command-line ids, rejecting unknown ones.
fn select(state: &AppState, ids: Vec<String>) -> Result<Selection> {
    require_tasks(state, &ids)?;
    Ok(ids.into_iter().collect())
}

fn require_tasks(state: &AppState, ids: &[String]) -> Result<()> {
    let unknown: Vec<&str> = ids
        .iter()
        .filter(|id| state.task(id).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        bail!("Unknown task id(s): {}", unknown.join(", "));
    }
    Ok(())
}

fn require_column(state: &AppState, id: &str) -> Result<()> {
    column_title(state, id).map(|_| ())
}

fn column_title(state: &AppState, id: &str) -> Result<String> {
    match state.column(id) {
        Some(column) => Ok(column.title.clone()),
        None => bail!("Unknown column id: {}", id),
    }
}

fn dedup_count(ids: &[String]) -> usize {
    ids.iter()
        .collect::<std::collections::HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::storage::MemoryStore;

    fn session() -> BoardSession<MemoryStore> {
        console::set_colors_enabled(false);
        let state = AppState::default()
            .add_task_with_id("col-1", "t1", "Write report")
            .add_task_with_id("col-1", "t2", "Review budget")
            .add_task_with_id("col-2", "t3", "Fix login");
        let store = MemoryStore::new();
        store.save(&state).unwrap();
        BoardSession::open(store)
    }

    fn task(command: TaskCommands) -> Commands {
        Commands::Task { command }
    }

    fn column(command: ColumnCommands) -> Commands {
        Commands::Column { command }
    }

    #[test]
    fn test_task_add_persists() {
        let mut s = session();
        let out = run(
            &mut s,
            task(TaskCommands::Add {
                column: "col-3".into(),
                text: "  Ship  ".into(),
                description: Some("v1".into()),
                labels: vec!["release".into(), "release".into()],
            }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        let id = out.trim_start_matches("Added task ").to_string();

        let saved = s.store().load().unwrap().unwrap();
        let added = saved.task(&id).unwrap();
        assert_eq!(added.text, "Ship");
        assert_eq!(added.description, "v1");
        assert_eq!(added.labels, vec!["release".to_string()]);
        assert_eq!(added.column_id, "col-3");
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut s = session();
        let err = run(
            &mut s,
            task(TaskCommands::Done {
                ids: vec!["t1".into(), "nope".into()],
            }),
            SearchMode::Fuzzy,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unknown task id(s): nope");
        assert!(!s.state().task("t1").unwrap().completed);

        let err = run(
            &mut s,
            column(ColumnCommands::Delete { id: "gone".into() }),
            SearchMode::Fuzzy,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unknown column id: gone");
    }

    #[test]
    fn test_bulk_done_and_move() {
        let mut s = session();
        run(
            &mut s,
            task(TaskCommands::Done {
                ids: vec!["t2".into(), "t1".into()],
            }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        assert!(s.state().task("t1").unwrap().completed);
        assert!(s.state().task("t2").unwrap().completed);

        let out = run(
            &mut s,
            task(TaskCommands::Move {
                column: "col-2".into(),
                ids: vec!["t2".into(), "t1".into()],
            }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        assert_eq!(out, "Moved 2 task(s) to \"In Progress\"");
        let order: Vec<&str> = s
            .state()
            .column_tasks("col-2")
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(order, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_column_add_with_title_and_delete() {
        let mut s = session();
        let out = run(
            &mut s,
            column(ColumnCommands::Add {
                title: Some("Blocked".into()),
            }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        assert!(out.starts_with("Added column \"Blocked\""));
        assert_eq!(s.state().columns().len(), 4);

        let out = run(
            &mut s,
            column(ColumnCommands::Delete { id: "col-1".into() }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        assert_eq!(out, "Deleted column \"To Do\" and 2 task(s)");
        assert_eq!(s.state().tasks().len(), 1);
    }

    #[test]
    fn test_positions_are_range_checked() {
        let mut s = session();
        assert!(run(
            &mut s,
            task(TaskCommands::Reorder {
                column: "col-1".into(),
                from: 0,
                to: 5,
            }),
            SearchMode::Fuzzy,
        )
        .is_err());
        run(
            &mut s,
            task(TaskCommands::Reorder {
                column: "col-1".into(),
                from: 1,
                to: 0,
            }),
            SearchMode::Fuzzy,
        )
        .unwrap();
        assert_eq!(s.state().task("t2").unwrap().order, 0);
    }

    #[test]
    fn test_edit_requires_a_change() {
        let mut s = session();
        let edit = |text: Option<&str>| {
            task(TaskCommands::Edit {
                id: "t1".into(),
                text: text.map(String::from),
                description: None,
                labels: Vec::new(),
                clear_labels: false,
            })
        };
        assert!(run(&mut s, edit(None), SearchMode::Fuzzy).is_err());
        assert!(run(&mut s, edit(Some("   ")), SearchMode::Fuzzy).is_err());
        let out = run(&mut s, edit(Some("Write final report")), SearchMode::Fuzzy).unwrap();
        assert_eq!(out, "Updated task t1");
        assert_eq!(s.state().task("t1").unwrap().text, "Write final report");
    }

    #[test]
    fn test_search_uses_configured_mode() {
        let mut s = session();
        let search = |plain| Commands::Search {
            query: "reviw budgt".into(),
            plain,
        };
        let fuzzy = run(&mut s, search(false), SearchMode::Fuzzy).unwrap();
        assert!(fuzzy.contains("Review budget"));
        let plain = run(&mut s, search(true), SearchMode::Fuzzy).unwrap();
        assert!(plain.starts_with("No tasks match"));
    }
}
