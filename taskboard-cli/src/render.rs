use console::style;
use taskboard_core::{AppState, Task, TaskFilter};

/// Paint matched spans of `text` for the terminal.
fn painted(filter: &TaskFilter, text: &str) -> String {
    filter
        .highlight(text)
        .map(|span| {
            if span.is_match() {
                style(span.value).black().on_yellow().to_string()
            } else {
                span.value.to_string()
            }
        })
        .collect()
}

fn task_line(filter: &TaskFilter, task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{} {} {}",
        check,
        painted(filter, &task.text),
        style(&task.id).dim()
    );
    for label in &task.labels {
        line.push(' ');
        line.push_str(&style(format!("#{}", painted(filter, label))).cyan().to_string());
    }
    line
}

/// Every column in rank order with the tasks the filter accepts.
pub fn board(state: &AppState, filter: &TaskFilter) -> String {
    let mut out = Vec::new();
    for column in state.sorted_columns() {
        let tasks = state.column_tasks(&column.id);
        let visible = filter.filter(tasks.iter().copied());
        let count = if filter.is_active() {
            format!("({}/{})", visible.len(), tasks.len())
        } else {
            format!("({})", tasks.len())
        };
        out.push(format!(
            "{} {} {}",
            style(&column.title).bold(),
            style(count).dim(),
            style(&column.id).dim()
        ));
        for task in visible {
            out.push(format!("  {}", task_line(filter, task)));
            if !task.description.is_empty() {
                out.push(format!(
                    "      {}",
                    style(painted(filter, &task.description)).dim()
                ));
            }
        }
    }
    out.join("\n")
}

/// Matching tasks across all columns, prefixed with their column title.
pub fn search_results(state: &AppState, filter: &TaskFilter) -> String {
    let mut out = Vec::new();
    for column in state.sorted_columns() {
        for task in filter.filter(state.column_tasks(&column.id)) {
            out.push(format!(
                "{} {}",
                style(format!("{}:", column.title)).bold(),
                task_line(filter, task)
            ));
        }
    }
    if out.is_empty() {
        return format!("No tasks match \"{}\"", filter.query());
    }
    out.join("\n")
}
