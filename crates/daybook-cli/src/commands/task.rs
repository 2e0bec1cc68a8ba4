//! Task list commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use daybook_core::tasks::{TaskList, TaskType};
use daybook_core::Daybook;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a single task
    Add {
        /// Task title
        title: String,
    },
    /// Add a priority task with a deadline
    Priority {
        /// Task title
        title: String,
        /// Minutes until the task fails
        #[arg(long, default_value = "30")]
        minutes: u32,
    },
    /// Add a group of tasks. Prefix an item with "break:" to make it a break
    Group {
        /// Group name
        name: String,
        /// Item titles, in order
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// List tasks
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a task the active one
    Activate {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Complete a task
    Complete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Move a task from one position to another (0-based)
    Move { from: usize, to: usize },
    /// Rename a task
    Rename {
        /// Task ID (or unique prefix)
        id: String,
        /// New title
        title: String,
    },
    /// Mark a priority task as failed
    Fail {
        /// Task ID (or unique prefix)
        id: String,
    },
    /// Complete every open task
    CompleteAll,
    /// Complete every task of a group
    CompleteGroup {
        /// Group ID (or unique prefix)
        group_id: String,
    },
    /// Delete every task of a group
    DeleteGroup {
        /// Group ID (or unique prefix)
        group_id: String,
    },
    /// Fail priority tasks whose deadline has passed
    FailExpired,
    /// Remove completed tasks
    ClearCompleted,
}

fn resolve_task(list: &TaskList, query: &str) -> Result<String, String> {
    if list.get(query).is_some() {
        return Ok(query.to_string());
    }
    let matches: Vec<&str> = list
        .tasks()
        .iter()
        .map(|t| t.id.as_str())
        .filter(|id| id.starts_with(query))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(format!("task not found: {query}")),
        _ => Err(format!("ambiguous task id: {query}")),
    }
}

fn resolve_group(list: &TaskList, query: &str) -> Result<String, String> {
    let groups = list.groups();
    let matches: Vec<&str> = groups
        .iter()
        .map(|g| g.group_id.as_str())
        .filter(|id| *id == query || id.starts_with(query))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).to_string()),
        [] => Err(format!("group not found: {query}")),
        _ if matches.contains(&query) => Ok(query.to_string()),
        _ => Err(format!("ambiguous group id: {query}")),
    }
}

/// `"break:Stretch"` or `"task:Read"`; anything else is a plain task title.
fn parse_item(item: &str) -> (String, TaskType) {
    if let Some((kind, title)) = item.split_once(':') {
        if let Ok(task_type) = kind.trim().parse::<TaskType>() {
            return (title.trim().to_string(), task_type);
        }
    }
    (item.to_string(), TaskType::Task)
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_list(list: &TaskList) {
    if list.is_empty() {
        println!("No tasks.");
        return;
    }
    let now = Utc::now();
    for (pos, task) in list.tasks().iter().enumerate() {
        let marker = if task.is_failed {
            "!"
        } else if task.is_completed {
            "x"
        } else if task.is_active {
            ">"
        } else {
            " "
        };
        let mut line = format!("{pos:>3} [{marker}] {}  {}", short(&task.id), task.title);
        if task.task_type == TaskType::Break {
            line.push_str("  (break)");
        }
        if let Some(name) = &task.group_name {
            line.push_str(&format!("  [group: {name}]"));
        }
        if task.is_priority && task.is_open() {
            if let Some(remaining) = task.remaining(now) {
                line.push_str(&format!("  ({} min left)", remaining.num_minutes().max(0)));
            }
        }
        println!("{line}");
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let daybook = Daybook::open()?;
    let board = &daybook.tasks;

    let failed = board.fail_expired_priority_tasks(Utc::now())?;
    if !failed.is_empty() {
        tracing::info!(count = failed.len(), "priority tasks expired");
    }

    match action {
        TaskAction::Add { title } => {
            let task = board.add_single_task(&title)?;
            println!("Task added: {}", task.id);
        }
        TaskAction::Priority { title, minutes } => {
            let task = board.add_priority_task(&title, minutes, Utc::now())?;
            println!("Priority task added: {} (due in {minutes} min)", task.id);
        }
        TaskAction::Group { name, items } => {
            let items: Vec<(String, TaskType)> = items.iter().map(|i| parse_item(i)).collect();
            let tasks = board.add_task_group(&name, &items)?;
            let group_id = tasks
                .first()
                .and_then(|t| t.group_id.clone())
                .unwrap_or_default();
            println!("Group added: {group_id} ({} tasks)", tasks.len());
        }
        TaskAction::List { json } => {
            let list = board.list();
            if json {
                print_json(&list)?;
            } else {
                print_list(&list);
            }
        }
        TaskAction::Activate { id } => {
            let id = resolve_task(&board.list(), &id)?;
            board.set_active_task(&id)?;
            println!("Task activated: {id}");
        }
        TaskAction::Complete { id } => {
            let id = resolve_task(&board.list(), &id)?;
            let next = board.complete_task(&id)?;
            println!("Task completed: {id}");
            if let Some(next) = next {
                println!("Next task activated: {next}");
            }
        }
        TaskAction::Delete { id } => {
            let id = resolve_task(&board.list(), &id)?;
            let task = board.delete_task(&id)?;
            println!("Task deleted: {} ({})", task.id, task.title);
        }
        TaskAction::Move { from, to } => {
            board.reorder_tasks(from, to)?;
            println!("Task moved: {from} -> {to}");
        }
        TaskAction::Rename { id, title } => {
            let id = resolve_task(&board.list(), &id)?;
            board.rename_task(&id, &title)?;
            println!("Task renamed: {id}");
        }
        TaskAction::Fail { id } => {
            let id = resolve_task(&board.list(), &id)?;
            let restored = board.mark_priority_task_failed(&id)?;
            println!("Priority task failed: {id}");
            if let Some(restored) = restored {
                println!("Previous task restored: {restored}");
            }
        }
        TaskAction::CompleteAll => {
            let count = board.complete_all()?;
            println!("{count} tasks completed");
        }
        TaskAction::CompleteGroup { group_id } => {
            let group_id = resolve_group(&board.list(), &group_id)?;
            let count = board.complete_group(&group_id)?;
            println!("{count} tasks completed in group {group_id}");
        }
        TaskAction::DeleteGroup { group_id } => {
            let group_id = resolve_group(&board.list(), &group_id)?;
            let count = board.delete_group(&group_id)?;
            println!("{count} tasks deleted from group {group_id}");
        }
        TaskAction::FailExpired => {
            // The sweep above already ran; report what it did.
            println!("{} priority tasks failed", failed.len());
        }
        TaskAction::ClearCompleted => {
            let count = board.clear_completed()?;
            println!("{count} tasks cleared");
        }
    }
    Ok(())
}
