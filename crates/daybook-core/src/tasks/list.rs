//! Task list state machine.
//!
//! The list is an ordered `Vec<TaskEntry>`. Every operation mutates the list
//! in place and keeps three invariants:
//!
//! - at most one open (not completed, not failed) task is active;
//! - each group has exactly one member carrying the group name;
//! - completed and failed tasks are only reactivated by the priority-failure
//!   restore path.
//!
//! Operations that fail return an error before touching the list, so a
//! caller working on a copy can simply discard it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{TaskEntry, TaskType};
use crate::error::{CoreError, TaskError, ValidationError};

/// A group as presented to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskGroup {
    pub group_id: String,
    pub name: Option<String>,
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<TaskEntry>,
}

fn clean_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("title"));
    }
    Ok(trimmed.to_string())
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<TaskEntry>) -> Self {
        Self { tasks }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[TaskEntry] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TaskEntry> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The open task currently marked active.
    pub fn active_task(&self) -> Option<&TaskEntry> {
        self.tasks.iter().find(|t| t.is_active && t.is_open())
    }

    /// Groups in order of first appearance.
    pub fn groups(&self) -> Vec<TaskGroup> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: BTreeMap<String, TaskGroup> = BTreeMap::new();
        for task in &self.tasks {
            let Some(gid) = &task.group_id else { continue };
            let group = groups.entry(gid.clone()).or_insert_with(|| {
                order.push(gid.clone());
                TaskGroup {
                    group_id: gid.clone(),
                    name: None,
                    task_ids: Vec::new(),
                }
            });
            if task.group_name.is_some() {
                group.name.clone_from(&task.group_name);
            }
            group.task_ids.push(task.id.clone());
        }
        order
            .into_iter()
            .filter_map(|gid| groups.remove(&gid))
            .collect()
    }

    /// Open priority tasks whose deadline is at or before `now`.
    pub fn expired_priority_tasks(&self, now: DateTime<Utc>) -> Vec<&TaskEntry> {
        self.tasks.iter().filter(|t| t.is_expired(now)).collect()
    }

    fn position(&self, id: &str) -> Result<usize, TaskError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn has_active(&self) -> bool {
        self.active_task().is_some()
    }

    fn next_order(&self) -> i64 {
        self.tasks.iter().map(|t| t.order).max().map_or(0, |o| o + 1)
    }

    fn deactivate_all(&mut self) {
        for task in &mut self.tasks {
            task.is_active = false;
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a task. It becomes active only if nothing else is.
    ///
    /// # Errors
    /// Returns a validation error for an empty title.
    pub fn add_single_task(&mut self, title: &str) -> Result<TaskEntry, ValidationError> {
        let mut entry = TaskEntry::new(clean_title(title)?, TaskType::Task, self.next_order());
        entry.is_active = !self.has_active();
        self.tasks.push(entry.clone());
        tracing::info!(task_id = %entry.id, active = entry.is_active, "task added");
        Ok(entry)
    }

    /// Insert an active, time-boxed task at the front.
    ///
    /// The task that was active before is remembered so it can be restored
    /// if the priority task fails.
    ///
    /// # Errors
    /// Returns a validation error for an empty title or a zero deadline.
    pub fn add_priority_task(
        &mut self,
        title: &str,
        deadline_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<TaskEntry, ValidationError> {
        let title = clean_title(title)?;
        if deadline_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "deadline_minutes".into(),
                message: "must be at least 1 minute".into(),
            });
        }

        let previous = self.active_task().map(|t| t.id.clone());
        self.deactivate_all();

        let first_order = self.tasks.iter().map(|t| t.order).min().unwrap_or(0);
        let mut entry = TaskEntry::new(title, TaskType::Task, first_order - 1);
        entry.is_active = true;
        entry.is_priority = true;
        entry.priority_deadline_minutes = Some(deadline_minutes);
        entry.priority_created_at = Some(now);
        entry.previous_active_task_id = previous;
        self.tasks.insert(0, entry.clone());
        tracing::info!(
            task_id = %entry.id,
            deadline_minutes,
            previous = ?entry.previous_active_task_id,
            "priority task added"
        );
        Ok(entry)
    }

    /// Fail a priority task and restore the task it displaced, if that task
    /// is still open.
    ///
    /// Returns the id of the restored task. A priority task that is already
    /// completed or failed is left as it is. Priority tasks stacked on top of
    /// the failing one inherit its displaced task, so failing them later
    /// still restores it.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `NotPriority` for an ordinary task.
    pub fn mark_priority_task_failed(&mut self, id: &str) -> Result<Option<String>, TaskError> {
        let idx = self.position(id)?;
        if !self.tasks[idx].is_priority {
            return Err(TaskError::NotPriority(id.to_string()));
        }
        if !self.tasks[idx].is_open() {
            return Ok(None);
        }

        let was_active = self.tasks[idx].is_active;
        let task = &mut self.tasks[idx];
        task.is_failed = true;
        task.is_active = false;
        let previous = task.previous_active_task_id.clone();

        // Tasks that displaced this one now fall back to what it displaced.
        for other in &mut self.tasks {
            if other.previous_active_task_id.as_deref() == Some(id) {
                other.previous_active_task_id.clone_from(&previous);
            }
        }

        let restore = previous.and_then(|prev| {
            self.tasks
                .iter()
                .position(|t| t.id == prev && t.is_open())
        });

        // Only take the active slot back if the failing task held it or the
        // slot is free; never steal it from a task activated since.
        let restored = match restore {
            Some(r) if was_active || !self.has_active() => {
                self.deactivate_all();
                self.tasks[r].is_active = true;
                Some(self.tasks[r].id.clone())
            }
            _ => None,
        };
        tracing::info!(task_id = id, restored = ?restored, "priority task failed");
        Ok(restored)
    }

    /// Fail every open priority task whose deadline has passed.
    pub fn fail_expired_priority_tasks(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .expired_priority_tasks(now)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        for id in &expired {
            // Ids were just read from the list and every one is a priority task.
            let _ = self.mark_priority_task_failed(id);
        }
        expired
    }

    /// Create linked tasks sharing a new group id.
    ///
    /// Only the first member carries `name`; it becomes active only if no
    /// other task is active.
    ///
    /// # Errors
    /// Returns a validation error for an empty name, no items, or an empty
    /// item title.
    pub fn add_task_group(
        &mut self,
        name: &str,
        items: &[(String, TaskType)],
    ) -> Result<Vec<TaskEntry>, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("group name"));
        }
        if items.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "items".into(),
                message: "a group needs at least one task".into(),
            });
        }
        let titles = items
            .iter()
            .map(|(title, _)| clean_title(title))
            .collect::<Result<Vec<_>, _>>()?;

        let group_id = uuid::Uuid::new_v4().to_string();
        let activate_first = !self.has_active();
        let base = self.next_order();

        let created: Vec<TaskEntry> = titles
            .into_iter()
            .zip(items)
            .enumerate()
            .map(|(i, (title, (_, task_type)))| {
                let mut entry = TaskEntry::new(title, *task_type, base + i as i64);
                entry.group_id = Some(group_id.clone());
                if i == 0 {
                    entry.group_name = Some(name.to_string());
                    entry.is_active = activate_first;
                }
                entry
            })
            .collect();

        self.tasks.extend(created.iter().cloned());
        tracing::info!(group_id = %group_id, size = created.len(), "task group added");
        Ok(created)
    }

    /// Complete a task. For a grouped task, the first open sibling in list
    /// order takes over as active, provided the active slot is free.
    ///
    /// Returns the id of the newly activated sibling.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn complete_task(&mut self, id: &str) -> Result<Option<String>, TaskError> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.is_completed = true;
        task.is_active = false;
        let group_id = task.group_id.clone();

        let mut activated = None;
        if let Some(gid) = group_id {
            if !self.has_active() {
                if let Some(next) = self
                    .tasks
                    .iter_mut()
                    .find(|t| t.group_id.as_deref() == Some(gid.as_str()) && t.is_open())
                {
                    next.is_active = true;
                    activated = Some(next.id.clone());
                }
            }
        }
        tracing::info!(task_id = id, next = ?activated, "task completed");
        Ok(activated)
    }

    /// Remove a task, handing its group name to a surviving sibling.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn delete_task(&mut self, id: &str) -> Result<TaskEntry, TaskError> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);

        if let (Some(gid), Some(name)) = (&removed.group_id, &removed.group_name) {
            if let Some(heir) = self
                .tasks
                .iter_mut()
                .find(|t| t.group_id.as_deref() == Some(gid.as_str()))
            {
                heir.group_name = Some(name.clone());
            }
        }
        tracing::info!(task_id = id, "task deleted");
        Ok(removed)
    }

    /// Make `id` the only active task.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `NotActivatable` for a completed or
    /// failed task. The list is unchanged on error.
    pub fn set_active_task(&mut self, id: &str) -> Result<(), TaskError> {
        let idx = self.position(id)?;
        if !self.tasks[idx].is_open() {
            return Err(TaskError::NotActivatable(id.to_string()));
        }
        self.deactivate_all();
        self.tasks[idx].is_active = true;
        tracing::info!(task_id = id, "task activated");
        Ok(())
    }

    /// Move the task at `from` to `to` and renumber `order` by position.
    ///
    /// # Errors
    /// Returns `OutOfBounds` if either index is outside the list.
    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::OutOfBounds {
                    collection: "tasks".into(),
                    index,
                    len,
                });
            }
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        for (i, task) in self.tasks.iter_mut().enumerate() {
            task.order = i as i64;
        }
        Ok(())
    }

    /// Rename a task.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, validation error for an empty title.
    pub fn rename_task(&mut self, id: &str, title: &str) -> Result<(), CoreError> {
        let title = clean_title(title)?;
        let idx = self.position(id)?;
        self.tasks[idx].title = title;
        Ok(())
    }

    /// Complete every open task. Failed tasks stay failed.
    pub fn complete_all(&mut self) -> usize {
        let mut n = 0;
        for task in self.tasks.iter_mut().filter(|t| t.is_open()) {
            task.is_completed = true;
            task.is_active = false;
            n += 1;
        }
        n
    }

    /// Complete every open member of a group.
    ///
    /// # Errors
    /// `GroupNotFound` if no task carries `group_id`.
    pub fn complete_group(&mut self, group_id: &str) -> Result<usize, TaskError> {
        self.require_group(group_id)?;
        let mut n = 0;
        for task in self
            .tasks
            .iter_mut()
            .filter(|t| t.group_id.as_deref() == Some(group_id) && t.is_open())
        {
            task.is_completed = true;
            task.is_active = false;
            n += 1;
        }
        tracing::info!(group_id, completed = n, "group completed");
        Ok(n)
    }

    /// Remove every member of a group.
    ///
    /// # Errors
    /// `GroupNotFound` if no task carries `group_id`.
    pub fn delete_group(&mut self, group_id: &str) -> Result<usize, TaskError> {
        self.require_group(group_id)?;
        let before = self.tasks.len();
        self.tasks.retain(|t| t.group_id.as_deref() != Some(group_id));
        let n = before - self.tasks.len();
        tracing::info!(group_id, deleted = n, "group deleted");
        Ok(n)
    }

    /// Remove completed tasks, keeping group names on surviving members.
    pub fn clear_completed(&mut self) -> usize {
        let ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.is_completed)
            .map(|t| t.id.clone())
            .collect();
        for id in &ids {
            let _ = self.delete_task(id);
        }
        ids.len()
    }

    fn require_group(&self, group_id: &str) -> Result<(), TaskError> {
        if self
            .tasks
            .iter()
            .any(|t| t.group_id.as_deref() == Some(group_id))
        {
            Ok(())
        } else {
            Err(TaskError::GroupNotFound(group_id.to_string()))
        }
    }
}
