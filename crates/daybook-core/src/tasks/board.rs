//! Persisted task list.
//!
//! `TaskBoard` pairs a [`TaskList`] with its [`FeatureStore`]. Each operation
//! runs against a copy of the list and is committed wholesale; a failed
//! operation or write leaves the published list untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::list::TaskList;
use super::model::{TaskEntry, TaskType};
use crate::error::Result;
use crate::storage::{Database, FeatureStore};

pub const TASKS_KEY: &str = "tasks";

pub struct TaskBoard {
    store: FeatureStore<TaskList>,
}

impl TaskBoard {
    pub fn open(db: Arc<Database>) -> Self {
        Self {
            store: FeatureStore::open(db, TASKS_KEY),
        }
    }

    pub fn list(&self) -> TaskList {
        self.store.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskList> {
        self.store.subscribe()
    }

    pub fn replace(&self, list: TaskList) -> Result<()> {
        self.store.replace(list)
    }

    pub fn add_single_task(&self, title: &str) -> Result<TaskEntry> {
        self.store.update(|list| list.add_single_task(title))
    }

    pub fn add_priority_task(
        &self,
        title: &str,
        deadline_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<TaskEntry> {
        self.store
            .update(|list| list.add_priority_task(title, deadline_minutes, now))
    }

    pub fn mark_priority_task_failed(&self, id: &str) -> Result<Option<String>> {
        self.store.update(|list| list.mark_priority_task_failed(id))
    }

    /// Fail overdue priority tasks. Skips the write when nothing expired.
    pub fn fail_expired_priority_tasks(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        if self
            .store
            .with(|list| list.expired_priority_tasks(now).is_empty())
        {
            return Ok(Vec::new());
        }
        self.store
            .update(|list| Ok::<_, crate::CoreError>(list.fail_expired_priority_tasks(now)))
    }

    pub fn add_task_group(&self, name: &str, items: &[(String, TaskType)]) -> Result<Vec<TaskEntry>> {
        self.store.update(|list| list.add_task_group(name, items))
    }

    pub fn complete_task(&self, id: &str) -> Result<Option<String>> {
        self.store.update(|list| list.complete_task(id))
    }

    pub fn delete_task(&self, id: &str) -> Result<TaskEntry> {
        self.store.update(|list| list.delete_task(id))
    }

    pub fn set_active_task(&self, id: &str) -> Result<()> {
        self.store.update(|list| list.set_active_task(id))
    }

    pub fn reorder_tasks(&self, from: usize, to: usize) -> Result<()> {
        self.store.update(|list| list.reorder_tasks(from, to))
    }

    pub fn rename_task(&self, id: &str, title: &str) -> Result<()> {
        self.store.update(|list| list.rename_task(id, title))
    }

    pub fn complete_all(&self) -> Result<usize> {
        self.store
            .update(|list| Ok::<_, crate::CoreError>(list.complete_all()))
    }

    pub fn complete_group(&self, group_id: &str) -> Result<usize> {
        self.store.update(|list| list.complete_group(group_id))
    }

    pub fn delete_group(&self, group_id: &str) -> Result<usize> {
        self.store.update(|list| list.delete_group(group_id))
    }

    pub fn clear_completed(&self) -> Result<usize> {
        self.store
            .update(|list| Ok::<_, crate::CoreError>(list.clear_completed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, TaskError};

    fn board() -> (Arc<Database>, TaskBoard) {
        let db = Arc::new(Database::open_memory().unwrap());
        (Arc::clone(&db), TaskBoard::open(db))
    }

    #[test]
    fn mutations_are_persisted() {
        let (db, board) = board();
        let a = board.add_single_task("Persist me").unwrap();

        let reopened = TaskBoard::open(db);
        assert_eq!(reopened.list().get(&a.id).map(|t| t.title.as_str()), Some("Persist me"));
        assert_eq!(reopened.list().active_task().map(|t| t.id.clone()), Some(a.id));
    }

    #[test]
    fn failed_transition_keeps_published_list() {
        let (_db, board) = board();
        let a = board.add_single_task("A").unwrap();
        board.complete_task(&a.id).unwrap();
        let before = board.list();

        let err = board.set_active_task(&a.id).unwrap_err();
        assert!(matches!(err, CoreError::Task(TaskError::NotActivatable(_))));
        assert_eq!(board.list(), before);
    }

    #[test]
    fn subscribers_see_committed_lists() {
        let (_db, board) = board();
        let mut rx = board.subscribe();
        board.add_single_task("A").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        let _ = board.delete_task("missing");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn expired_sweep_without_work_does_not_write() {
        let (db, board) = board();
        assert!(board.fail_expired_priority_tasks(Utc::now()).unwrap().is_empty());
        assert!(db.kv_get(TASKS_KEY).unwrap().is_none());
    }
}
