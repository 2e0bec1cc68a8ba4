use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entry in the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    #[default]
    Task,
    Break,
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "task" => Ok(TaskType::Task),
            "break" => Ok(TaskType::Break),
            other => Err(format!("unknown task type '{other}' (expected task or break)")),
        }
    }
}

/// One entry of the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_active: bool,
    /// Shared by every task created in the same group.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Display name of the group; carried by exactly one member.
    #[serde(default)]
    pub group_name: Option<String>,
    /// Sort key, reassigned from list position on reorder.
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub priority_deadline_minutes: Option<u32>,
    #[serde(default)]
    pub priority_created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_failed: bool,
    /// Task that was active before this priority task took over.
    #[serde(default)]
    pub previous_active_task_id: Option<String>,
}

impl TaskEntry {
    pub(crate) fn new(title: String, task_type: TaskType, order: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            task_type,
            is_completed: false,
            is_active: false,
            group_id: None,
            group_name: None,
            order,
            is_priority: false,
            priority_deadline_minutes: None,
            priority_created_at: None,
            is_failed: false,
            previous_active_task_id: None,
        }
    }

    /// Neither completed nor failed.
    pub fn is_open(&self) -> bool {
        !self.is_completed && !self.is_failed
    }

    /// Instant at which a priority task fails.
    pub fn priority_deadline(&self) -> Option<DateTime<Utc>> {
        if !self.is_priority {
            return None;
        }
        let created = self.priority_created_at?;
        let minutes = self.priority_deadline_minutes?;
        Some(created + Duration::minutes(i64::from(minutes)))
    }

    /// Time left before the priority deadline, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let deadline = self.priority_deadline()?;
        Some((deadline - now).max(Duration::zero()))
    }

    /// Open priority task whose deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.priority_deadline().is_some_and(|d| d <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deadline_only_for_priority_tasks() {
        let mut entry = TaskEntry::new("x".into(), TaskType::Task, 0);
        entry.priority_deadline_minutes = Some(10);
        entry.priority_created_at = Some(Utc::now());
        assert!(entry.priority_deadline().is_none());

        entry.is_priority = true;
        assert!(entry.priority_deadline().is_some());
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut entry = TaskEntry::new("x".into(), TaskType::Task, 0);
        entry.is_priority = true;
        entry.priority_deadline_minutes = Some(30);
        entry.priority_created_at = Some(created);

        assert_eq!(
            entry.remaining(created + Duration::minutes(10)),
            Some(Duration::minutes(20))
        );
        assert_eq!(
            entry.remaining(created + Duration::hours(2)),
            Some(Duration::zero())
        );
        assert!(!entry.is_expired(created + Duration::minutes(29)));
        assert!(entry.is_expired(created + Duration::minutes(30)));
    }

    #[test]
    fn legacy_json_without_optional_fields_parses() {
        let entry: TaskEntry =
            serde_json::from_str(r#"{"id":"a","title":"Read","type":"BREAK"}"#).unwrap();
        assert_eq!(entry.task_type, TaskType::Break);
        assert!(!entry.is_active);
        assert!(entry.group_id.is_none());
    }

    #[test]
    fn task_type_parses_case_insensitively() {
        assert_eq!("Break".parse::<TaskType>().unwrap(), TaskType::Break);
        assert!("nap".parse::<TaskType>().is_err());
    }
}
