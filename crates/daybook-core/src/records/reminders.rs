use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text, Collection, Record};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
}

impl Reminder {
    pub fn new(title: &str, remind_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.trim().to_string(),
            remind_at,
            done: false,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.done && self.remind_at <= now
    }

    pub fn mark_done(&mut self) {
        self.done = true;
    }
}

impl Record for Reminder {
    const KIND: &'static str = "reminder";
    const KEY: &'static str = "reminders";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

impl Collection<Reminder> {
    /// Pending reminders at or before `now`, oldest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<&Reminder> {
        let mut due: Vec<&Reminder> = self.items().iter().filter(|r| r.is_due(now)).collect();
        due.sort_by_key(|r| r.remind_at);
        due
    }

    /// Pending reminders after `now`, soonest first.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<&Reminder> {
        let mut upcoming: Vec<&Reminder> = self
            .items()
            .iter()
            .filter(|r| !r.done && r.remind_at > now)
            .collect();
        upcoming.sort_by_key(|r| r.remind_at);
        upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn due_excludes_done_and_future() {
        let now = Utc::now();
        let mut reminders = Collection::default();
        let late = Reminder::new("late", now - Duration::hours(2));
        let soon = Reminder::new("soon", now - Duration::minutes(1));
        let future = Reminder::new("future", now + Duration::hours(1));
        let mut done = Reminder::new("done", now - Duration::hours(3));
        done.mark_done();
        for r in [soon.clone(), future.clone(), late.clone(), done] {
            reminders.insert(r).unwrap();
        }

        let due: Vec<_> = reminders.due(now).into_iter().map(|r| r.id.clone()).collect();
        assert_eq!(due, vec![late.id, soon.id]);
        let upcoming: Vec<_> = reminders.upcoming(now).into_iter().map(|r| r.id.clone()).collect();
        assert_eq!(upcoming, vec![future.id]);
    }
}
