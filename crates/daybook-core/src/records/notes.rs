use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text, Record};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: &str, body: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.trim().to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace title and/or body and bump `updated_at`.
    pub fn edit(&mut self, title: Option<&str>, body: Option<&str>, now: DateTime<Utc>) {
        if let Some(title) = title {
            self.title = title.trim().to_string();
        }
        if let Some(body) = body {
            self.body = body.to_string();
        }
        self.updated_at = now;
    }
}

impl Record for Note {
    const KIND: &'static str = "note";
    const KEY: &'static str = "notes";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn edit_bumps_updated_at_only() {
        let t0 = Utc::now();
        let mut note = Note::new(" Lecture 4 ", "", t0);
        assert_eq!(note.title, "Lecture 4");

        note.edit(None, Some("entropy"), t0 + Duration::minutes(5));
        assert_eq!(note.body, "entropy");
        assert_eq!(note.created_at, t0);
        assert_eq!(note.updated_at, t0 + Duration::minutes(5));
    }
}
