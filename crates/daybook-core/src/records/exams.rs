use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text, Collection, Record};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub subject: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Exam {
    pub fn new(subject: &str, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            subject: subject.trim().to_string(),
            date,
            time: None,
            location: None,
        }
    }

    /// Whole days from `today` to the exam; negative once it has passed.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }
}

impl Record for Exam {
    const KIND: &'static str = "exam";
    const KEY: &'static str = "exams";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("subject", &self.subject)
    }
}

impl Collection<Exam> {
    /// Exams today or later, soonest first.
    pub fn upcoming(&self, today: NaiveDate) -> Vec<&Exam> {
        let mut exams: Vec<&Exam> = self.items().iter().filter(|e| e.date >= today).collect();
        exams.sort_by_key(|e| (e.date, e.time));
        exams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upcoming_and_countdown() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let mut exams = Collection::default();
        let past = Exam::new("History", NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        let later = Exam::new("Physics", NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        let soon = Exam::new("Maths", today);
        for e in [past.clone(), later.clone(), soon.clone()] {
            exams.insert(e).unwrap();
        }

        let order: Vec<_> = exams.upcoming(today).into_iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(order, vec!["Maths", "Physics"]);
        assert_eq!(later.days_until(today), 22);
        assert_eq!(soon.days_until(today), 0);
        assert_eq!(past.days_until(today), -8);
    }
}
