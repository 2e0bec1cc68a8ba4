use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text, Collection, Record};
use crate::error::ValidationError;

/// A recurring weekly class slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: String,
    pub subject: String,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub location: Option<String>,
}

impl TimetableEntry {
    pub fn new(subject: &str, weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: new_id(),
            subject: subject.trim().to_string(),
            weekday,
            start,
            end,
            location: None,
        }
    }
}

impl Record for TimetableEntry {
    const KIND: &'static str = "timetable";
    const KEY: &'static str = "timetable";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("subject", &self.subject)?;
        if self.end <= self.start {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        Ok(())
    }
}

impl Collection<TimetableEntry> {
    pub fn for_day(&self, weekday: Weekday) -> Vec<&TimetableEntry> {
        let mut slots: Vec<&TimetableEntry> =
            self.items().iter().filter(|e| e.weekday == weekday).collect();
        slots.sort_by_key(|e| e.start);
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn zero_length_slot_is_rejected() {
        let slot = TimetableEntry::new("Chem", Weekday::Tue, time(9), time(9));
        assert!(slot.validate().is_err());
    }

    #[test]
    fn for_day_sorts_by_start() {
        let mut table = Collection::default();
        table.insert(TimetableEntry::new("Bio", Weekday::Mon, time(13), time(14))).unwrap();
        table.insert(TimetableEntry::new("Art", Weekday::Wed, time(8), time(9))).unwrap();
        table.insert(TimetableEntry::new("Maths", Weekday::Mon, time(9), time(10))).unwrap();

        let monday: Vec<_> = table.for_day(Weekday::Mon).into_iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(monday, vec!["Maths", "Bio"]);
        assert!(table.for_day(Weekday::Fri).is_empty());
    }
}
