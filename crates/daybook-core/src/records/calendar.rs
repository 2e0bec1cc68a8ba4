use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{new_id, require_text, Collection, Record};
use crate::error::ValidationError;

/// A calendar entry on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub start: Option<NaiveTime>,
    #[serde(default)]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub description: String,
}

impl CalendarEvent {
    pub fn new(title: &str, date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            title: title.trim().to_string(),
            date,
            start: None,
            end: None,
            description: String::new(),
        }
    }

    pub fn with_times(mut self, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl Record for CalendarEvent {
    const KIND: &'static str = "event";
    const KEY: &'static str = "events";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(ValidationError::InvalidTimeRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Collection<CalendarEvent> {
    /// Events on `date`; all-day events first, then by start time.
    pub fn on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let mut events: Vec<&CalendarEvent> =
            self.items().iter().filter(|e| e.date == date).collect();
        events.sort_by_key(|e| e.start);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn end_before_start_is_rejected() {
        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let event = CalendarEvent::new("Lab", day).with_times(Some(time(14, 0)), Some(time(13, 0)));
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn on_filters_and_sorts() {
        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let next = day.succ_opt().unwrap();
        let mut events = Collection::default();
        let late = CalendarEvent::new("late", day).with_times(Some(time(18, 0)), None);
        let all_day = CalendarEvent::new("holiday", day);
        let early = CalendarEvent::new("early", day).with_times(Some(time(8, 0)), Some(time(9, 0)));
        let other = CalendarEvent::new("other", next);
        for e in [late.clone(), all_day.clone(), early.clone(), other] {
            events.insert(e).unwrap();
        }

        let titles: Vec<_> = events.on(day).into_iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["holiday", "early", "late"]);
    }
}
