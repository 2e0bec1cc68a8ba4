//! Plain CRUD record stores.
//!
//! Notes, reminders, calendar events, exams and timetable entries share one
//! shape: an insertion-ordered collection of records with unique ids,
//! persisted as a single JSON array under the record type's key.

mod calendar;
mod exams;
mod notes;
mod reminders;
mod timetable;

pub use calendar::CalendarEvent;
pub use exams::Exam;
pub use notes::Note;
pub use reminders::Reminder;
pub use timetable::TimetableEntry;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::storage::{Database, FeatureStore};

/// A record kept in a [`Collection`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;
    /// Key of the kv row holding the collection.
    const KEY: &'static str;

    fn id(&self) -> &str;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    fn not_found(id: &str) -> ValidationError {
        ValidationError::NotFound {
            collection: T::KIND.to_string(),
            id: id.to_string(),
        }
    }

    /// Append a record.
    ///
    /// # Errors
    /// Rejects invalid records and duplicate ids.
    pub fn insert(&mut self, record: T) -> Result<(), ValidationError> {
        record.validate()?;
        if self.get(record.id()).is_some() {
            return Err(ValidationError::DuplicateId(record.id().to_string()));
        }
        self.items.push(record);
        Ok(())
    }

    /// Replace the record with the same id, keeping its position.
    ///
    /// # Errors
    /// Rejects invalid records and unknown ids.
    pub fn update(&mut self, record: T) -> Result<(), ValidationError> {
        record.validate()?;
        let slot = self
            .items
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| Self::not_found(record.id()))?;
        *slot = record;
        Ok(())
    }

    /// Remove and return a record.
    ///
    /// # Errors
    /// Rejects unknown ids.
    pub fn remove(&mut self, id: &str) -> Result<T, ValidationError> {
        let idx = self
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        Ok(self.items.remove(idx))
    }
}

/// Persisted [`Collection`].
pub struct RecordStore<T: Record> {
    store: FeatureStore<Collection<T>>,
}

impl<T: Record> RecordStore<T> {
    pub fn open(db: Arc<Database>) -> Self {
        Self {
            store: FeatureStore::open(db, T::KEY),
        }
    }

    pub fn all(&self) -> Collection<T> {
        self.store.get()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.store.with(|c| c.get(id).cloned())
    }

    pub fn insert(&self, record: T) -> Result<T> {
        self.store.update(|c| {
            c.insert(record.clone())?;
            Ok::<_, ValidationError>(record)
        })
    }

    pub fn update(&self, record: T) -> Result<()> {
        self.store.update(|c| c.update(record))
    }

    pub fn remove(&self, id: &str) -> Result<T> {
        self.store.update(|c| c.remove(id))
    }

    /// Mutate one record in place.
    pub fn modify(&self, id: &str, f: impl FnOnce(&mut T)) -> Result<T> {
        self.store.update(|c| {
            let mut record = c.get(id).cloned().ok_or_else(|| Collection::<T>::not_found(id))?;
            f(&mut record);
            c.update(record.clone())?;
            Ok::<_, ValidationError>(record)
        })
    }

    pub fn replace(&self, collection: Collection<T>) -> Result<()> {
        self.store.replace(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut notes = Collection::default();
        let note = Note::new("Groceries", "milk", Utc::now());
        notes.insert(note.clone()).unwrap();
        assert_eq!(
            notes.insert(note.clone()),
            Err(ValidationError::DuplicateId(note.id.clone()))
        );
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn update_keeps_position_and_remove_reports_missing() {
        let mut notes = Collection::default();
        let a = Note::new("a", "", Utc::now());
        let b = Note::new("b", "", Utc::now());
        notes.insert(a.clone()).unwrap();
        notes.insert(b.clone()).unwrap();

        let mut edited = a.clone();
        edited.title = "a2".into();
        notes.update(edited).unwrap();
        assert_eq!(notes.items()[0].title, "a2");

        notes.remove(&a.id).unwrap();
        assert!(matches!(
            notes.remove(&a.id),
            Err(ValidationError::NotFound { .. })
        ));
        assert_eq!(notes.items()[0].id, b.id);
    }

    #[test]
    fn store_modify_validates_before_commit() {
        let db = Arc::new(Database::open_memory().unwrap());
        let store: RecordStore<Note> = RecordStore::open(Arc::clone(&db));
        let note = store.insert(Note::new("Title", "body", Utc::now())).unwrap();

        assert!(store.modify(&note.id, |n| n.title.clear()).is_err());
        assert_eq!(store.get(&note.id).unwrap().title, "Title");

        let reopened: RecordStore<Note> = RecordStore::open(db);
        assert_eq!(reopened.all().len(), 1);
    }
}
