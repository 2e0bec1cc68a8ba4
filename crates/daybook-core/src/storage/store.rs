//! Typed, observable wrapper around one key of the kv store.
//!
//! A `FeatureStore<T>` owns the published value for one feature domain.
//! Mutations go through [`FeatureStore::update`], which works on a copy and
//! publishes it only after the database write succeeded. Observers hold a
//! `watch::Receiver` and see each committed value.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use super::Database;
use crate::error::CoreError;

pub struct FeatureStore<T> {
    db: Arc<Database>,
    key: &'static str,
    state: watch::Sender<T>,
}

impl<T> FeatureStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Load `key` from the database.
    ///
    /// A missing, unreadable or corrupt blob yields `T::default()`.
    pub fn open(db: Arc<Database>, key: &'static str) -> Self {
        let initial = Self::load(&db, key);
        let (state, _rx) = watch::channel(initial);
        Self { db, key, state }
    }

    fn load(db: &Database, key: &'static str) -> T {
        match db.kv_get(key) {
            Ok(Some(json)) => match serde_json::from_str::<T>(&json) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "corrupt store blob, using empty default");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read store, using empty default");
                T::default()
            }
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Snapshot of the published value.
    pub fn get(&self) -> T {
        self.state.borrow().clone()
    }

    /// Run `f` against the published value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Subscribe to committed values.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Read-modify-write.
    ///
    /// `f` mutates a copy of the current value. If `f` fails or the write
    /// fails, the published value is left as it was.
    ///
    /// # Errors
    /// Returns the error from `f`, or a database/serialization error.
    pub fn update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, CoreError>
    where
        E: Into<CoreError>,
    {
        let mut next = self.get();
        let out = f(&mut next).map_err(Into::into)?;
        self.persist(&next)?;
        self.state.send_replace(next);
        Ok(out)
    }

    /// Replace the whole value.
    ///
    /// # Errors
    /// Returns a database/serialization error; the published value is kept.
    pub fn replace(&self, value: T) -> Result<(), CoreError> {
        self.persist(&value)?;
        self.state.send_replace(value);
        Ok(())
    }

    fn persist(&self, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)?;
        self.db.kv_set(self.key, &json)?;
        tracing::debug!(key = self.key, bytes = json.len(), "store written");
        Ok(())
    }
}
