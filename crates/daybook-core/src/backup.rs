//! Backup export and import.
//!
//! A backup is a single JSON document aggregating every feature domain plus
//! the settings. The `data` section is hashed with SHA-256 on export and
//! checked on import, so a truncated or hand-edited file is refused instead
//! of half-restored.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::daybook::Daybook;
use crate::error::{BackupError, Result};
use crate::records::{CalendarEvent, Collection, Exam, Note, Reminder, TimetableEntry};
use crate::storage::{data_dir, Config};
use crate::tasks::TaskList;

/// Current backup format version.
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Every domain's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub tasks: TaskList,
    #[serde(default)]
    pub notes: Collection<Note>,
    #[serde(default)]
    pub reminders: Collection<Reminder>,
    #[serde(default)]
    pub events: Collection<CalendarEvent>,
    #[serde(default)]
    pub exams: Collection<Exam>,
    #[serde(default)]
    pub timetable: Collection<TimetableEntry>,
    #[serde(default)]
    pub settings: Config,
}

/// A backup document as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    /// Hex SHA-256 of the compact JSON encoding of `data`.
    pub checksum: String,
    pub data: BackupData,
}

/// Counts of what an import restored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub tasks: usize,
    pub notes: usize,
    pub reminders: usize,
    pub events: usize,
    pub exams: usize,
    pub timetable: usize,
}

fn checksum(data: &BackupData) -> Result<String> {
    let bytes = serde_json::to_vec(data)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

impl Backup {
    /// Snapshot every store of `daybook` together with `settings`.
    ///
    /// # Errors
    /// Returns a serialization error.
    pub fn capture(daybook: &Daybook, settings: &Config, now: DateTime<Utc>) -> Result<Self> {
        let data = BackupData {
            tasks: daybook.tasks.list(),
            notes: daybook.notes.all(),
            reminders: daybook.reminders.all(),
            events: daybook.events.all(),
            exams: daybook.exams.all(),
            timetable: daybook.timetable.all(),
            settings: settings.clone(),
        };
        Ok(Self {
            format_version: BACKUP_FORMAT_VERSION,
            exported_at: now,
            checksum: checksum(&data)?,
            data,
        })
    }

    /// `daybook_backup_YYYYMMDD_HHMMSS.json`
    pub fn file_name(&self) -> String {
        format!(
            "daybook_backup_{}.json",
            self.exported_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Parse and verify a backup document.
    ///
    /// # Errors
    /// Returns a JSON error, `UnsupportedVersion` or `ChecksumMismatch`.
    pub fn from_json(json: &str) -> Result<Self> {
        let backup: Backup = serde_json::from_str(json)?;
        if backup.format_version != BACKUP_FORMAT_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: backup.format_version,
                expected: BACKUP_FORMAT_VERSION,
            }
            .into());
        }
        if checksum(&backup.data)? != backup.checksum {
            return Err(BackupError::ChecksumMismatch.into());
        }
        Ok(backup)
    }

    /// # Errors
    /// Returns a serialization error.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write every domain of this backup into `daybook`, replacing what is
    /// there. Returns the settings for the caller to persist.
    ///
    /// # Errors
    /// Returns a database error from the first store that fails; stores
    /// written before it keep the imported data.
    pub fn restore(self, daybook: &Daybook) -> Result<(ImportSummary, Config)> {
        let data = self.data;
        let summary = ImportSummary {
            tasks: data.tasks.len(),
            notes: data.notes.len(),
            reminders: data.reminders.len(),
            events: data.events.len(),
            exams: data.exams.len(),
            timetable: data.timetable.len(),
        };
        daybook.tasks.replace(data.tasks)?;
        daybook.notes.replace(data.notes)?;
        daybook.reminders.replace(data.reminders)?;
        daybook.events.replace(data.events)?;
        daybook.exams.replace(data.exams)?;
        daybook.timetable.replace(data.timetable)?;
        tracing::info!(?summary, "backup restored");
        Ok((summary, data.settings))
    }
}

/// Directory backups go to: the configured one, else the user's downloads
/// folder, else `<data_dir>/backups`.
///
/// # Errors
/// Returns an error if the fallback data directory is unavailable.
pub fn default_export_dir(config: &Config) -> Result<PathBuf> {
    if let Some(dir) = &config.backup.export_dir {
        return Ok(dir.clone());
    }
    if let Some(downloads) = dirs::download_dir() {
        return Ok(downloads);
    }
    Ok(data_dir()?.join("backups"))
}

/// Capture and write a backup into `dir`. Returns the file path.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn export_to_dir(daybook: &Daybook, settings: &Config, dir: &Path) -> Result<PathBuf> {
    let backup = Backup::capture(daybook, settings, Utc::now())?;
    let path = dir.join(backup.file_name());
    let file_err = |source| BackupError::File {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(file_err)?;
    std::fs::write(&path, backup.to_json()?).map_err(file_err)?;
    tracing::info!(path = %path.display(), "backup exported");
    Ok(path)
}

/// Read, verify and restore a backup file.
///
/// # Errors
/// Returns an error if the file cannot be read, fails verification, or a
/// store cannot be written.
pub fn import_from(daybook: &Daybook, path: &Path) -> Result<(ImportSummary, Config)> {
    let json = std::fs::read_to_string(path).map_err(|source| BackupError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Backup::from_json(&json)?.restore(daybook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::Database;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn daybook() -> Daybook {
        Daybook::with_database(Arc::new(Database::open_memory().unwrap()))
    }

    #[test]
    fn file_name_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 7, 5, 9).unwrap();
        let backup = Backup::capture(&daybook(), &Config::default(), at).unwrap();
        assert_eq!(backup.file_name(), "daybook_backup_20261019_070509.json");
    }

    #[test]
    fn tampered_data_is_rejected() {
        let db = daybook();
        db.tasks.add_single_task("original").unwrap();
        let backup = Backup::capture(&db, &Config::default(), Utc::now()).unwrap();
        let json = backup.to_json().unwrap().replace("original", "tampered");

        assert!(matches!(
            Backup::from_json(&json),
            Err(CoreError::Backup(BackupError::ChecksumMismatch))
        ));
    }

    #[test]
    fn future_format_is_rejected() {
        let mut backup = Backup::capture(&daybook(), &Config::default(), Utc::now()).unwrap();
        backup.format_version = 99;
        let json = backup.to_json().unwrap();
        assert!(matches!(
            Backup::from_json(&json),
            Err(CoreError::Backup(BackupError::UnsupportedVersion { found: 99, .. }))
        ));
    }

    #[test]
    fn restore_replaces_existing_data() {
        let source = daybook();
        source.tasks.add_single_task("from backup").unwrap();
        let backup = Backup::capture(&source, &Config::default(), Utc::now()).unwrap();

        let target = daybook();
        target.tasks.add_single_task("local only").unwrap();
        target
            .notes
            .insert(Note::new("stale", "", Utc::now()))
            .unwrap();

        let (summary, _settings) = backup.restore(&target).unwrap();
        assert_eq!(summary.tasks, 1);
        assert_eq!(summary.notes, 0);
        assert_eq!(target.tasks.list().tasks()[0].title, "from backup");
        assert!(target.notes.all().is_empty());
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = import_from(&daybook(), &dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CoreError::Backup(BackupError::File { .. })));
    }
}
