//! Integration tests for backup export/import.
//!
//! These tests populate every store on an on-disk database, export to a temp
//! directory, import into a fresh database, and compare.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc, Weekday};
use daybook_core::backup::{export_to_dir, import_from, Backup};
use daybook_core::records::{CalendarEvent, Exam, Note, Reminder, TimetableEntry};
use daybook_core::tasks::TaskType;
use daybook_core::{Config, Daybook, Database};
use tempfile::TempDir;

fn open(dir: &TempDir, name: &str) -> Daybook {
    let db = Database::open_at(&dir.path().join(name)).unwrap();
    Daybook::with_database(Arc::new(db))
}

fn populate(daybook: &Daybook) {
    let a = daybook.tasks.add_single_task("Revise algebra").unwrap();
    daybook
        .tasks
        .add_task_group(
            "Lab report",
            &[
                ("Collect data".into(), TaskType::Task),
                ("Stretch".into(), TaskType::Break),
                ("Write up".into(), TaskType::Task),
            ],
        )
        .unwrap();
    daybook
        .tasks
        .add_priority_task("Submit form", 30, Utc::now())
        .unwrap();
    daybook.tasks.complete_task(&a.id).unwrap();

    daybook
        .notes
        .insert(Note::new("Lecture 5", "Fourier series", Utc::now()))
        .unwrap();
    daybook
        .reminders
        .insert(Reminder::new("Call home", Utc::now()))
        .unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 11, 3).unwrap();
    daybook
        .events
        .insert(CalendarEvent::new("Career fair", day))
        .unwrap();
    daybook.exams.insert(Exam::new("Statistics", day)).unwrap();
    daybook
        .timetable
        .insert(TimetableEntry::new(
            "Chemistry",
            Weekday::Thu,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        ))
        .unwrap();
}

#[test]
fn export_then_import_reproduces_the_data_set() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir, "source.db");
    populate(&source);
    let mut settings = Config::default();
    settings.focus.strict_mode = true;
    settings.focus.blocklist = vec!["com.example.game".into()];

    let path = export_to_dir(&source, &settings, &dir.path().join("exports")).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("daybook_backup_"));

    let target = open(&dir, "target.db");
    let (summary, imported_settings) = import_from(&target, &path).unwrap();
    assert_eq!(summary.tasks, 5);
    assert_eq!(summary.notes, 1);
    assert_eq!(summary.timetable, 1);
    assert_eq!(imported_settings, settings);

    let before = Backup::capture(&source, &settings, Utc::now()).unwrap();
    let after = Backup::capture(&target, &imported_settings, Utc::now()).unwrap();
    assert_eq!(before.data, after.data);
    assert_eq!(before.checksum, after.checksum);
}

#[test]
fn reimporting_the_same_snapshot_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir, "source.db");
    populate(&source);
    let path = export_to_dir(&source, &Config::default(), dir.path()).unwrap();

    let target = open(&dir, "target.db");
    import_from(&target, &path).unwrap();
    let once = Backup::capture(&target, &Config::default(), Utc::now()).unwrap();
    import_from(&target, &path).unwrap();
    let twice = Backup::capture(&target, &Config::default(), Utc::now()).unwrap();
    assert_eq!(once.data, twice.data);
}

#[test]
fn imported_data_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir, "source.db");
    populate(&source);
    let path = export_to_dir(&source, &Config::default(), dir.path()).unwrap();

    {
        let target = open(&dir, "target.db");
        import_from(&target, &path).unwrap();
    }
    let reopened = open(&dir, "target.db");
    assert_eq!(reopened.tasks.list(), source.tasks.list());
    assert_eq!(reopened.exams.all(), source.exams.all());
}

#[test]
fn corrupt_file_leaves_stores_untouched() {
    let dir = TempDir::new().unwrap();
    let target = open(&dir, "target.db");
    target.tasks.add_single_task("keep me").unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"format_version\": 1, \"data\": ").unwrap();

    assert!(import_from(&target, &path).is_err());
    assert_eq!(target.tasks.list().tasks()[0].title, "keep me");
}
