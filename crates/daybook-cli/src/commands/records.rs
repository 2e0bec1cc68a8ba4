//! Notes, reminders, calendar events, exams and the timetable.
//!
//! These share the same add/list/remove shape; lists print JSON.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use clap::Subcommand;
use daybook_core::records::{CalendarEvent, Exam, Note, Reminder, TimetableEntry};
use daybook_core::Daybook;
use serde::Serialize;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note
    Add {
        /// Note title
        title: String,
        /// Note body
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Edit a note
    Edit {
        /// Note ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        body: Option<String>,
    },
    /// List notes
    List,
    /// Remove a note
    Remove {
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder
    Add {
        /// Reminder title
        title: String,
        /// When to remind: RFC 3339, or "YYYY-MM-DD HH:MM" in local time
        #[arg(long, value_parser = parse_datetime)]
        at: DateTime<Utc>,
    },
    /// List reminders
    List {
        /// Only reminders that are due and not done
        #[arg(long)]
        due: bool,
        /// Only future reminders that are not done
        #[arg(long, conflicts_with = "due")]
        upcoming: bool,
    },
    /// Mark a reminder done
    Done {
        /// Reminder ID
        id: String,
    },
    /// Remove a reminder
    Remove {
        /// Reminder ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum EventAction {
    /// Add a calendar event
    Add {
        /// Event title
        title: String,
        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        /// End time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List events
    List {
        /// Only events on this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Remove an event
    Remove {
        /// Event ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ExamAction {
    /// Add an exam
    Add {
        /// Subject
        subject: String,
        /// Date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        /// Room or venue
        #[arg(long)]
        location: Option<String>,
    },
    /// List exams with days remaining
    List {
        /// Include exams that have passed
        #[arg(long)]
        all: bool,
    },
    /// Remove an exam
    Remove {
        /// Exam ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ClassAction {
    /// Add a weekly class
    Add {
        /// Subject
        subject: String,
        /// Day of the week (mon, tue, ...)
        #[arg(long, value_parser = parse_weekday)]
        day: Weekday,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// End time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// Room
        #[arg(long)]
        location: Option<String>,
    },
    /// List classes
    List {
        /// Only classes on this day (mon, tue, ...)
        #[arg(long, value_parser = parse_weekday)]
        day: Option<Weekday>,
    },
    /// Remove a class
    Remove {
        /// Class ID
        id: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {s:?}: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("invalid time {s:?}: {e}"))
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.parse::<Weekday>()
        .map_err(|_| format!("invalid day {s:?}: expected mon, tue, ..."))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|e| format!("invalid date-time {s:?}: {e}"))?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("{s:?} does not exist in the local time zone"))
}

pub fn run_note(action: NoteAction) -> CmdResult {
    let daybook = Daybook::open()?;
    match action {
        NoteAction::Add { title, body } => {
            let note = daybook.notes.insert(Note::new(&title, &body, Utc::now()))?;
            println!("Note added: {}", note.id);
        }
        NoteAction::Edit { id, title, body } => {
            daybook.notes.modify(&id, |note| {
                note.edit(title.as_deref(), body.as_deref(), Utc::now())
            })?;
            println!("Note updated: {id}");
        }
        NoteAction::List => print_json(&daybook.notes.all())?,
        NoteAction::Remove { id } => {
            daybook.notes.remove(&id)?;
            println!("Note removed: {id}");
        }
    }
    Ok(())
}

pub fn run_reminder(action: ReminderAction) -> CmdResult {
    let daybook = Daybook::open()?;
    match action {
        ReminderAction::Add { title, at } => {
            let reminder = daybook.reminders.insert(Reminder::new(&title, at))?;
            println!("Reminder added: {}", reminder.id);
        }
        ReminderAction::List { due, upcoming } => {
            let reminders = daybook.reminders.all();
            let now = Utc::now();
            if due {
                print_json(&reminders.due(now))?;
            } else if upcoming {
                print_json(&reminders.upcoming(now))?;
            } else {
                print_json(&reminders)?;
            }
        }
        ReminderAction::Done { id } => {
            daybook.reminders.modify(&id, Reminder::mark_done)?;
            println!("Reminder done: {id}");
        }
        ReminderAction::Remove { id } => {
            daybook.reminders.remove(&id)?;
            println!("Reminder removed: {id}");
        }
    }
    Ok(())
}

pub fn run_event(action: EventAction) -> CmdResult {
    let daybook = Daybook::open()?;
    match action {
        EventAction::Add {
            title,
            date,
            start,
            end,
            description,
        } => {
            let mut event = CalendarEvent::new(&title, date).with_times(start, end);
            event.description = description;
            let event = daybook.events.insert(event)?;
            println!("Event added: {}", event.id);
        }
        EventAction::List { date } => {
            let events = daybook.events.all();
            match date {
                Some(date) => print_json(&events.on(date))?,
                None => print_json(&events)?,
            }
        }
        EventAction::Remove { id } => {
            daybook.events.remove(&id)?;
            println!("Event removed: {id}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ExamRow<'a> {
    #[serde(flatten)]
    exam: &'a Exam,
    days_until: i64,
}

pub fn run_exam(action: ExamAction) -> CmdResult {
    let daybook = Daybook::open()?;
    match action {
        ExamAction::Add {
            subject,
            date,
            time,
            location,
        } => {
            let mut exam = Exam::new(&subject, date);
            exam.time = time;
            exam.location = location;
            let exam = daybook.exams.insert(exam)?;
            println!("Exam added: {}", exam.id);
        }
        ExamAction::List { all } => {
            let exams = daybook.exams.all();
            let today = Local::now().date_naive();
            let selected: Vec<&Exam> = if all {
                exams.items().iter().collect()
            } else {
                exams.upcoming(today)
            };
            let rows: Vec<ExamRow<'_>> = selected
                .into_iter()
                .map(|exam| ExamRow {
                    exam,
                    days_until: exam.days_until(today),
                })
                .collect();
            print_json(&rows)?;
        }
        ExamAction::Remove { id } => {
            daybook.exams.remove(&id)?;
            println!("Exam removed: {id}");
        }
    }
    Ok(())
}

pub fn run_class(action: ClassAction) -> CmdResult {
    let daybook = Daybook::open()?;
    match action {
        ClassAction::Add {
            subject,
            day,
            start,
            end,
            location,
        } => {
            let mut entry = TimetableEntry::new(&subject, day, start, end);
            entry.location = location;
            let entry = daybook.timetable.insert(entry)?;
            println!("Class added: {}", entry.id);
        }
        ClassAction::List { day } => {
            let timetable = daybook.timetable.all();
            match day {
                Some(day) => print_json(&timetable.for_day(day))?,
                None => print_json(&timetable)?,
            }
        }
        ClassAction::Remove { id } => {
            daybook.timetable.remove(&id)?;
            println!("Class removed: {id}");
        }
    }
    Ok(())
}
