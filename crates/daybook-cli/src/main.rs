use clap::{Parser, Subcommand};
use daybook_core::Config;

mod commands;
mod platform;

#[derive(Parser)]
#[command(name = "daybook", version, about = "Daybook CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task list management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Notes
    Note {
        #[command(subcommand)]
        action: commands::records::NoteAction,
    },
    /// Reminders
    Reminder {
        #[command(subcommand)]
        action: commands::records::ReminderAction,
    },
    /// Calendar events
    Event {
        #[command(subcommand)]
        action: commands::records::EventAction,
    },
    /// Exam tracker
    Exam {
        #[command(subcommand)]
        action: commands::records::ExamAction,
    },
    /// Weekly timetable
    Class {
        #[command(subcommand)]
        action: commands::records::ClassAction,
    },
    /// Focus timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Backup export/import
    Backup {
        #[command(subcommand)]
        action: commands::backup::BackupAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let level = Config::load_or_default().log_level;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Note { action } => commands::records::run_note(action),
        Commands::Reminder { action } => commands::records::run_reminder(action),
        Commands::Event { action } => commands::records::run_event(action),
        Commands::Exam { action } => commands::records::run_exam(action),
        Commands::Class { action } => commands::records::run_class(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Backup { action } => commands::backup::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
