use std::path::PathBuf;

use clap::Subcommand;
use daybook_core::backup::{default_export_dir, export_to_dir, import_from};
use daybook_core::{Config, Daybook};

use super::CmdResult;

#[derive(Subcommand)]
pub enum BackupAction {
    /// Export every feature and the settings to a JSON file
    Export {
        /// Target directory (default: configured export dir, then Downloads)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace all data with the contents of a backup file
    Import {
        /// Backup file path
        path: PathBuf,
    },
}

pub fn run(action: BackupAction) -> CmdResult {
    let config = Config::load()?;
    let daybook = Daybook::open()?;

    match action {
        BackupAction::Export { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => default_export_dir(&config)?,
            };
            let path = export_to_dir(&daybook, &config, &dir)
                .map_err(|e| format!("backup failed: {e}"))?;
            println!("Backup exported to {}", path.display());
        }
        BackupAction::Import { path } => {
            let (summary, settings) =
                import_from(&daybook, &path).map_err(|e| format!("import failed: {e}"))?;
            settings.save()?;
            println!(
                "Backup imported: {} tasks, {} notes, {} reminders, {} events, {} exams, {} classes",
                summary.tasks,
                summary.notes,
                summary.reminders,
                summary.events,
                summary.exams,
                summary.timetable
            );
        }
    }
    Ok(())
}
