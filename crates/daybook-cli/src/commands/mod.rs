pub mod backup;
pub mod config;
pub mod records;
pub mod task;
pub mod timer;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
