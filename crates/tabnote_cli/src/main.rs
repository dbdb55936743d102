//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tabnote_core` linkage.
//! - Open a workspace database and print a deterministic summary.
//!
//! Usage: `tabnote [DB_PATH]`. Without an argument the path comes from
//! `TABNOTE_DB_PATH`.

use std::path::PathBuf;
use std::process::ExitCode;

use tabnote_core::{CoreConfig, SqlitePersistence, Store};

fn main() -> ExitCode {
    println!("tabnote_core ping={}", tabnote_core::ping());
    println!("tabnote_core version={}", tabnote_core::core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("tabnote: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_arg: Option<String>) -> Result<(), String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(path) = db_arg {
        config.db_path = PathBuf::from(path);
    }
    config
        .ensure_db_dir()
        .map_err(|err| format!("cannot create {}: {err}", config.db_path.display()))?;

    let persistence = SqlitePersistence::open(&config.db_path).map_err(|err| err.to_string())?;
    let store = Store::open(persistence).map_err(|err| err.to_string())?;
    let snapshot = store.snapshot();

    println!("db={}", config.db_path.display());
    println!("tabs={}", snapshot.tabs.len());
    println!("groups={}", snapshot.groups.len());
    println!("history={}", snapshot.history.len());
    println!(
        "active_tab={}",
        snapshot.active_tab_id.as_deref().unwrap_or("-")
    );
    Ok(())
}
