use fibra_core::error::FibraError;
use fibra_core::history::HistoryStore;
use std::path::Path;

use crate::output;

pub fn show(file: &Path) -> Result<(), FibraError> {
    let rows = HistoryStore::new(file).load()?;
    if rows.is_empty() {
        println!("No history in {}", file.display());
        return Ok(());
    }
    output::table::print_history(&rows);
    Ok(())
}

pub fn clear(file: &Path) -> Result<(), FibraError> {
    if HistoryStore::new(file).clear()? {
        println!("Deleted {}", file.display());
    } else {
        println!("{} does not exist, nothing to delete", file.display());
    }
    Ok(())
}
