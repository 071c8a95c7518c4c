//! Data directory sanity checks.
//!
//! Run before opening to catch a misconfigured or damaged directory early.

use std::path::Path;

/// Check that the LMDB data directory looks usable before opening.
///
/// A missing or empty directory is a fresh start. A directory that holds
/// other files but no `data.mdb` suggests corruption or a wrong path.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(format!("{} exists but is not a directory", path.display()));
    }
    if path.join("data.mdb").exists() {
        return Ok(());
    }
    let has_entries = std::fs::read_dir(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?
        .next()
        .is_some();
    if has_entries {
        return Err(format!(
            "LMDB directory is not empty but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
