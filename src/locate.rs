use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::LocateError;

const EXTENSION: &str = ".xlsx";

// Excel keeps `~$name.xlsx` next to a workbook while it is open.
const LOCK_PREFIX: &str = "~$";

/// Finds the spreadsheet to invoice in `dir`.
///
/// A missing directory is created and reported as
/// [`LocateError::FolderCreated`]. Only direct entries are looked at; if
/// several spreadsheets are present the first one in listing order wins.
pub fn find_spreadsheet(dir: &Path) -> Result<PathBuf, LocateError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        info!("Created invoice folder {}", dir.display());
        return Err(LocateError::FolderCreated {
            path: dir.to_path_buf(),
        });
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(EXTENSION)
            && !name.starts_with(LOCK_PREFIX)
            && entry.file_type()?.is_file()
        {
            candidates.push(entry.path());
        }
    }

    let mut candidates = candidates.into_iter();
    let found = candidates.next().ok_or_else(|| LocateError::NotFound {
        dir: dir.to_path_buf(),
    })?;
    for ignored in candidates {
        warn!(
            "Several spreadsheets in {}, ignoring {}",
            dir.display(),
            ignored.display()
        );
    }

    info!("Using spreadsheet {}", found.display());
    Ok(found)
}
