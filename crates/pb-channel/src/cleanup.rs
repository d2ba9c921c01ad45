use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{REQUEST_PREFIX, RESPONSE_PREFIX, TRANSPORT_EXTENSION};

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `in<digits>.txt` or `out<digits>.txt`.
pub fn is_transport_file_name(name: &str) -> bool {
    let Some(stem) = name
        .strip_suffix(TRANSPORT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return false;
    };
    let digits = stem
        .strip_prefix(RESPONSE_PREFIX)
        .or_else(|| stem.strip_prefix(REQUEST_PREFIX));
    matches!(digits, Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Deletes every request and response file under `root`, whatever its
/// sequence number. Safe to repeat; a missing root is not an error. A failed
/// deletion is logged and the remaining files are still attempted.
pub fn remove_transport_files(root: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return report,
        Err(error) => {
            tracing::warn!(root = %root.display(), %error, "cannot list transport directory");
            report.failed.push((root.to_path_buf(), error));
            return report;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
        let name = entry.file_name();
        if !is_file || !name.to_str().is_some_and(is_transport_file_name) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => report.removed.push(path),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to delete transport file");
                report.failed.push((path, error));
            }
        }
    }

    tracing::debug!(root = %root.display(), removed = report.removed.len(), "transport files cleaned");
    report
}
