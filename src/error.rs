//! Error taxonomy for flow discovery.
//!
//! Only the root-level variants ([`ScanError::RootNotFound`],
//! [`ScanError::RootUnreadable`]) ever surface from
//! [`crate::scanner::FlowScanner::scan_directory`]. The per-file variants
//! are collected into the scan outcome and logged; they never abort a scan.

use std::path::PathBuf;

use thiserror::Error;

/// Location and description of the first syntax error in a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    /// 1-indexed line of the offending node
    pub line: u32,
    /// 1-indexed column of the offending node
    pub column: u32,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist or is not a directory.
    #[error("scan root not found or not a directory: {}", path.display())]
    RootNotFound { path: PathBuf },

    /// The scan root exists but its entries cannot be listed.
    #[error("cannot read scan root {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One file could not be read (permissions, I/O, invalid UTF-8).
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One file's text could not be parsed as Python.
    #[error("failed to parse {}: {error}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        error: SyntaxError,
    },
}

impl ScanError {
    /// Path of the root or file this error concerns.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::RootNotFound { path }
            | ScanError::RootUnreadable { path, .. }
            | ScanError::FileRead { path, .. }
            | ScanError::FileParse { path, .. } => path,
        }
    }

    /// True for conditions recovered locally by skipping one file.
    pub fn is_per_file(&self) -> bool {
        matches!(self, ScanError::FileRead { .. } | ScanError::FileParse { .. })
    }
}
