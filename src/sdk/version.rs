//! Version report written for tooling that shells out to flowscan.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    pub version: String,
    pub success: bool,
}

/// Structured failure written next to the requested output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error_type: String,
    pub error_message: String,
    pub success: bool,
}

pub fn version_info() -> VersionReport {
    VersionReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        success: true,
    }
}

/// `out.json` -> `out_error.json`; other names get the suffix appended.
pub fn error_file_path(output: &Path) -> PathBuf {
    let raw = output.to_string_lossy();
    match raw.strip_suffix(".json") {
        Some(stem) => PathBuf::from(format!("{}_error.json", stem)),
        None => PathBuf::from(format!("{}_error.json", raw)),
    }
}

/// Write the version report to `output`.
///
/// On failure an [`ErrorReport`] goes to [`error_file_path`] and the
/// original error is returned.
pub fn write_version_file(output: &Path) -> Result<()> {
    let written = serde_json::to_string(&version_info())
        .context("Failed to serialize version report")
        .and_then(|json| {
            std::fs::write(output, json)
                .with_context(|| format!("Failed to write version file: {}", output.display()))
        });

    match written {
        Ok(()) => {
            tracing::info!(path = %output.display(), version = env!("CARGO_PKG_VERSION"), "version saved");
            Ok(())
        }
        Err(e) => {
            let report = ErrorReport {
                error_type: "VersionWriteError".to_string(),
                error_message: format!("{:#}", e),
                success: false,
            };
            let error_path = error_file_path(output);
            let saved = serde_json::to_string_pretty(&report)
                .map_err(anyhow::Error::from)
                .and_then(|json| std::fs::write(&error_path, json).map_err(anyhow::Error::from));
            if let Err(file_error) = saved {
                tracing::error!(path = %error_path.display(), error = %file_error, "failed to write error file");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_file_path() {
        assert_eq!(error_file_path(Path::new("/tmp/v.json")), PathBuf::from("/tmp/v_error.json"));
        assert_eq!(error_file_path(Path::new("v.out")), PathBuf::from("v.out_error.json"));
    }

    #[test]
    fn test_write_version_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("version.json");
        write_version_file(&output)?;

        let report: VersionReport = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
        assert!(report.success);
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
        Ok(())
    }

    #[test]
    fn test_write_failure_produces_error_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        // A directory in place of the output file makes the write fail
        let output = dir.path().join("version.json");
        std::fs::create_dir(&output)?;

        assert!(write_version_file(&output).is_err());

        let report: ErrorReport =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("version_error.json"))?)?;
        assert!(!report.success);
        assert!(report.error_message.contains("version.json"));
        Ok(())
    }
}
