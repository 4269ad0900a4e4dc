//! Directory-level flow scanning.
//!
//! Ties discovery and extraction together:
//!
//! ```text
//! find_source_files → (per file, rayon) read → parse → walk → stamp provenance
//!                   → merge in sorted path order
//! ```
//!
//! Per-file failures (unreadable file, syntax error) are isolated: the file
//! is skipped, the error is logged and kept in [`ScanOutcome::skipped`], and
//! the scan carries on. Only a missing, non-directory or unreadable root
//! fails the call.
//!
//! Ids are unique within a file but not across files. When two files
//! produce the same id, the file later in sorted path order wins and the
//! id is reported in [`ScanOutcome::collisions`] and logged as a warning.

use std::cell::RefCell;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discovery::find_source_files;
use crate::error::{ScanError, SyntaxError};
use crate::extraction::{FlowWalker, MarkerMatcher, PythonParser};
use crate::types::FlowMap;

thread_local! {
    /// Thread-local parser (tree-sitter parsers are not thread-safe)
    static PARSER: RefCell<PythonParser> = RefCell::new(PythonParser::new());
}

/// Result of scanning a directory tree.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// All flows found, keyed by id, in file order then source order.
    pub flows: FlowMap,
    /// Number of source files enumerated (including skipped ones).
    pub files_scanned: usize,
    /// Files that could not be read or parsed.
    pub skipped: Vec<ScanError>,
    /// Ids overwritten by a later file.
    pub collisions: Vec<String>,
}

pub struct FlowScanner {
    config: Config,
    matcher: MarkerMatcher,
}

impl FlowScanner {
    pub fn new(config: Config) -> Self {
        let matcher = MarkerMatcher::new(config.marker.clone());
        Self { config, matcher }
    }

    /// Scanner configured from the flowscan.toml / pyproject.toml governing `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(Config::load(root))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract flows from in-memory source text. Provenance stays empty.
    pub fn scan_source(&self, source: &str) -> Result<FlowMap, SyntaxError> {
        PARSER.with(|parser| {
            let parsed = parser.borrow_mut().parse(source)?;
            Ok(FlowWalker::new(&self.matcher, parsed.bytes()).walk(parsed.root()))
        })
    }

    /// Extract flows from one file, stamping `source_file` and `module_name`.
    pub fn scan_file(&self, path: &Path) -> Result<FlowMap, ScanError> {
        debug!(path = %path.display(), "examining file");

        let content = std::fs::read_to_string(path).map_err(|source| ScanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let flows = self.scan_source(&content).map_err(|error| ScanError::FileParse {
            path: path.to_path_buf(),
            error,
        })?;

        Ok(flows
            .into_iter()
            .map(|(id, record)| (id, record.with_provenance(path)))
            .collect())
    }

    /// Scan every source file below `root`.
    ///
    /// ## Errors
    /// Only the root-level [`ScanError`] variants; per-file errors land in
    /// the outcome.
    pub fn scan_directory(&self, root: &Path) -> Result<ScanOutcome, ScanError> {
        info!(root = %root.display(), "scanning directory");

        let files = find_source_files(root, &self.config)?;

        // Parse in parallel, but merge in sorted path order so collision
        // resolution never depends on scheduling
        let results: Vec<Result<FlowMap, ScanError>> = if self.config.parallel {
            files.par_iter().map(|path| self.scan_file(path)).collect()
        } else {
            files.iter().map(|path| self.scan_file(path)).collect()
        };

        let mut outcome = ScanOutcome {
            files_scanned: files.len(),
            ..Default::default()
        };

        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(flows) => {
                    if !flows.is_empty() {
                        info!(path = %path.display(), count = flows.len(), "found flows");
                    }
                    merge_into(&mut outcome, flows);
                }
                Err(e) => {
                    warn!(path = %e.path().display(), error = %e, "skipping file");
                    outcome.skipped.push(e);
                }
            }
        }

        info!(
            flows = outcome.flows.len(),
            files = outcome.files_scanned,
            skipped = outcome.skipped.len(),
            "scan complete"
        );
        Ok(outcome)
    }
}

fn merge_into(outcome: &mut ScanOutcome, flows: FlowMap) {
    for (id, record) in flows {
        let source_file = record.source_file.clone();
        if let Some(previous) = outcome.flows.insert(id.clone(), record) {
            warn!(
                id = %id,
                previous = %previous.source_file,
                winner = %source_file,
                "flow id collision, keeping the later file"
            );
            outcome.collisions.push(id);
        }
    }
}

/// Scan `root` with the configuration found for it and return the flows.
pub fn scan_directory(root: &Path) -> Result<FlowMap, ScanError> {
    FlowScanner::for_root(root)
        .scan_directory(root)
        .map(|outcome| outcome.flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlowRecord;

    fn record(id: &str, file: &str) -> FlowRecord {
        FlowRecord {
            id: id.to_string(),
            name: "f".into(),
            original_name: "f".into(),
            description: String::new(),
            kind: crate::types::FlowKind::Function,
            enclosing_class: None,
            source_file: file.to_string(),
            module_name: "m".into(),
            line: 1,
            is_async: false,
        }
    }

    #[test]
    fn test_merge_last_file_wins_and_reports() {
        let mut outcome = ScanOutcome::default();

        let mut first = FlowMap::new();
        first.insert("f_0".into(), record("f_0", "a.py"));
        merge_into(&mut outcome, first);

        let mut second = FlowMap::new();
        second.insert("f_0".into(), record("f_0", "b.py"));
        second.insert("g_9".into(), record("g_9", "b.py"));
        merge_into(&mut outcome, second);

        assert_eq!(outcome.flows.len(), 2);
        assert_eq!(outcome.flows["f_0"].source_file, "b.py");
        assert_eq!(outcome.collisions, vec!["f_0".to_string()]);
    }

    #[test]
    fn test_scan_source_uses_configured_marker() {
        let scanner = FlowScanner::new(Config {
            marker: "pipeline".into(),
            ..Default::default()
        });
        let flows = scanner
            .scan_source("@pipeline()\ndef a():\n    pass\n\n@flow()\ndef b():\n    pass\n")
            .unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].original_name, "a");
    }

    #[test]
    fn test_scan_source_rejects_syntax_errors() {
        let scanner = FlowScanner::new(Config::default());
        assert!(scanner.scan_source("@flow()\ndef broken(:\n").is_err());
    }
}
