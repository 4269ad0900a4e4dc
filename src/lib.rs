//! flowscan - static discovery of decorated Python workflow definitions
//!
//! Finds every function decorated with the workflow marker (`@flow(...)`
//! or `@prefect.flow(...)` by default) under a directory tree without
//! importing or executing any of the scanned code.
//!
//! # Architecture
//!
//! ```text
//! File Discovery → Parse → Declaration Walk → Marker Match → Records → Merge
//!       ↓            ↓            ↓                ↓            ↓         ↓
//!    ignore     tree-sitter   class scope      keyword      FlowRecord  IndexMap
//!    crate       (python)      tracking        literals                (sorted)
//! ```
//!
//! Around the scanner sit a few thin collaborators:
//! - [`deployments`]: deployment name parsing and tag filtering
//! - [`catalog`]: flows cross-referenced with their deployments
//! - [`sdk`]: named JSON providers for the command line

pub mod catalog;
pub mod config;
pub mod deployments;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod scanner;
pub mod sdk;
pub mod types;

pub use config::Config;
pub use error::{ScanError, SyntaxError};
pub use scanner::{scan_directory, FlowScanner, ScanOutcome};
pub use types::{FlowKind, FlowMap, FlowRecord, LiteralValue, MarkerCall};
