//! Flow extraction from Python source using tree-sitter.
//!
//! This module handles:
//! - Parsing source files into syntax trees (rejecting broken files)
//! - Enforcing the indentation and Python 3 rules the grammar skips
//! - Recognizing the flow marker decoration and its literal keywords
//! - Walking nested scopes to build one record per marked definition
//!
//! # Pipeline
//!
//! ```text
//! source text → PythonParser → FlowWalker → (per def) MarkerMatcher → FlowRecord
//! ```

mod literal;
mod marker;
mod source;
mod strict;
mod walker;

pub use literal::{clean_docstring, literal_value, string_value};
pub use marker::{MarkerMatcher, DEFAULT_MARKER};
pub use source::{ParsedSource, PythonParser};
pub use walker::FlowWalker;
