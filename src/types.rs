//! Core types for flowscan.
//!
//! Key design decisions:
//! - Records are plain owned data, built once per scan and never mutated
//!   after the scanner stamps their provenance
//! - `IndexMap` keeps records in discovery order, so JSON output follows
//!   file order and then source order within a file
//! - Field names serialize exactly as consumers of the JSON expect them

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from synthesized flow id to its record.
pub type FlowMap = IndexMap<String, FlowRecord>;

/// A constant expression found directly in source.
///
/// Only these shapes are ever extracted from decorator arguments;
/// anything else (names, calls, f-strings, containers) is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A decoration recognized as the flow marker, with its literal keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerCall {
    /// Keyword name -> literal value, in source order.
    pub keywords: IndexMap<String, LiteralValue>,
}

impl MarkerCall {
    pub fn get(&self, keyword: &str) -> Option<&LiteralValue> {
        self.keywords.get(keyword)
    }

    /// String value of a keyword, if present and a string literal.
    pub fn str_arg(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(LiteralValue::as_str)
    }
}

/// Whether a flow is a free function or defined inside a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Function,
    Method,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Function => "function",
            FlowKind::Method => "method",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered flow declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Key of this record in the scan result: `{original_name}_{byte offset}`
    pub id: String,
    /// Display name: `original_name` with hyphens replaced by underscores
    pub name: String,
    /// `name=` argument of the marker, else the function identifier
    pub original_name: String,
    /// `description=` argument, else the docstring, else empty
    pub description: String,
    pub kind: FlowKind,
    /// Nearest enclosing class, only for methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_class: Option<String>,
    /// Path of the defining file, as enumerated from the scan root
    #[serde(default)]
    pub source_file: String,
    /// File stem of `source_file`
    #[serde(default)]
    pub module_name: String,
    /// Line of the `def` keyword (1-indexed)
    pub line: u32,
    #[serde(default)]
    pub is_async: bool,
}

impl FlowRecord {
    /// Stamp file provenance onto a record produced by the tree walker.
    pub fn with_provenance(mut self, path: &Path) -> Self {
        self.source_file = path.to_string_lossy().into_owned();
        self.module_name = module_name_for(path);
        self
    }
}

/// Module name for a source path: the file name with its extension stripped.
pub fn module_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display form of a flow name.
pub fn display_name(original: &str) -> String {
    original.replace('-', "_")
}
