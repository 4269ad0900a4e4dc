//! Tree-sitter parsing of Python source.
//!
//! Tree-sitter is error-tolerant: it always produces a tree and marks the
//! broken regions with ERROR or MISSING nodes. The scanner wants a file to
//! either parse or not, so [`PythonParser::parse`] rejects any tree
//! containing an error and reports the first one in source order. Trees
//! that parse cleanly still go through [`first_strict_error`] for the
//! indentation and Python 2 forms the grammar lets through.
//!
//! Line endings are normalized to `\n` first, as Python's text-mode read
//! does, so string values never carry a stray `\r`.

use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser as TsParser, Tree};

use crate::error::SyntaxError;
use crate::extraction::strict::first_strict_error;

static PYTHON: Lazy<Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());

/// Source text together with its syntax tree.
pub struct ParsedSource {
    source: String,
    tree: Tree,
}

impl ParsedSource {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

/// Python parser (tree-sitter parsers are not thread-safe, keep one per thread)
pub struct PythonParser {
    parser: TsParser,
}

impl PythonParser {
    pub fn new() -> Self {
        Self {
            parser: TsParser::new(),
        }
    }

    /// Parse a complete module. Fails if the text contains any syntax error.
    pub fn parse(&mut self, source: impl Into<String>) -> Result<ParsedSource, SyntaxError> {
        let source = normalize_newlines(source.into());

        self.parser
            .set_language(&PYTHON)
            .map_err(|e| SyntaxError {
                line: 0,
                column: 0,
                message: format!("incompatible Python grammar: {}", e),
            })?;

        let tree = self.parser.parse(&source, None).ok_or_else(|| SyntaxError {
            line: 0,
            column: 0,
            message: "parser produced no tree".to_string(),
        })?;

        if let Some(error) = first_syntax_error(tree.root_node(), source.as_bytes())
            .or_else(|| first_strict_error(tree.root_node(), source.as_bytes()))
        {
            return Err(error);
        }

        Ok(ParsedSource { source, tree })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
fn normalize_newlines(source: String) -> String {
    if !source.contains('\r') {
        return source;
    }
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// Find the first ERROR or MISSING node in source order.
fn first_syntax_error(root: Node<'_>, source: &[u8]) -> Option<SyntaxError> {
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let position = node.start_position();
            let message = if node.is_missing() {
                format!("expected `{}`", node.kind())
            } else {
                let snippet = node
                    .utf8_text(source)
                    .unwrap_or("")
                    .lines()
                    .next()
                    .unwrap_or("")
                    .chars()
                    .take(40)
                    .collect::<String>();
                format!("invalid syntax near `{}`", snippet.trim())
            };
            return Some(SyntaxError {
                line: position.row as u32 + 1,
                column: position.column as u32 + 1,
                message,
            });
        }

        // Push in reverse so the leftmost child is visited first
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|child| child.has_error())
            .collect();
        stack.extend(children.into_iter().rev());
    }

    // has_error() was set but no explicit node carried it
    let position = root.start_position();
    Some(SyntaxError {
        line: position.row as u32 + 1,
        column: position.column as u32 + 1,
        message: "invalid syntax".to_string(),
    })
}
