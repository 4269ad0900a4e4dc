//! Checks CPython enforces that the tree-sitter grammar does not.
//!
//! tree-sitter-python is lenient on purpose. It accepts Python 2 statement
//! forms (`print "x"`, `exec "x"`, `except E, e:`), lexes backticks as
//! string delimiters, and tracks indentation only as a depth, never as an
//! exact width. Each of those is a syntax error for the interpreter, so a
//! file containing one is rejected here and contributes no flows.
//!
//! Indentation is compared the way the tokenizer does it: every line's
//! leading whitespace is measured twice, with tabs to 8-column stops and
//! with tabs as one column. Statements of one block must agree on both
//! measures, and a block must be deeper than its header on both.

use tree_sitter::Node;

use crate::error::SyntaxError;

/// Leading whitespace width as (tabs to 8-column stops, tabs as 1 column).
type Indent = (usize, usize);

/// First interpreter-only syntax error in `root`, if any.
///
/// Expects a tree that already passed the ERROR/MISSING check and source
/// whose line endings are `\n`.
pub fn first_strict_error(root: Node<'_>, source: &[u8]) -> Option<SyntaxError> {
    let lines = LineIndex::new(source);
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let Some((at, message)) = check_node(node, source, &lines) {
            let position = at.start_position();
            return Some(SyntaxError {
                line: position.row as u32 + 1,
                column: position.column as u32 + 1,
                message,
            });
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    None
}

fn check_node<'t>(node: Node<'t>, source: &[u8], lines: &LineIndex) -> Option<(Node<'t>, String)> {
    match node.kind() {
        "print_statement" if !is_call_shaped_print(node, source) => {
            Some((node, "Missing parentheses in call to 'print'".to_string()))
        }
        "exec_statement" => Some((node, "Missing parentheses in call to 'exec'".to_string())),
        "except_clause" => {
            let mut cursor = node.walk();
            let comma = node.children(&mut cursor).find(|child| child.kind() == ",");
            comma.map(|at| (at, "multiple exception types must be parenthesized".to_string()))
        }
        "string" => {
            let start = node.child(0)?;
            let opener = start.utf8_text(source).ok()?;
            opener
                .contains('`')
                .then(|| (node, "invalid syntax: backtick".to_string()))
        }
        "module" => statements(node)
            .into_iter()
            .filter(|stmt| lines.starts_line(*stmt))
            .find(|stmt| lines.indent_of(*stmt) != (0, 0))
            .map(|stmt| (stmt, "unexpected indent".to_string())),
        "block" => check_block(node, lines),
        _ => None,
    }
}

/// `print (x)` and `print (x), y` are valid expressions that the grammar
/// may still file under the Python 2 statement.
fn is_call_shaped_print(node: Node<'_>, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    let has_chevron = node.named_children(&mut cursor).any(|child| child.kind() == "chevron");
    let first_argument = node
        .child_by_field_name("argument")
        .and_then(|arg| arg.utf8_text(source).ok());
    !has_chevron && first_argument.is_some_and(|text| text.starts_with('('))
}

fn check_block<'t>(block: Node<'t>, lines: &LineIndex) -> Option<(Node<'t>, String)> {
    let stmts = statements(block);
    let header = block.parent();

    if stmts.is_empty() {
        let at = header.unwrap_or(block);
        return Some((at, "expected an indented block".to_string()));
    }

    let header_row = header.map(|h| h.start_position().row);
    if header_row == Some(block.start_position().row) {
        // `def f(): pass`, simple statements on the header line
        return None;
    }
    let header_indent = header.map(|h| lines.indent_at_row(h.start_position().row)).unwrap_or((0, 0));

    let mut expected: Option<Indent> = None;
    for stmt in stmts.into_iter().filter(|stmt| lines.starts_line(*stmt)) {
        let indent = lines.indent_of(stmt);
        match expected {
            None => {
                let deeper = (indent.0 > header_indent.0, indent.1 > header_indent.1);
                match deeper {
                    (true, true) => expected = Some(indent),
                    (false, false) => return Some((stmt, "expected an indented block".to_string())),
                    _ => return Some((stmt, tab_error())),
                }
            }
            Some(level) if level == indent => {}
            Some(level) => {
                let message = if level.0 == indent.0 || level.1 == indent.1 {
                    tab_error()
                } else if indent.0 > level.0 {
                    "unexpected indent".to_string()
                } else {
                    "unindent does not match any outer indentation level".to_string()
                };
                return Some((stmt, message));
            }
        }
    }

    None
}

fn tab_error() -> String {
    "inconsistent use of tabs and spaces in indentation".to_string()
}

/// Statement children of a module or block.
fn statements(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Byte offsets of line starts.
struct LineIndex<'s> {
    source: &'s [u8],
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    fn new(source: &'s [u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, starts }
    }

    fn line_start(&self, row: usize) -> usize {
        self.starts.get(row).copied().unwrap_or(self.source.len())
    }

    /// True when only indentation precedes `node` on its line.
    fn starts_line(&self, node: Node<'_>) -> bool {
        let start = self.line_start(node.start_position().row);
        self.source
            .get(start..node.start_byte())
            .is_some_and(|prefix| prefix.iter().all(|b| matches!(b, b' ' | b'\t' | b'\x0c')))
    }

    fn indent_of(&self, node: Node<'_>) -> Indent {
        self.indent_at_row(node.start_position().row)
    }

    fn indent_at_row(&self, row: usize) -> Indent {
        let mut indent = (0, 0);
        for b in self.source.iter().skip(self.line_start(row)) {
            match b {
                b' ' => indent = (indent.0 + 1, indent.1 + 1),
                b'\t' => indent = ((indent.0 / 8 + 1) * 8, indent.1 + 1),
                // Form feed resets the column count
                b'\x0c' => indent = (0, 0),
                _ => break,
            }
        }
        indent
    }
}
