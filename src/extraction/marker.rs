//! Recognition of the flow marker decoration.
//!
//! Two call shapes denote the marker:
//! - `@flow(...)`: a call whose callee is the bare marker identifier
//! - `@prefect.flow(...)`: a call whose callee is an attribute access
//!   ending in the marker name, whatever the qualifying prefix
//!
//! Parentheses around the callee are transparent, so `@(flow)(...)` is the
//! bare shape. A bare `@flow` without a call is not a match, nor is any
//! other expression. Keyword arguments are kept only when their value is a
//! literal constant; everything else is dropped without complaint.

use tree_sitter::Node;

use crate::extraction::literal::literal_value;
use crate::types::MarkerCall;

/// Default decorator name identifying a Prefect flow.
pub const DEFAULT_MARKER: &str = "flow";

#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    marker: String,
}

impl MarkerMatcher {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Match one decoration node.
    ///
    /// Accepts either a `decorator` node or the expression inside one.
    pub fn match_decorator(&self, node: Node<'_>, source: &[u8]) -> Option<MarkerCall> {
        let expression = if node.kind() == "decorator" {
            let mut cursor = node.walk();
            let found = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "comment");
            found?
        } else {
            node
        };

        if expression.kind() != "call" {
            return None;
        }

        let callee = unparenthesize(expression.child_by_field_name("function")?);
        if !self.is_marker_callee(callee, source) {
            return None;
        }

        Some(extract_keywords(expression, source))
    }

    fn is_marker_callee(&self, callee: Node<'_>, source: &[u8]) -> bool {
        let name = match callee.kind() {
            "identifier" => Some(callee),
            "attribute" => callee.child_by_field_name("attribute"),
            _ => None,
        };
        name.and_then(|n| n.utf8_text(source).ok())
            .is_some_and(|text| text == self.marker)
    }
}

impl Default for MarkerMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

/// Strip grouping parentheses: `((flow))` is `flow`.
fn unparenthesize(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while current.kind() == "parenthesized_expression" {
        let mut cursor = current.walk();
        let inner: Vec<Node<'_>> = current
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();
        match inner.as_slice() {
            [only] => current = *only,
            _ => break,
        }
    }
    current
}

/// Collect literal keyword arguments of a call node.
fn extract_keywords(call: Node<'_>, source: &[u8]) -> MarkerCall {
    let mut marker = MarkerCall::default();

    // `flow(x for x in y)` carries a generator_expression here, no keywords
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return marker;
    };
    if arguments.kind() != "argument_list" {
        return marker;
    }

    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        if argument.kind() != "keyword_argument" {
            continue;
        }
        let (Some(name), Some(value)) = (
            argument.child_by_field_name("name"),
            argument.child_by_field_name("value"),
        ) else {
            continue;
        };
        let Ok(keyword) = name.utf8_text(source) else {
            continue;
        };

        match literal_value(value, source) {
            Some(literal) => {
                marker.keywords.insert(keyword.to_string(), literal);
            }
            None => {
                tracing::trace!(keyword, kind = value.kind(), "skipping non-literal marker argument");
            }
        }
    }

    marker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PythonParser;
    use crate::types::LiteralValue;

    /// Parse `code` and run the matcher on the first decorator found.
    fn match_first(code: &str, marker: &str) -> Option<MarkerCall> {
        let mut parser = PythonParser::new();
        let parsed = parser.parse(code).unwrap();
        let matcher = MarkerMatcher::new(marker);

        let mut stack = vec![parsed.root()];
        while let Some(node) = stack.pop() {
            if node.kind() == "decorator" {
                return matcher.match_decorator(node, parsed.bytes());
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        panic!("no decorator in test source");
    }

    #[test]
    fn test_bare_call_matches() {
        let call = match_first("@flow()\ndef f():\n    pass\n", "flow");
        assert!(call.is_some());
        assert!(call.unwrap().keywords.is_empty());
    }

    #[test]
    fn test_qualified_call_matches_like_bare_call() {
        let bare = match_first("@flow(name=\"etl\", retries=2)\ndef f():\n    pass\n", "flow");
        let qualified = match_first(
            "@prefect.flow(name=\"etl\", retries=2)\ndef f():\n    pass\n",
            "flow",
        );
        let deep = match_first(
            "@a.b.c.flow(name=\"etl\", retries=2)\ndef f():\n    pass\n",
            "flow",
        );
        assert!(bare.is_some());
        assert_eq!(bare, qualified);
        assert_eq!(bare, deep);
    }

    #[test]
    fn test_parenthesized_callee_matches() {
        let bare = match_first("@flow(name=\"p\")\ndef f():\n    pass\n", "flow");
        let grouped = match_first("@(flow)(name=\"p\")\ndef f():\n    pass\n", "flow");
        let nested = match_first("@((prefect.flow))(name=\"p\")\ndef f():\n    pass\n", "flow");
        assert!(bare.is_some());
        assert_eq!(bare, grouped);
        assert_eq!(bare, nested);
        assert!(match_first("@(flow)\ndef f():\n    pass\n", "flow").is_none());
    }

    #[test]
    fn test_bare_identifier_without_call_is_not_a_match() {
        assert!(match_first("@flow\ndef f():\n    pass\n", "flow").is_none());
        assert!(match_first("@prefect.flow\ndef f():\n    pass\n", "flow").is_none());
    }

    #[test]
    fn test_other_decorators_do_not_match() {
        assert!(match_first("@task()\ndef f():\n    pass\n", "flow").is_none());
        assert!(match_first("@flow.task()\ndef f():\n    pass\n", "flow").is_none());
        assert!(match_first("@flows()\ndef f():\n    pass\n", "flow").is_none());
        assert!(match_first("@make()()\ndef f():\n    pass\n", "flow").is_none());
    }

    #[test]
    fn test_custom_marker_name() {
        assert!(match_first("@pipeline()\ndef f():\n    pass\n", "pipeline").is_some());
        assert!(match_first("@flow()\ndef f():\n    pass\n", "pipeline").is_none());
    }

    #[test]
    fn test_literal_keywords_extracted() {
        let code = r#"
@flow(name="my-flow", retries=3, timeout=1.5, log_prints=True, cache=None, tag=b"x")
def f():
    pass
"#;
        let call = match_first(code, "flow").unwrap();
        assert_eq!(call.str_arg("name"), Some("my-flow"));
        assert_eq!(call.get("retries"), Some(&LiteralValue::Int(3)));
        assert_eq!(call.get("timeout"), Some(&LiteralValue::Float(1.5)));
        assert_eq!(call.get("log_prints"), Some(&LiteralValue::Bool(true)));
        assert_eq!(call.get("cache"), Some(&LiteralValue::None));
        // Byte strings have no JSON form
        assert_eq!(call.get("tag"), None);
    }

    #[test]
    fn test_non_literal_keywords_skipped() {
        let code = r#"
@flow(name=NAME, description=f"flow {x}", task_runner=Runner(), retries=-1, version="1.0")
def f():
    pass
"#;
        let call = match_first(code, "flow").unwrap();
        assert_eq!(call.keywords.len(), 1);
        assert_eq!(call.str_arg("version"), Some("1.0"));
    }

    #[test]
    fn test_positional_and_splat_arguments_ignored() {
        let code = "@flow(\"positional\", **opts, name='n')\ndef f():\n    pass\n";
        let call = match_first(code, "flow").unwrap();
        assert_eq!(call.keywords.len(), 1);
        assert_eq!(call.str_arg("name"), Some("n"));
    }

    #[test]
    fn test_string_forms() {
        let code = r#"
@flow(a='single', b="""triple""", c=r"raw\n", d="esc\tape", e="con" "cat", f=("paren"))
def f():
    pass
"#;
        let call = match_first(code, "flow").unwrap();
        assert_eq!(call.str_arg("a"), Some("single"));
        assert_eq!(call.str_arg("b"), Some("triple"));
        assert_eq!(call.str_arg("c"), Some("raw\\n"));
        assert_eq!(call.str_arg("d"), Some("esc\tape"));
        assert_eq!(call.str_arg("e"), Some("concat"));
        assert_eq!(call.str_arg("f"), Some("paren"));
    }
}
