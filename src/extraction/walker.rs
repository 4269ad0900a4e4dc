//! Scope-aware walk over one Python module.
//!
//! The walker visits every function definition in the tree (module level,
//! class bodies, nested inside other functions or compound statements) and
//! turns the ones carrying the flow marker into [`FlowRecord`]s.
//!
//! Scope state is a single slot holding the nearest enclosing class name.
//! It travels with each pending node on the traversal stack, so entering a
//! class body shadows it for that subtree only and siblings after the
//! class see the outer value again. Function bodies inherit the slot
//! unchanged: a helper nested inside a method still reports that class.

use tree_sitter::Node;

use crate::extraction::literal::{clean_docstring, string_value};
use crate::extraction::marker::MarkerMatcher;
use crate::types::{display_name, FlowKind, FlowMap, FlowRecord, MarkerCall};

/// Traversal context threaded through the walk.
#[derive(Debug, Clone, Copy, Default)]
struct Scope<'s> {
    enclosing_class: Option<&'s str>,
}

pub struct FlowWalker<'a> {
    matcher: &'a MarkerMatcher,
    source: &'a [u8],
}

impl<'a> FlowWalker<'a> {
    pub fn new(matcher: &'a MarkerMatcher, source: &'a [u8]) -> Self {
        Self { matcher, source }
    }

    /// Walk a parsed module and collect its flows in source order.
    ///
    /// Provenance fields (`source_file`, `module_name`) are left empty for
    /// the caller to fill in.
    pub fn walk(&self, root: Node<'_>) -> FlowMap {
        let mut flows = FlowMap::new();
        let mut stack: Vec<(Node<'_>, Scope<'a>)> = vec![(root, Scope::default())];

        while let Some((node, scope)) = stack.pop() {
            match node.kind() {
                "class_definition" => {
                    let inner = Scope {
                        enclosing_class: self.field_text(node, "name").or(scope.enclosing_class),
                    };
                    if let Some(body) = node.child_by_field_name("body") {
                        stack.push((body, inner));
                    }
                }
                "decorated_definition" => {
                    let Some(definition) = node.child_by_field_name("definition") else {
                        continue;
                    };
                    if definition.kind() == "function_definition" {
                        let decorators = decorators_of(node);
                        self.visit_function(definition, &decorators, scope, &mut flows);
                        push_body(&mut stack, definition, scope);
                    } else {
                        stack.push((definition, scope));
                    }
                }
                "function_definition" => {
                    self.visit_function(node, &[], scope, &mut flows);
                    push_body(&mut stack, node, scope);
                }
                _ => push_children(&mut stack, node, scope),
            }
        }

        flows
    }

    /// Record one function definition if any of its decorators is the marker.
    fn visit_function(
        &self,
        function: Node<'_>,
        decorators: &[Node<'_>],
        scope: Scope<'a>,
        flows: &mut FlowMap,
    ) {
        // First recognized marker wins; later ones are ignored
        let Some(call) = decorators
            .iter()
            .find_map(|decorator| self.matcher.match_decorator(*decorator, self.source))
        else {
            return;
        };
        let Some(identifier) = self.field_text(function, "name") else {
            return;
        };

        let record = self.build_record(function, identifier, &call, scope);
        tracing::debug!(
            flow = %record.name,
            function = identifier,
            kind = %record.kind,
            line = record.line,
            "found flow"
        );
        flows.insert(record.id.clone(), record);
    }

    fn build_record(
        &self,
        function: Node<'_>,
        identifier: &str,
        call: &MarkerCall,
        scope: Scope<'a>,
    ) -> FlowRecord {
        let original_name = call.str_arg("name").unwrap_or(identifier).to_string();

        let description = call
            .str_arg("description")
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .or_else(|| self.docstring(function))
            .unwrap_or_default();

        let (kind, enclosing_class) = match scope.enclosing_class {
            Some(class) => (FlowKind::Method, Some(class.to_string())),
            None => (FlowKind::Function, None),
        };

        FlowRecord {
            id: format!("{}_{}", original_name, function.start_byte()),
            name: display_name(&original_name),
            original_name,
            description,
            kind,
            enclosing_class,
            source_file: String::new(),
            module_name: String::new(),
            line: function.start_position().row as u32 + 1,
            is_async: is_async(function),
        }
    }

    /// Docstring of a function: its first statement, if that is a bare string.
    fn docstring(&self, function: Node<'_>) -> Option<String> {
        let body = function.child_by_field_name("body")?;
        let first = first_named_child(body)?;
        if first.kind() != "expression_statement" {
            return None;
        }

        let mut cursor = first.walk();
        let mut parts = first
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment");
        let (Some(expression), None) = (parts.next(), parts.next()) else {
            return None;
        };

        string_value(expression, self.source).map(|doc| clean_docstring(&doc))
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field)?.utf8_text(self.source).ok()
    }
}

fn decorators_of<'t>(decorated: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = decorated.walk();
    decorated
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .collect()
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

fn is_async(function: Node<'_>) -> bool {
    function.child(0).is_some_and(|first| first.kind() == "async")
}

fn push_body<'t, 's>(stack: &mut Vec<(Node<'t>, Scope<'s>)>, function: Node<'t>, scope: Scope<'s>) {
    if let Some(body) = function.child_by_field_name("body") {
        stack.push((body, scope));
    }
}

/// Queue children so that the leftmost one is popped first.
fn push_children<'t, 's>(stack: &mut Vec<(Node<'t>, Scope<'s>)>, node: Node<'t>, scope: Scope<'s>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    stack.extend(children.into_iter().rev().map(|child| (child, scope)));
}
