//! Comment and docstring removal.
//!
//! The output is rebuilt token by token from the syntax tree: row changes
//! become line breaks, the first token of a line gets the line's original
//! indentation, and tokens on the same line keep their column distance from
//! the previously emitted token. Removed tokens simply leave no trace.

use std::collections::HashMap;

use tree_sitter::Node;

use super::{docstring_run, indentation_of, line_ending, parse, TransformError, PLACEHOLDER};

/// What happens to a docstring statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocstringAction {
    /// Drop the statement entirely.
    Drop,
    /// Emit `pass` in its place so the enclosing body stays non-empty.
    Replace,
}

/// Remove comments and docstrings from Python source.
///
/// Non-docstring string literals, including triple-quoted ones, are kept
/// verbatim. Returns [`TransformError::Syntax`] when the input does not parse.
///
/// # Examples
///
/// ```
/// use treegen::python::strip_comments_and_docstrings;
///
/// let out = strip_comments_and_docstrings("x = 1  # one\n").unwrap();
/// assert_eq!(out, "x = 1\n");
/// ```
pub fn strip_comments_and_docstrings(source: &str) -> Result<String, TransformError> {
    let tree = parse(source)?;
    let root = tree.root_node();
    let docstrings = collect_docstrings(root, source);

    let mut emitter = Emitter::new(source);
    emitter.visit(root, &docstrings);
    Ok(emitter.finish())
}

/// Find every docstring statement, keyed by node id.
///
/// A run of leading bare strings counts as one docstring.
fn collect_docstrings(root: Node, source: &str) -> HashMap<usize, DocstringAction> {
    let mut found = HashMap::new();
    mark_run(root, source, false, &mut found);

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if matches!(node.kind(), "function_definition" | "class_definition") {
            if let Some(body) = node.child_by_field_name("body") {
                mark_run(body, source, true, &mut found);
            }
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }

    found
}

/// Decide the action for each statement of a body's docstring run.
///
/// A statement followed by `;` keeps a `pass` in its place. When the run is
/// the whole of a block, its last statement becomes `pass`.
fn mark_run(
    body: Node,
    source: &str,
    is_block: bool,
    found: &mut HashMap<usize, DocstringAction>,
) {
    let run = docstring_run(body, source);
    let Some(last) = run.last().map(|node| node.id()) else {
        return;
    };

    let statements = body
        .named_children(&mut body.walk())
        .filter(|child| child.kind() != "comment")
        .count();
    let empties_block = is_block && statements == run.len();

    for doc in &run {
        let followed_by_semicolon = doc.next_sibling().is_some_and(|n| n.kind() == ";");
        let action = if followed_by_semicolon || (empties_block && doc.id() == last) {
            DocstringAction::Replace
        } else {
            DocstringAction::Drop
        };
        found.insert(doc.id(), action);
    }
}

struct Emitter<'s> {
    source: &'s str,
    newline: &'static str,
    out: String,
    row: usize,
    column: usize,
}

impl<'s> Emitter<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            newline: line_ending(source),
            out: String::with_capacity(source.len()),
            row: 0,
            column: 0,
        }
    }

    fn visit(&mut self, node: Node, docstrings: &HashMap<usize, DocstringAction>) {
        if node.kind() == "comment" {
            return;
        }

        if let Some(action) = docstrings.get(&node.id()) {
            if *action == DocstringAction::Replace {
                self.emit(node, PLACEHOLDER);
            }
            return;
        }

        // Strings are atomic: their inner nodes may span lines.
        if node.child_count() == 0 || node.kind() == "string" {
            if node.start_byte() < node.end_byte() {
                let source = self.source;
                self.emit(node, &source[node.byte_range()]);
            }
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, docstrings);
        }
    }

    /// Place `text` at the start position of `node`.
    fn emit(&mut self, node: Node, text: &str) {
        let start = node.start_position();

        if start.row > self.row {
            for _ in self.row..start.row {
                self.out.push_str(self.newline);
            }
            self.out.push_str(&indentation_of(node, self.source));
        } else if start.column > self.column {
            let gap = start.column - self.column;
            self.out.extend(std::iter::repeat(' ').take(gap));
        }

        self.out.push_str(text);

        let end = node.end_position();
        self.row = end.row;
        self.column = end.column;
    }

    fn finish(mut self) -> String {
        if !self.out.is_empty() && self.source.ends_with('\n') && !self.out.ends_with('\n') {
            self.out.push_str(self.newline);
        }
        self.out
    }
}
