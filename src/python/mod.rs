//! Python source transformations built on tree-sitter.
//!
//! Two transformations are exposed:
//!
//! - [`strip_comments_and_docstrings`] removes comments and docstrings while
//!   rebuilding the layout of every remaining token.
//! - [`reduce_function_bodies`] replaces each function body with its
//!   docstring (if any) followed by `pass`.
//!
//! Both parse the input first and fail with [`TransformError::Syntax`] when it
//! does not parse; neither returns partial output.

mod reduce;
mod strip;

use std::cell::RefCell;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

pub use reduce::reduce_function_bodies;
pub use strip::strip_comments_and_docstrings;

/// Statement substituted for removed bodies.
pub const PLACEHOLDER: &str = "pass";

// One parser per thread; grammar loading is not free.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// Errors raised by the Python transformations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("failed to initialize the Python parser")]
    ParserInit,

    #[error("parser returned no syntax tree")]
    NoTree,

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("transformed source no longer parses (line {line}, column {column})")]
    InvalidOutput { line: usize, column: usize },
}

fn init_python_parser() -> Result<Parser, TransformError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| TransformError::ParserInit)?;
    Ok(parser)
}

/// Execute a function with the cached Python parser.
pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, TransformError>
where
    F: FnOnce(&mut Parser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init_python_parser()?);
        }
        let parser = slot.as_mut().ok_or(TransformError::ParserInit)?;
        Ok(f(parser))
    })
}

/// Parse `source`, rejecting trees that contain error or missing nodes.
pub(crate) fn parse(source: &str) -> Result<Tree, TransformError> {
    let tree = with_python_parser(|parser| parser.parse(source, None))?
        .ok_or(TransformError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root)
            .map(|node| {
                let point = node.start_position();
                (point.row + 1, point.column + 1)
            })
            .unwrap_or((1, 1));
        return Err(TransformError::Syntax { line, column });
    }

    Ok(tree)
}

/// Check that `source` is syntactically valid Python.
pub fn check_syntax(source: &str) -> Result<(), TransformError> {
    parse(source).map(|_| ())
}

/// Depth-first search for the first error or missing node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Return the docstring statement of a module or block, if it has one.
///
/// Comments before the first statement are skipped, as they are for the
/// Python compiler.
pub(crate) fn docstring_statement<'t>(body: Node<'t>, source: &str) -> Option<Node<'t>> {
    let first = body
        .named_children(&mut body.walk())
        .find(|child| child.kind() != "comment")?;

    (first.kind() == "expression_statement" && is_docstring_literal(first, source))
        .then_some(first)
}

/// Return the leading run of bare string statements of a module or block.
///
/// The first one is the docstring; the rest would become the docstring once
/// it is gone, so stripping treats the whole run as one.
pub(crate) fn docstring_run<'t>(body: Node<'t>, source: &str) -> Vec<Node<'t>> {
    body.named_children(&mut body.walk())
        .filter(|child| child.kind() != "comment")
        .take_while(|child| {
            child.kind() == "expression_statement" && is_docstring_literal(*child, source)
        })
        .collect()
}

/// Whether an expression statement consists of a plain string literal only.
fn is_docstring_literal(statement: Node, source: &str) -> bool {
    let mut cursor = statement.walk();
    let mut named = statement
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment");

    let (Some(expr), None) = (named.next(), named.next()) else {
        return false;
    };

    match expr.kind() {
        "string" => is_plain_string(expr, source),
        "concatenated_string" => expr
            .named_children(&mut expr.walk())
            .filter(|part| part.kind() == "string")
            .all(|part| is_plain_string(part, source)),
        _ => false,
    }
}

/// f-strings and bytes literals are never docstrings.
fn is_plain_string(node: Node, source: &str) -> bool {
    let text = &source[node.byte_range()];
    let prefix = text.find(|c: char| c == '\'' || c == '"').map_or("", |idx| &text[..idx]);
    !prefix
        .chars()
        .any(|c| matches!(c, 'f' | 'F' | 'b' | 'B'))
}

/// Line terminator used by `source`.
pub(crate) fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Leading whitespace of the line on which `node` starts.
///
/// Falls back to spaces when something other than whitespace precedes the
/// node on its line.
pub(crate) fn indentation_of(node: Node, source: &str) -> String {
    let column = node.start_position().column;
    let start = node.start_byte();
    let prefix = &source[start - column..start];
    if prefix.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')) {
        prefix.to_string()
    } else {
        " ".repeat(column)
    }
}
