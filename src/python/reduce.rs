//! Function body reduction.
//!
//! Bodies are replaced by splicing source text, so everything outside a
//! function body comes through byte for byte.

use std::ops::Range;

use smallvec::SmallVec;
use tree_sitter::Node;

use super::{docstring_statement, indentation_of, line_ending, parse, TransformError, PLACEHOLDER};

/// A single text replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    replacement: String,
}

/// Replace every function and method body with its docstring plus `pass`.
///
/// Nested definitions disappear along with the body that contains them.
/// Classes and module-level statements are untouched. The result is
/// re-parsed before it is returned.
///
/// # Examples
///
/// ```
/// use treegen::python::reduce_function_bodies;
///
/// let out = reduce_function_bodies("def f():\n    return 1\n").unwrap();
/// assert_eq!(out, "def f():\n    pass\n");
/// ```
pub fn reduce_function_bodies(source: &str) -> Result<String, TransformError> {
    let tree = parse(source)?;

    let mut edits: SmallVec<[Edit; 8]> = SmallVec::new();
    collect_edits(tree.root_node(), source, &mut edits);

    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);

    parse(&out).map_err(|err| match err {
        TransformError::Syntax { line, column } => TransformError::InvalidOutput { line, column },
        other => other,
    })?;

    Ok(out)
}

/// Walk in document order; do not descend into rewritten functions.
fn collect_edits(node: Node, source: &str, edits: &mut SmallVec<[Edit; 8]>) {
    if node.kind() == "function_definition" {
        if let Some(edit) = body_edit(node, source) {
            edits.push(edit);
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_edits(child, source, edits);
    }
}

fn body_edit(function: Node, source: &str) -> Option<Edit> {
    let body = function.child_by_field_name("body")?;

    let text = &source[body.byte_range()];
    let start = body.start_byte();
    let end = start + text.trim_end().len();

    let inline = function
        .children(&mut function.walk())
        .find(|child| child.kind() == ":")
        .is_some_and(|colon| colon.end_position().row == body.start_position().row);

    let docstring = docstring_statement(body, source).map(|doc| &source[doc.byte_range()]);

    let replacement = match docstring {
        Some(doc) if inline => format!("{doc}; {PLACEHOLDER}"),
        Some(doc) => format!(
            "{doc}{}{}{PLACEHOLDER}",
            line_ending(source),
            indentation_of(body, source)
        ),
        None => PLACEHOLDER.to_string(),
    };

    Some(Edit {
        range: start..end,
        replacement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::check_syntax;

    #[test]
    fn test_keeps_docstring_and_adds_placeholder() {
        let source = r#"def greet(name):
    """Say hello."""
    message = f"Hello {name}"
    return message


async def fetch(url):
    return await get(url)
"#;
        let expected = r#"def greet(name):
    """Say hello."""
    pass


async def fetch(url):
    pass
"#;
        assert_eq!(reduce_function_bodies(source).unwrap(), expected);
    }

    #[test]
    fn test_methods_are_reduced_class_is_kept() {
        let source = "class Greeter:\n    \"\"\"Greets.\"\"\"\n\n    def hi(self):\n        print(\"hi\")\n";
        let expected = "class Greeter:\n    \"\"\"Greets.\"\"\"\n\n    def hi(self):\n        pass\n";
        assert_eq!(reduce_function_bodies(source).unwrap(), expected);
    }

    #[test]
    fn test_inline_body() {
        assert_eq!(
            reduce_function_bodies("def f(): return 1\n").unwrap(),
            "def f(): pass\n"
        );
        assert_eq!(
            reduce_function_bodies("def g(): 'doc'; return 2\n").unwrap(),
            "def g(): 'doc'; pass\n"
        );
    }

    #[test]
    fn test_nested_functions_disappear() {
        let source = "def outer():\n    def inner():\n        return 1\n    return inner\n";
        assert_eq!(
            reduce_function_bodies(source).unwrap(),
            "def outer():\n    pass\n"
        );
    }

    #[test]
    fn test_decorated_and_conditional_functions() {
        let source = "import functools\n\n@functools.cache\ndef cached(x):\n    return x * 2\n\nif True:\n    def maybe():\n        return None\n";
        let out = reduce_function_bodies(source).unwrap();
        assert_eq!(
            out,
            "import functools\n\n@functools.cache\ndef cached(x):\n    pass\n\nif True:\n    def maybe():\n        pass\n"
        );
    }

    #[test]
    fn test_module_without_functions_is_unchanged() {
        let source = "X = 1\nclass C:\n    y = 2\n";
        assert_eq!(reduce_function_bodies(source).unwrap(), source);
    }

    #[test]
    fn test_multiline_docstring_is_kept_verbatim() {
        let source = "def f():\n    \"\"\"First line.\n\n    More detail.\n    \"\"\"\n    x = 1\n    return x\n";
        let out = reduce_function_bodies(source).unwrap();
        assert_eq!(
            out,
            "def f():\n    \"\"\"First line.\n\n    More detail.\n    \"\"\"\n    pass\n"
        );
        assert_eq!(out.matches("pass").count(), 1);
    }

    #[test]
    fn test_output_parses() {
        let source = r#"
import asyncio


class Worker:
    def __init__(self, queue):
        self.queue = queue

    async def run(self):
        """Drain the queue."""
        while True:
            item = await self.queue.get()
            if item is None:
                break


def main():
    try:
        asyncio.run(Worker(asyncio.Queue()).run())
    finally:
        print("done")
"#;
        let out = reduce_function_bodies(source).unwrap();
        assert!(check_syntax(&out).is_ok());
        assert!(!out.contains("while True"));
        assert!(out.contains("\"\"\"Drain the queue.\"\"\"\n        pass"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let err = reduce_function_bodies("def (:\n").unwrap_err();
        assert!(matches!(err, TransformError::Syntax { .. }));
    }
}
