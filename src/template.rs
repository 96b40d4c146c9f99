//! Template assembly.
//!
//! A template is the description, a fixed header sentence, and the
//! arborescence in which every included file's line is followed by a fenced
//! block with its (possibly reduced) content.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ParseErrorPolicy;
use crate::python::{reduce_function_bodies, strip_comments_and_docstrings, TransformError};
use crate::selection::FileFlags;
use crate::tree::{listing_line, FileNode};

/// Sentence between the description and the arborescence.
pub const HEADER: &str =
    "Here is the arborescence with most files content (may be reduced or skeleton only):";

/// Info string of the fenced blocks.
pub const FENCE_LANGUAGE: &str = "py";

/// Errors while preparing or writing a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot transform {path}: {source}")]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("failed to write template to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn blank_run() -> &'static Regex {
    static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
    // A line break, captured, followed by three or more blank lines.
    BLANK_RUN.get_or_init(|| {
        Regex::new(r"(\r?\n)(?:[ \t]*\r?\n){3,}").unwrap_or_else(|_| unreachable!("static regex"))
    })
}

/// Collapse runs of three or more blank lines into a single blank line.
///
/// The collapsed run keeps the line terminator that opened it, so CRLF
/// sources stay CRLF.
///
/// # Examples
///
/// ```
/// use treegen::template::collapse_blank_lines;
///
/// assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
/// assert_eq!(collapse_blank_lines("a\n\n\nb"), "a\n\n\nb");
/// ```
pub fn collapse_blank_lines(text: &str) -> Cow<'_, str> {
    blank_run().replace_all(text, "${1}${1}")
}

/// Apply the transformations requested by `flags` to one file's content.
///
/// Body reduction runs before comment stripping. When a transformation
/// fails, `policy` decides between returning the error and keeping the
/// content as it was before that step.
pub fn transform_source(
    content: &str,
    flags: FileFlags,
    policy: ParseErrorPolicy,
) -> Result<String, TransformError> {
    let mut text = content.to_string();

    if flags.strip_functions {
        text = apply_step(text, policy, reduce_function_bodies)?;
    }
    if flags.strip_comments {
        text = apply_step(text, policy, strip_comments_and_docstrings)?;
    }

    Ok(collapse_blank_lines(&text).into_owned())
}

fn apply_step(
    text: String,
    policy: ParseErrorPolicy,
    step: fn(&str) -> Result<String, TransformError>,
) -> Result<String, TransformError> {
    match step(&text) {
        Ok(out) => Ok(out),
        Err(err) => match policy {
            ParseErrorPolicy::Fail => Err(err),
            ParseErrorPolicy::KeepOriginal => {
                warn!(error = %err, "keeping content untransformed");
                Ok(text)
            }
        },
    }
}

/// Read and transform every included file that appears in `tree`.
///
/// Returns the block contents keyed by relative path. Included files that
/// are not part of the tree (excluded or deleted since they were selected)
/// are skipped with a warning.
pub fn prepare_blocks(
    root: &Path,
    tree: &FileNode,
    files: &BTreeMap<PathBuf, FileFlags>,
    policy: ParseErrorPolicy,
) -> Result<HashMap<PathBuf, String>, TemplateError> {
    let listed: HashSet<PathBuf> = tree.source_files().into_iter().collect();
    let mut blocks = HashMap::new();

    for (path, flags) in files.iter().filter(|(_, flags)| flags.include) {
        if !listed.contains(path) {
            warn!(path = %path.display(), "selected file is not in the tree, skipping");
            continue;
        }

        let full = root.join(path);
        let content = std::fs::read_to_string(&full).map_err(|source| TemplateError::Read {
            path: full.clone(),
            source,
        })?;

        let block = transform_source(&content, *flags, policy).map_err(|source| {
            TemplateError::Transform {
                path: path.clone(),
                source,
            }
        })?;

        debug!(
            path = %path.display(),
            strip_comments = flags.strip_comments,
            strip_functions = flags.strip_functions,
            bytes = block.len(),
            "prepared block"
        );
        blocks.insert(path.clone(), block);
    }

    Ok(blocks)
}

/// Fenced block for one file.
fn fenced(content: &str) -> String {
    let body = content.trim_end_matches(|c: char| c == '\r' || c == '\n');
    format!("```{FENCE_LANGUAGE}\n{body}\n```\n")
}

/// Assemble the final document.
///
/// `blocks` holds the content of every included file, keyed by the same
/// relative path as the tree nodes; files without a block are listed bare.
pub fn assemble_template(
    description: &str,
    tree: &FileNode,
    blocks: &HashMap<PathBuf, String>,
) -> String {
    let mut arborescence = String::with_capacity(4096);
    tree.visit(0, &mut |node: &FileNode, depth: usize| {
        arborescence.push_str(&listing_line(&node.name, depth));
        if node.is_file() {
            if let Some(content) = blocks.get(&node.path) {
                arborescence.push_str(&fenced(content));
            }
        }
    });

    format!("{description}\n\n{HEADER}\n{arborescence}\n")
}

/// Write the template, replacing any previous file.
pub fn write_template(path: &Path, template: &str) -> Result<(), TemplateError> {
    std::fs::write(path, template).map_err(|source| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn two_file_tree() -> FileNode {
        let mut root = FileNode::directory("project", "");
        let mut b = FileNode::directory("b", "b");
        b.add_child(FileNode::file("c.py", "b/c.py", 0));
        root.add_child(b);
        root.add_child(FileNode::file("a.py", "a.py", 0));
        root.add_child(FileNode::file("c.py", "c.py", 0));
        root
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\nb\n"), "a\nb\n");
    }

    #[test]
    fn test_collapse_blank_lines_keeps_crlf() {
        assert_eq!(
            collapse_blank_lines("a\r\n\r\n\r\n\r\n\r\nb\r\n"),
            "a\r\n\r\nb\r\n"
        );
        assert_eq!(collapse_blank_lines("a\r\n\r\n\r\nb\r\n"), "a\r\n\r\n\r\nb\r\n");
        let collapsed = collapse_blank_lines("x = 1\r\n \r\n\r\n\t\r\ny = 2\r\n");
        assert_eq!(collapsed, "x = 1\r\n\r\ny = 2\r\n");
        assert!(!collapsed.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_transform_source_applies_flags() {
        let source = "def f():\n    \"\"\"Doc.\"\"\"\n    return 1  # one\n";

        let plain = transform_source(source, FileFlags::included(), ParseErrorPolicy::Fail).unwrap();
        assert_eq!(plain, source);

        let reduced = transform_source(
            source,
            FileFlags::included().with_strip_functions(true),
            ParseErrorPolicy::Fail,
        )
        .unwrap();
        assert_eq!(reduced, "def f():\n    \"\"\"Doc.\"\"\"\n    pass\n");

        let both = transform_source(
            source,
            FileFlags::included()
                .with_strip_functions(true)
                .with_strip_comments(true),
            ParseErrorPolicy::Fail,
        )
        .unwrap();
        assert_eq!(both, "def f():\n\n    pass\n");
    }

    #[test]
    fn test_parse_error_policy_is_uniform() {
        let broken = "def broken(:\n";
        for flags in [
            FileFlags::included().with_strip_comments(true),
            FileFlags::included().with_strip_functions(true),
        ] {
            assert!(transform_source(broken, flags, ParseErrorPolicy::Fail).is_err());
            assert_eq!(
                transform_source(broken, flags, ParseErrorPolicy::KeepOriginal).unwrap(),
                broken
            );
        }
    }

    #[test]
    fn test_assemble_template_attaches_blocks_to_exact_nodes() {
        let tree = two_file_tree();
        let blocks: HashMap<PathBuf, String> =
            [(PathBuf::from("b/c.py"), "x = 1\n".to_string())].into();

        let template = assemble_template("My project", &tree, &blocks);
        assert_eq!(
            template,
            format!(
                "My project\n\n{HEADER}\n- b\n  - c.py\n```py\nx = 1\n```\n- a.py\n- c.py\n\n"
            )
        );
    }

    #[test]
    fn test_prepare_blocks_reads_and_transforms() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b/c.py"), "# note\ny = 2  # two\n").unwrap();

        let files: BTreeMap<PathBuf, FileFlags> = [
            (PathBuf::from("a.py"), FileFlags::included()),
            (
                PathBuf::from("b/c.py"),
                FileFlags::included().with_strip_comments(true),
            ),
            (PathBuf::from("c.py"), FileFlags::default()),
            (PathBuf::from("missing.py"), FileFlags::included()),
        ]
        .into();

        let blocks = prepare_blocks(dir.path(), &two_file_tree(), &files, ParseErrorPolicy::Fail)
            .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[Path::new("a.py")], "x = 1\n");
        assert_eq!(blocks[Path::new("b/c.py")], "\ny = 2\n");
    }

    #[test]
    fn test_prepare_blocks_surfaces_read_errors() {
        let dir = TempDir::new().unwrap();
        let files: BTreeMap<PathBuf, FileFlags> =
            [(PathBuf::from("a.py"), FileFlags::included())].into();

        let err = prepare_blocks(dir.path(), &two_file_tree(), &files, ParseErrorPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }

    #[test]
    fn test_prepare_blocks_names_unparseable_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def broken(:\n").unwrap();
        let files: BTreeMap<PathBuf, FileFlags> = [(
            PathBuf::from("a.py"),
            FileFlags::included().with_strip_comments(true),
        )]
        .into();

        let err = prepare_blocks(dir.path(), &two_file_tree(), &files, ParseErrorPolicy::Fail)
            .unwrap_err();
        assert!(err.to_string().contains("a.py"));
    }
}
