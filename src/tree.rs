//! File tree representation and arborescence rendering.
//!
//! Node paths are relative to the walked root, which is also how the
//! selection and the settings file refer to files.

use std::cmp::Ordering;
use std::path::PathBuf;

/// The type of a filesystem node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File { size: u64 },
}

impl NodeKind {
    pub fn is_directory(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A node in the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// File or directory name (not full path).
    pub name: String,
    /// Path relative to the walked root.
    pub path: PathBuf,
    pub kind: NodeKind,
    children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new directory node.
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Create a new file node.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File { size },
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Add a child node. Only meaningful for directories.
    pub fn add_child(&mut self, child: FileNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Sort children recursively: directories first, then by name ignoring case.
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| match (&a.kind, &b.kind) {
            (NodeKind::Directory, NodeKind::File { .. }) => Ordering::Less,
            (NodeKind::File { .. }, NodeKind::Directory) => Ordering::Greater,
            _ => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
        });

        for child in &mut self.children {
            child.sort_children();
        }
    }

    /// Count files in this tree.
    pub fn file_count(&self) -> usize {
        match &self.kind {
            NodeKind::File { .. } => 1,
            NodeKind::Directory => self.children.iter().map(|c| c.file_count()).sum(),
        }
    }

    /// Relative paths of every file, in render order.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::with_capacity(self.file_count());
        self.visit(0, &mut |node: &FileNode, _depth: usize| {
            if node.is_file() {
                files.push(node.path.clone());
            }
        });
        files
    }

    /// Visit every descendant in render order with its depth.
    ///
    /// The node itself is not visited; its children are at depth `depth`.
    pub fn visit<F>(&self, depth: usize, f: &mut F)
    where
        F: FnMut(&FileNode, usize),
    {
        for child in &self.children {
            f(child, depth);
            child.visit(depth + 1, f);
        }
    }
}

/// Indentation unit per depth level.
pub const INDENT: &str = "  ";

/// Render one listing line, including the trailing newline.
pub fn listing_line(name: &str, depth: usize) -> String {
    format!("{}- {}\n", INDENT.repeat(depth), name)
}

/// Render the indented listing of everything under `root`.
///
/// # Examples
///
/// ```
/// use treegen::tree::{FileNode, render_arborescence};
///
/// let mut root = FileNode::directory("project", "");
/// let mut pkg = FileNode::directory("pkg", "pkg");
/// pkg.add_child(FileNode::file("mod.py", "pkg/mod.py", 10));
/// root.add_child(pkg);
///
/// assert_eq!(render_arborescence(&root), "- pkg\n  - mod.py\n");
/// ```
pub fn render_arborescence(root: &FileNode) -> String {
    let mut output = String::with_capacity(1024);
    root.visit(0, &mut |node: &FileNode, depth: usize| {
        output.push_str(&listing_line(&node.name, depth));
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileNode {
        let mut root = FileNode::directory("root", "");
        root.add_child(FileNode::file("z.py", "z.py", 5));
        let mut sub = FileNode::directory("sub", "sub");
        sub.add_child(FileNode::file("b.py", "sub/b.py", 5));
        sub.add_child(FileNode::file("A.py", "sub/A.py", 5));
        root.add_child(sub);
        root.add_child(FileNode::file("a.py", "a.py", 5));
        root.sort_children();
        root
    }

    #[test]
    fn test_sort_children() {
        let root = sample();
        let names: Vec<_> = root.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["sub", "a.py", "z.py"]);
        assert_eq!(root.children()[0].children()[0].name, "A.py");
    }

    #[test]
    fn test_file_count() {
        assert_eq!(sample().file_count(), 4);
    }

    #[test]
    fn test_source_files_in_render_order() {
        let files = sample().source_files();
        assert_eq!(
            files,
            [
                PathBuf::from("sub/A.py"),
                PathBuf::from("sub/b.py"),
                PathBuf::from("a.py"),
                PathBuf::from("z.py"),
            ]
        );
    }

    #[test]
    fn test_render_arborescence() {
        let output = render_arborescence(&sample());
        assert_eq!(output, "- sub\n  - A.py\n  - b.py\n- a.py\n- z.py\n");
    }

    #[test]
    fn test_empty_directory_is_listed() {
        let mut root = FileNode::directory("root", "");
        root.add_child(FileNode::directory("empty", "empty"));
        assert_eq!(render_arborescence(&root), "- empty\n");
    }
}
