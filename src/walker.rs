//! Directory traversal with name-based exclusions.
//!
//! Uses the `ignore` crate's walker with its standard filters switched off:
//! hidden files are visited and `.gitignore` is honored only on request.
//! Exclusion sets are applied with `filter_entry`, so excluded directories
//! are never descended into.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::debug;

use crate::config::is_source_file;
use crate::tree::FileNode;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk failed: {message}")]
    Other { message: String },
}

/// What to leave out of the tree.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Directory names skipped along with everything below them.
    pub excluded_dirs: BTreeSet<String>,
    /// Entry names skipped wherever they appear.
    pub excluded_files: BTreeSet<String>,
    /// Honor .gitignore, .git/info/exclude and the global gitignore.
    pub respect_gitignore: bool,
}

impl TreeOptions {
    pub fn new(excluded_dirs: BTreeSet<String>, excluded_files: BTreeSet<String>) -> Self {
        Self {
            excluded_dirs,
            excluded_files,
            respect_gitignore: false,
        }
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }
}

/// Entry from the directory walk, relative to the root.
#[derive(Debug, Clone)]
struct WalkEntry {
    path: PathBuf,
    name: String,
    depth: usize,
    is_dir: bool,
    size: u64,
}

/// Build the file tree of `root`.
///
/// Directories are kept even when they hold no source files; files are kept
/// only when their name carries a recognized source suffix. Any filesystem
/// error aborts the walk.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use treegen::walker::{build_tree, TreeOptions};
///
/// let tree = build_tree(Path::new("."), &TreeOptions::default()).unwrap();
/// println!("{} source files", tree.file_count());
/// ```
pub fn build_tree(root: &Path, options: &TreeOptions) -> Result<FileNode, WalkError> {
    let metadata = root.metadata().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => WalkError::NotFound {
            path: root.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => WalkError::PermissionDenied {
            path: root.to_path_buf(),
        },
        _ => WalkError::Io {
            path: root.to_path_buf(),
            source: err,
        },
    })?;

    if !metadata.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| root.to_string_lossy().into_owned());

    let mut entries = walk_entries(root, options)?;
    debug!(root = %root.display(), entries = entries.len(), "walked project");

    let mut node_map: HashMap<PathBuf, FileNode> = HashMap::with_capacity(entries.len() + 1);
    node_map.insert(PathBuf::new(), FileNode::directory(name, PathBuf::new()));

    for entry in &entries {
        let node = if entry.is_dir {
            FileNode::directory(&entry.name, &entry.path)
        } else {
            FileNode::file(&entry.name, &entry.path, entry.size)
        };
        node_map.insert(entry.path.clone(), node);
    }

    // Deepest first, so children are attached before their parents move.
    entries.sort_by(|a, b| b.depth.cmp(&a.depth));

    for entry in &entries {
        let parent = entry.path.parent().map(Path::to_path_buf).unwrap_or_default();
        if let Some(child) = node_map.remove(&entry.path) {
            if let Some(parent) = node_map.get_mut(&parent) {
                parent.add_child(child);
            }
        }
    }

    let mut tree = node_map
        .remove(&PathBuf::new())
        .ok_or_else(|| WalkError::Other {
            message: "failed to assemble tree".to_string(),
        })?;

    tree.sort_children();
    Ok(tree)
}

fn walk_entries(root: &Path, options: &TreeOptions) -> Result<Vec<WalkEntry>, WalkError> {
    let excluded_dirs = Arc::new(options.excluded_dirs.clone());
    let excluded_files = Arc::new(options.excluded_files.clone());

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(false)
        .parents(false)
        .ignore(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if excluded_files.contains(name.as_ref()) {
                return false;
            }
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && excluded_dirs.contains(name.as_ref()))
        });

    let mut entries = Vec::new();
    for result in builder.build() {
        let entry = result.map_err(convert_error)?;
        if entry.depth() == 0 {
            continue;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = file_type.is_dir();
        if !is_dir && !(file_type.is_file() && is_source_file(&name)) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();

        let size = if is_dir {
            0
        } else {
            entry.metadata().map(|m| m.len()).map_err(convert_error)?
        };

        entries.push(WalkEntry {
            path: relative,
            name,
            depth: entry.depth(),
            is_dir,
            size,
        });
    }

    Ok(entries)
}

fn convert_error(err: ignore::Error) -> WalkError {
    let path = match &err {
        ignore::Error::WithPath { path, .. } => path.clone(),
        _ => PathBuf::from("<walk>"),
    };
    let message = err.to_string();

    match err.into_io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            WalkError::PermissionDenied { path }
        }
        Some(io) => WalkError::Io { path, source: io },
        None => WalkError::Other { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_excluded_dirs, default_excluded_files};
    use crate::tree::render_arborescence;
    use std::fs;
    use tempfile::TempDir;

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/c.py"), "# c\ny = 2\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not python").unwrap();
        fs::create_dir_all(dir.path().join("venv/lib")).unwrap();
        fs::write(dir.path().join("venv/lib/site.py"), "z = 3\n").unwrap();
        dir
    }

    #[test]
    fn test_build_tree_lists_sources_only() {
        let dir = create_project();
        let tree = build_tree(dir.path(), &TreeOptions::default()).unwrap();

        let listing = render_arborescence(&tree);
        assert_eq!(
            listing,
            "- b\n  - c.py\n- venv\n  - lib\n    - site.py\n- a.py\n"
        );
        assert_eq!(tree.file_count(), 3);
    }

    #[test]
    fn test_excluded_directory_hides_descendants() {
        let dir = create_project();
        let options = TreeOptions::new(default_excluded_dirs(), default_excluded_files());
        let tree = build_tree(dir.path(), &options).unwrap();

        let files = tree.source_files();
        assert!(!files.iter().any(|p| p.starts_with("venv")));
        assert_eq!(render_arborescence(&tree), "- b\n  - c.py\n- a.py\n");
    }

    #[test]
    fn test_excluded_file_names() {
        let dir = create_project();
        let options = TreeOptions::new(BTreeSet::new(), ["c.py".to_string()].into());
        let tree = build_tree(dir.path(), &options).unwrap();

        let files = tree.source_files();
        assert!(files.contains(&PathBuf::from("a.py")));
        assert!(!files.contains(&PathBuf::from("b/c.py")));
    }

    #[test]
    fn test_hidden_files_are_walked() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".hidden.py"), "").unwrap();
        let tree = build_tree(dir.path(), &TreeOptions::default()).unwrap();
        assert_eq!(tree.source_files(), [PathBuf::from(".hidden.py")]);
    }

    #[test]
    fn test_gitignore_only_on_request() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "generated.py\n").unwrap();
        fs::write(dir.path().join("generated.py"), "").unwrap();
        fs::write(dir.path().join("kept.py"), "").unwrap();

        let excluded = TreeOptions::new([".git".to_string()].into(), BTreeSet::new());

        let tree = build_tree(dir.path(), &excluded).unwrap();
        assert_eq!(tree.file_count(), 2);

        let tree = build_tree(dir.path(), &excluded.respect_gitignore(true)).unwrap();
        assert_eq!(tree.source_files(), [PathBuf::from("kept.py")]);
    }

    #[test]
    fn test_missing_root() {
        let err = build_tree(Path::new("/nonexistent/treegen/root"), &TreeOptions::default())
            .unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.py");
        fs::write(&file, "").unwrap();
        let err = build_tree(&file, &TreeOptions::default()).unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory { .. }));
    }
}
