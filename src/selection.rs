//! Selection model: which files go into the template and how.
//!
//! Every user action is a [`Command`] applied with [`SelectionState::apply`],
//! a pure transition that returns the next state. Prompt and batch front-ends
//! only issue commands; they never poke at the maps directly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::{default_excluded_dirs, default_excluded_files};
use crate::walker::TreeOptions;

/// Per-file choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileFlags {
    /// Emit the file's content under its listing line.
    pub include: bool,
    /// Remove comments and docstrings.
    pub strip_comments: bool,
    /// Reduce function bodies to docstring plus `pass`.
    pub strip_functions: bool,
}

impl FileFlags {
    pub fn included() -> Self {
        Self {
            include: true,
            ..Default::default()
        }
    }

    pub fn with_strip_comments(mut self, strip: bool) -> Self {
        self.strip_comments = strip;
        self
    }

    pub fn with_strip_functions(mut self, strip: bool) -> Self {
        self.strip_functions = strip;
        self
    }
}

/// A user action on the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleInclude(PathBuf),
    ToggleStripComments(PathBuf),
    ToggleStripFunctions(PathBuf),
    SetFlags(PathBuf, FileFlags),
    SetDescription(String),
    SetExcludedDirs(BTreeSet<String>),
    SetExcludedFiles(BTreeSet<String>),
    /// Back to defaults: empty description, default exclusions, nothing selected.
    Reset,
}

/// Everything the user decides, and everything the settings file stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub description: String,
    pub excluded_dirs: BTreeSet<String>,
    pub excluded_files: BTreeSet<String>,
    /// Flags keyed by path relative to the project root.
    pub files: BTreeMap<PathBuf, FileFlags>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            description: String::new(),
            excluded_dirs: default_excluded_dirs(),
            excluded_files: default_excluded_files(),
            files: BTreeMap::new(),
        }
    }
}

/// Result of reconciling a state with a freshly discovered file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// State holding exactly the discovered files.
    pub state: SelectionState,
    /// Discovered files with no prior decision, in discovery order.
    pub added: Vec<PathBuf>,
    /// Files that had flags but were not discovered.
    pub removed: Vec<PathBuf>,
}

impl SelectionState {
    /// Apply one command and return the resulting state.
    pub fn apply(mut self, command: Command) -> Self {
        match command {
            Command::ToggleInclude(path) => {
                let flags = self.files.entry(path).or_default();
                flags.include = !flags.include;
            }
            Command::ToggleStripComments(path) => {
                let flags = self.files.entry(path).or_default();
                flags.strip_comments = !flags.strip_comments;
            }
            Command::ToggleStripFunctions(path) => {
                let flags = self.files.entry(path).or_default();
                flags.strip_functions = !flags.strip_functions;
            }
            Command::SetFlags(path, flags) => {
                self.files.insert(path, flags);
            }
            Command::SetDescription(description) => self.description = description,
            Command::SetExcludedDirs(dirs) => self.excluded_dirs = dirs,
            Command::SetExcludedFiles(files) => self.excluded_files = files,
            Command::Reset => return Self::default(),
        }
        self
    }

    /// Flags for `path`; files without a decision are not included.
    pub fn flags(&self, path: &Path) -> FileFlags {
        self.files.get(path).copied().unwrap_or_default()
    }

    /// Included files, in path order.
    pub fn included(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|(_, flags)| flags.include)
            .map(|(path, _)| path.as_path())
    }

    /// Tree options matching this state's exclusion sets.
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions::new(self.excluded_dirs.clone(), self.excluded_files.clone())
    }

    /// Merge this snapshot with the files discovered on disk.
    ///
    /// Flags of files still present are kept, new files get default flags
    /// and are reported in `added`, and vanished files are dropped and
    /// reported in `removed`.
    pub fn reconcile(&self, discovered: &[PathBuf]) -> Reconciled {
        let mut files = BTreeMap::new();
        let mut added = Vec::new();

        for path in discovered {
            match self.files.get(path) {
                Some(flags) => {
                    files.insert(path.clone(), *flags);
                }
                None => {
                    files.insert(path.clone(), FileFlags::default());
                    added.push(path.clone());
                }
            }
        }

        let removed = self
            .files
            .keys()
            .filter(|path| !files.contains_key(*path))
            .cloned()
            .collect();

        Reconciled {
            state: SelectionState {
                description: self.description.clone(),
                excluded_dirs: self.excluded_dirs.clone(),
                excluded_files: self.excluded_files.clone(),
                files,
            },
            added,
            removed,
        }
    }
}
