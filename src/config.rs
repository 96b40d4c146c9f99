//! Run configuration and built-in defaults.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::tokens::Encoding;

/// Suffixes of files listed in the arborescence and offered for selection.
pub const SOURCE_SUFFIXES: &[&str] = &[
    ".py", ".pyw", ".pyx", ".pyi", ".pxd", ".pxi", ".pyp", ".pyt", ".py3", ".pyde", ".pyst",
];

/// Directory names excluded unless the user says otherwise.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    "node_modules",
];

/// File names excluded unless the user says otherwise.
pub const DEFAULT_EXCLUDED_FILES: &[&str] =
    &[".gitignore", "README.md", "LICENSE", "requirements.txt"];

pub const SETTINGS_FILE_NAME: &str = ".treegen.save";
pub const OUTPUT_FILE_NAME: &str = "template.txt";

/// Whether `name` ends with one of the recognized source suffixes.
pub fn is_source_file(name: &str) -> bool {
    SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

pub fn default_excluded_dirs() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()
}

pub fn default_excluded_files() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect()
}

/// Parse a user-entered list such as `".git, venv,build"`.
///
/// Items are trimmed and empty items dropped, so an empty string yields an
/// empty set.
pub fn parse_name_list(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a name set the way the settings file and prompts show it.
pub fn join_name_list(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// What to do when a selected file cannot be parsed.
///
/// The same policy applies to comment stripping and body reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    /// Abort template generation with a diagnostic naming the file.
    #[default]
    Fail,
    /// Log a warning and include the file untransformed.
    KeepOriginal,
}

/// Options threaded through every operation of a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root; selection paths are relative to it.
    pub root: PathBuf,
    /// Where the template is written.
    pub output_path: PathBuf,
    /// Where settings are loaded from and saved to.
    pub settings_path: PathBuf,
    pub parse_errors: ParseErrorPolicy,
    /// Honor .gitignore files while walking.
    pub respect_gitignore: bool,
    /// Encoding used when reporting the template's token count.
    pub encoding: Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_root(".")
    }
}

impl Config {
    /// Configuration rooted at `root`, with output and settings inside it.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            output_path: root.join(OUTPUT_FILE_NAME),
            settings_path: root.join(SETTINGS_FILE_NAME),
            root,
            parse_errors: ParseErrorPolicy::default(),
            respect_gitignore: false,
            encoding: Encoding::default(),
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    pub fn with_parse_errors(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_errors = policy;
        self
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}
