//! Settings file: a flat, line-oriented record of a [`SelectionState`].
//!
//! ```text
//! Describe the project<newline>on several lines
//! 2
//! pkg/core.py True True False
//! tools/run.py False False False
//! .git, venv
//! README.md
//! ```
//!
//! The first line is the description with newlines replaced by a marker,
//! then a file count, one line per file (path followed by the include,
//! strip-comments and strip-functions flags), and finally the excluded
//! directory and file names joined with `", "`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{default_excluded_dirs, default_excluded_files, join_name_list};
use crate::selection::{FileFlags, SelectionState};

/// Stands in for a newline inside the single-line description.
pub const NEWLINE_MARKER: &str = "<newline>";

/// Errors while reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Serialize a state to the settings format.
pub fn encode(state: &SelectionState) -> String {
    let mut out = String::with_capacity(128 + state.files.len() * 48);

    let description = state.description.replace("\r\n", "\n").replace('\n', NEWLINE_MARKER);
    out.push_str(&description);
    out.push('\n');
    out.push_str(&state.files.len().to_string());
    out.push('\n');

    for (path, flags) in &state.files {
        out.push_str(&format!(
            "{} {} {} {}\n",
            path.display(),
            flag_text(flags.include),
            flag_text(flags.strip_comments),
            flag_text(flags.strip_functions)
        ));
    }

    out.push_str(&join_name_list(&state.excluded_dirs));
    out.push('\n');
    out.push_str(&join_name_list(&state.excluded_files));
    out.push('\n');
    out
}

/// Parse the settings format.
pub fn decode(text: &str) -> Result<SelectionState, SettingsError> {
    let mut lines = text.lines();

    let description = lines
        .next()
        .ok_or_else(|| malformed(1, "missing description"))?
        .replace(NEWLINE_MARKER, "\n");

    let count_line = lines.next().ok_or_else(|| malformed(2, "missing file count"))?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| malformed(2, format!("invalid file count {count_line:?}")))?;

    let mut files = BTreeMap::new();
    for index in 0..count {
        let line_no = index + 3;
        let line = lines
            .next()
            .ok_or_else(|| malformed(line_no, "missing file entry"))?;
        let (path, flags) = parse_file_line(line).ok_or_else(|| {
            malformed(line_no, format!("expected `<path> <bool> <bool> <bool>`, got {line:?}"))
        })?;
        files.insert(path, flags);
    }

    let excluded_dirs = lines
        .next()
        .map(parse_saved_list)
        .unwrap_or_else(default_excluded_dirs);
    let excluded_files = lines
        .next()
        .map(parse_saved_list)
        .unwrap_or_else(default_excluded_files);

    Ok(SelectionState {
        description,
        excluded_dirs,
        excluded_files,
        files,
    })
}

/// Load saved settings.
///
/// A missing or malformed file means "no saved settings" and yields
/// `Ok(None)`; other I/O failures are errors.
pub fn load(path: &Path) -> Result<Option<SelectionState>, SettingsError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no saved settings");
            return Ok(None);
        }
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
            warn!(path = %path.display(), "settings file is not UTF-8, ignoring it");
            return Ok(None);
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match decode(&text) {
        Ok(state) => {
            debug!(path = %path.display(), files = state.files.len(), "loaded settings");
            Ok(Some(state))
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring corrupt settings file");
            Ok(None)
        }
    }
}

/// Write settings, replacing any previous file.
pub fn save(state: &SelectionState, path: &Path) -> Result<(), SettingsError> {
    std::fs::write(path, encode(state)).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), files = state.files.len(), "saved settings");
    Ok(())
}

fn flag_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

/// The path is everything before the last three fields, so it may contain spaces.
fn parse_file_line(line: &str) -> Option<(PathBuf, FileFlags)> {
    let mut fields = line.trim_end().rsplitn(4, ' ');
    let strip_functions = parse_flag(fields.next()?)?;
    let strip_comments = parse_flag(fields.next()?)?;
    let include = parse_flag(fields.next()?)?;
    let path = fields.next().filter(|p| !p.is_empty())?;

    Some((
        PathBuf::from(path),
        FileFlags {
            include,
            strip_comments,
            strip_functions,
        },
    ))
}

fn parse_saved_list(line: &str) -> BTreeSet<String> {
    line.split(", ")
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn malformed(line: usize, message: impl Into<String>) -> SettingsError {
    SettingsError::Malformed {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Command;
    use tempfile::TempDir;

    fn sample_state() -> SelectionState {
        SelectionState::default()
            .apply(Command::SetDescription("First line\nsecond line\n\nlast".into()))
            .apply(Command::SetFlags(
                PathBuf::from("pkg/a.py"),
                FileFlags::included().with_strip_comments(true),
            ))
            .apply(Command::SetFlags(PathBuf::from("b.py"), FileFlags::default()))
            .apply(Command::SetFlags(
                PathBuf::from("dir with space/c.py"),
                FileFlags::included().with_strip_functions(true),
            ))
    }

    #[test]
    fn test_encode_format() {
        let state = SelectionState {
            description: "Line one\nLine two".into(),
            excluded_dirs: [".git".to_string(), "venv".to_string()].into(),
            excluded_files: BTreeSet::new(),
            files: [(PathBuf::from("a.py"), FileFlags::included())].into(),
        };
        assert_eq!(
            encode(&state),
            "Line one<newline>Line two\n1\na.py True False False\n.git, venv\n\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        let decoded = decode(&encode(&state)).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(
            decoded.flags(Path::new("pkg/a.py")),
            FileFlags {
                include: true,
                strip_comments: true,
                strip_functions: false,
            }
        );
    }

    #[test]
    fn test_round_trip_empty_exclusions() {
        let state = SelectionState {
            excluded_dirs: BTreeSet::new(),
            excluded_files: BTreeSet::new(),
            ..sample_state()
        };
        assert_eq!(decode(&encode(&state)).unwrap(), state);
    }

    #[test]
    fn test_missing_exclusion_lines_use_defaults() {
        let state = decode("desc\n0\n").unwrap();
        assert_eq!(state.excluded_dirs, default_excluded_dirs());
        assert_eq!(state.excluded_files, default_excluded_files());
    }

    #[test]
    fn test_decode_accepts_lowercase_flags() {
        let state = decode("d\n1\nx.py true false true\n\n\n").unwrap();
        let flags = state.flags(Path::new("x.py"));
        assert!(flags.include && !flags.strip_comments && flags.strip_functions);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("d\nmany\n"),
            Err(SettingsError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            decode("d\n1\nx.py maybe False False\n"),
            Err(SettingsError::Malformed { line: 3, .. })
        ));
        assert!(matches!(
            decode("d\n2\nx.py True False False\n"),
            Err(SettingsError::Malformed { line: 4, .. })
        ));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_load_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".treegen.save");
        assert!(load(&path).unwrap().is_none());

        std::fs::write(&path, "desc\nnot-a-number\n").unwrap();
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".treegen.save");
        let state = sample_state();

        save(&state, &path).unwrap();
        assert_eq!(load(&path).unwrap(), Some(state));
    }
}
