//! Error types for treegen.

use std::path::PathBuf;

use crate::python::TransformError;
use crate::settings::SettingsError;
use crate::template::TemplateError;
use crate::walker::WalkError;

/// Top-level error type for treegen operations.
#[derive(Debug, thiserror::Error)]
pub enum TreegenError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
}

impl TreegenError {
    /// Lift walk errors that name a path into the matching top-level variant.
    pub fn from_walk(err: WalkError) -> Self {
        match err {
            WalkError::NotFound { path } => TreegenError::PathNotFound(path),
            WalkError::PermissionDenied { path } => TreegenError::PermissionDenied(path),
            other => TreegenError::Walk(other),
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &TreegenError) -> i32 {
    match error {
        TreegenError::PathNotFound(_) => 3,
        TreegenError::PermissionDenied(_) => 4,
        TreegenError::Io(_) => 1,
        TreegenError::Walk(_) => 2,
        TreegenError::Transform(_) => 5,
        TreegenError::Template(TemplateError::Transform { .. }) => 5,
        TreegenError::Template(_) => 1,
        TreegenError::Settings(_) => 1,
        TreegenError::Pattern { .. } => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = TreegenError::from_walk(WalkError::NotFound {
            path: PathBuf::from("nope"),
        });
        assert!(matches!(missing, TreegenError::PathNotFound(_)));
        assert_eq!(exit_code(&missing), 3);

        let denied = TreegenError::from_walk(WalkError::PermissionDenied {
            path: PathBuf::from("locked"),
        });
        assert_eq!(exit_code(&denied), 4);

        let walk = TreegenError::from_walk(WalkError::NotADirectory {
            path: PathBuf::from("file.py"),
        });
        assert_eq!(exit_code(&walk), 2);

        let syntax = TreegenError::Template(TemplateError::Transform {
            path: PathBuf::from("a.py"),
            source: TransformError::Syntax { line: 1, column: 5 },
        });
        assert_eq!(exit_code(&syntax), 5);
        assert!(syntax.to_string().contains("a.py"));
    }
}
