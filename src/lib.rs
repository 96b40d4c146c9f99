//! Treegen - Build a prompt-ready template from a Python project.
//!
//! Treegen walks a project, lists its Python sources as an indented
//! arborescence, and embeds the files the user selects, optionally without
//! comments and docstrings or with function bodies reduced to `pass`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use treegen::builder::Treegen;
//! use treegen::config::Config;
//! use treegen::selection::{Command, FileFlags};
//!
//! let generated = Treegen::new(Config::for_root("./my-project"))
//!     .description("Command-line tool that syncs two folders")
//!     .apply(Command::SetFlags(
//!         PathBuf::from("sync/core.py"),
//!         FileFlags::included().with_strip_functions(true),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! println!("{} lines, {} tokens", generated.line_count(), generated.tokens);
//! ```
//!
//! # Modules
//!
//! - [`python`] - Comment/docstring stripping and function-body reduction
//! - [`walker`] - Directory traversal with exclusion sets
//! - [`tree`] - File tree representation and arborescence rendering
//! - [`template`] - Per-file transformation and template assembly
//! - [`selection`] - Per-file choices and the commands that change them
//! - [`settings`] - Saved settings file
//! - [`config`] - Run configuration and defaults
//! - [`tokens`] - Token counting for LLM context budgets
//! - [`builder`] - Fluent API tying everything together
//! - [`interactive`] - Terminal prompt flow

pub mod builder;
pub mod config;
pub mod errors;
pub mod interactive;
pub mod python;
pub mod selection;
pub mod settings;
pub mod template;
pub mod tokens;
pub mod tree;
pub mod walker;

// Re-export key types at crate root for convenience
pub use builder::{generate, Generated, Treegen};
pub use config::{Config, ParseErrorPolicy};
pub use errors::TreegenError;
pub use python::{reduce_function_bodies, strip_comments_and_docstrings, TransformError};
pub use selection::{Command, FileFlags, SelectionState};
pub use settings::SettingsError;
pub use template::TemplateError;
pub use tokens::{count_tokens, Encoding};
pub use tree::{FileNode, NodeKind};
pub use walker::WalkError;
