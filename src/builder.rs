//! Fluent builder API for treegen.
//!
//! Provides both function composition and builder-style APIs for turning a
//! project and a selection into a template.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::errors::TreegenError;
use crate::selection::{Command, SelectionState};
use crate::template::{assemble_template, prepare_blocks, write_template};
use crate::tokens::{count_tokens, Encoding};
use crate::tree::{render_arborescence, FileNode};
use crate::walker::{build_tree, TreeOptions};

/// Builder for generating a template from a project.
///
/// # Examples
///
/// ```no_run
/// use treegen::builder::Treegen;
/// use treegen::config::Config;
///
/// let generated = Treegen::new(Config::for_root("./project"))
///     .description("A small web service")
///     .build()
///     .unwrap();
///
/// println!("{} tokens", generated.tokens);
/// ```
pub struct Treegen {
    config: Config,
    state: SelectionState,
}

impl Treegen {
    /// Create a new builder with an empty selection and default exclusions.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: SelectionState::default(),
        }
    }

    /// Start from an existing selection, for example loaded settings.
    pub fn state(mut self, state: SelectionState) -> Self {
        self.state = state;
        self
    }

    /// Apply a selection command.
    pub fn apply(mut self, command: Command) -> Self {
        self.state = self.state.apply(command);
        self
    }

    /// Set the description placed at the top of the template.
    pub fn description(self, description: impl Into<String>) -> Self {
        self.apply(Command::SetDescription(description.into()))
    }

    /// Build the tree only.
    pub fn tree(&self) -> Result<FileNode, TreegenError> {
        tree_for(&self.config, &self.state)
    }

    /// Walk the project and generate the template.
    pub fn build(self) -> Result<Generated, TreegenError> {
        generate(&self.config, &self.state)
    }
}

/// A generated template and what went into it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub tree: FileNode,
    /// Selection reconciled with the files found on disk.
    pub state: SelectionState,
    /// Bare listing, without file contents.
    pub arborescence: String,
    pub template: String,
    /// Files whose content is in the template, in path order.
    pub included: Vec<PathBuf>,
    pub tokens: usize,
    pub encoding: Encoding,
}

impl Generated {
    /// Number of lines in the template.
    pub fn line_count(&self) -> usize {
        bytecount::count(self.template.as_bytes(), b'\n')
    }

    /// Write the template to `path`, replacing any previous file.
    pub fn write(&self, path: &Path) -> Result<(), TreegenError> {
        write_template(path, &self.template)?;
        info!(
            path = %path.display(),
            lines = self.line_count(),
            tokens = self.tokens,
            "template written"
        );
        Ok(())
    }
}

/// Tree options for a run: the state's exclusion sets plus the config's gitignore switch.
pub fn tree_options(config: &Config, state: &SelectionState) -> TreeOptions {
    state
        .tree_options()
        .respect_gitignore(config.respect_gitignore)
}

/// Build the tree of the configured root.
pub fn tree_for(config: &Config, state: &SelectionState) -> Result<FileNode, TreegenError> {
    build_tree(&config.root, &tree_options(config, state)).map_err(TreegenError::from_walk)
}

/// Walk the project and generate the template.
pub fn generate(config: &Config, state: &SelectionState) -> Result<Generated, TreegenError> {
    let tree = tree_for(config, state)?;
    generate_from_tree(config, tree, state)
}

/// Generate the template for an already built tree.
pub fn generate_from_tree(
    config: &Config,
    tree: FileNode,
    state: &SelectionState,
) -> Result<Generated, TreegenError> {
    let reconciled = state.reconcile(&tree.source_files());
    let state = reconciled.state;

    let blocks = prepare_blocks(&config.root, &tree, &state.files, config.parse_errors)?;
    let template = assemble_template(&state.description, &tree, &blocks);

    let mut included: Vec<PathBuf> = blocks.into_keys().collect();
    included.sort();

    let tokens = count_tokens(&template, config.encoding);
    info!(
        files = tree.file_count(),
        included = included.len(),
        tokens,
        "generated template"
    );

    Ok(Generated {
        arborescence: render_arborescence(&tree),
        tree,
        state,
        template,
        included,
        tokens,
        encoding: config.encoding,
    })
}
