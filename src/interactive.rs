//! Terminal prompt flow.
//!
//! Every answer is turned into a selection [`Command`]; the flow never edits
//! the state directly. Input and output are generic so the whole flow can be
//! driven from memory in tests.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::builder::{generate_from_tree, tree_for, Generated};
use crate::config::{join_name_list, parse_name_list, Config};
use crate::errors::TreegenError;
use crate::selection::{Command, FileFlags, SelectionState};
use crate::settings;

/// Line-based question and answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message` as is.
    pub fn say(&mut self, message: &str) -> io::Result<()> {
        self.output.write_all(message.as_bytes())?;
        self.output.flush()
    }

    /// Ask a free-text question. Returns `None` at end of input.
    pub fn line(&mut self, question: &str) -> io::Result<Option<String>> {
        self.say(question)?;
        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()))
    }

    /// Ask a yes/no question until the answer is `y`, `n` or empty.
    ///
    /// Only `y` means yes; an empty answer or end of input means no.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let Some(answer) = self.line(question)? else {
                return Ok(false);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" | "" => return Ok(false),
                _ => continue,
            }
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

/// Ask for the description and the exclusion sets, starting from `state`.
///
/// An empty answer to an exclusion question keeps the current set.
pub fn ask_base_state<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    state: SelectionState,
) -> io::Result<SelectionState> {
    let description = prompter.line("Enter the description: ")?.unwrap_or_default();
    let mut state = state.apply(Command::SetDescription(description));

    let question = format!(
        "Enter ignored folders (comma-separated, default: {}): ",
        join_name_list(&state.excluded_dirs)
    );
    if let Some(answer) = prompter.line(&question)?.filter(|a| !a.trim().is_empty()) {
        state = state.apply(Command::SetExcludedDirs(parse_name_list(&answer)));
    }

    let question = format!(
        "Enter ignored files (comma-separated, default: {}): ",
        join_name_list(&state.excluded_files)
    );
    if let Some(answer) = prompter.line(&question)?.filter(|a| !a.trim().is_empty()) {
        state = state.apply(Command::SetExcludedFiles(parse_name_list(&answer)));
    }

    Ok(state)
}

/// Ask what to do with one file and record the answer.
pub fn ask_file_flags<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    state: SelectionState,
    path: &Path,
) -> io::Result<SelectionState> {
    let shown = path.display();
    let flags = if prompter.confirm(&format!("Include {shown}? (y/n): "))? {
        let strip_comments =
            prompter.confirm(&format!("Remove comments and docstrings from {shown}? (y/n): "))?;
        let strip_functions =
            prompter.confirm(&format!("Remove function bodies from {shown}? (y/n): "))?;
        FileFlags::included()
            .with_strip_comments(strip_comments)
            .with_strip_functions(strip_functions)
    } else {
        FileFlags::default()
    };

    debug!(path = %shown, ?flags, "file decision");
    Ok(state.apply(Command::SetFlags(path.to_path_buf(), flags)))
}

/// Run the whole prompt flow: settings, per-file questions, template, save.
pub fn run<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<Generated, TreegenError> {
    let state = match settings::load(&config.settings_path)? {
        Some(saved) => {
            if prompter.confirm("Do you want to use the saved settings? (y/n): ")? {
                saved
            } else {
                ask_base_state(prompter, saved)?
            }
        }
        None => ask_base_state(prompter, SelectionState::default())?,
    };

    let tree = tree_for(config, &state)?;
    let reconciled = state.reconcile(&tree.source_files());
    if !reconciled.removed.is_empty() {
        info!(count = reconciled.removed.len(), "dropped files that no longer exist");
    }

    let mut state = reconciled.state;
    for path in &reconciled.added {
        state = ask_file_flags(prompter, state, path)?;
    }

    let generated = generate_from_tree(config, tree, &state)?;
    prompter.say(&format!("\nArborescence:\n{}\n", generated.arborescence))?;

    generated.write(&config.output_path)?;
    prompter.say(&format!(
        "Template generated in {}\n",
        config.output_path.display()
    ))?;

    if prompter.confirm("Do you want to save these settings? (y/n): ")? {
        settings::save(&generated.state, &config.settings_path)?;
    }

    Ok(generated)
}
