//! Treegen CLI - Build a prompt-ready template from a Python project.

use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use glob::Pattern;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use treegen::builder::{generate_from_tree, tree_for, Generated};
use treegen::config::{parse_name_list, Config, ParseErrorPolicy};
use treegen::errors::{exit_code, TreegenError};
use treegen::interactive::{self, Prompter};
use treegen::selection::{Command, SelectionState};
use treegen::settings;
use treegen::tokens::Encoding;
use treegen::tree::render_arborescence;

#[derive(Parser)]
#[command(name = "treegen")]
#[command(about = "Build a prompt-ready template from a Python project's tree and sources")]
#[command(version)]
struct Cli {
    /// Working directory to scan (defaults to the current one)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Run without prompts, from saved settings and the flags below
    #[arg(long, visible_alias = "cli")]
    no_interactive: bool,

    /// Description placed at the top of the template
    #[arg(long)]
    description: Option<String>,

    /// Directory names to skip, comma-separated
    #[arg(long)]
    exclude_dirs: Option<String>,

    /// File names to skip, comma-separated
    #[arg(long)]
    exclude_files: Option<String>,

    /// Include files matching a glob (relative to the project root)
    #[arg(long)]
    select: Vec<String>,

    /// Remove comments and docstrings from files matching a glob
    #[arg(long)]
    strip_comments: Vec<String>,

    /// Reduce function bodies in files matching a glob
    #[arg(long)]
    strip_functions: Vec<String>,

    /// Where to write the template
    #[arg(long, default_value = "template.txt")]
    output: PathBuf,

    /// Save the settings after a non-interactive run
    #[arg(long)]
    save: bool,

    /// Include files that fail to parse as they are instead of aborting
    #[arg(long)]
    keep_unparseable: bool,

    /// Honor .gitignore files while walking
    #[arg(long)]
    respect_gitignore: bool,

    /// Print the arborescence and exit
    #[arg(long)]
    tree: bool,

    /// Token encoding for the summary
    #[arg(long, default_value = "cl100k")]
    encoding: EncodingArg,

    /// Print the summary and errors as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, ValueEnum)]
enum EncodingArg {
    Cl100k,
    O200k,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Cl100k => Encoding::Cl100kBase,
            EncodingArg::O200k => Encoding::O200kBase,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "treegen", &mut io::stdout());
        return;
    }

    setup_tracing(cli.verbose);
    let json_output = cli.json;

    if let Err(e) = run(cli) {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn setup_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("treegen=warn"),
        1 => EnvFilter::new("treegen=info"),
        2 => EnvFilter::new("treegen=debug"),
        _ => EnvFilter::new("treegen=trace"),
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .try_init();
}

fn run(cli: Cli) -> Result<(), TreegenError> {
    if let Some(dir) = &cli.dir {
        std::env::set_current_dir(dir).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TreegenError::PathNotFound(dir.clone()),
            io::ErrorKind::PermissionDenied => TreegenError::PermissionDenied(dir.clone()),
            _ => TreegenError::Io(err),
        })?;
    }

    let policy = if cli.keep_unparseable {
        ParseErrorPolicy::KeepOriginal
    } else {
        ParseErrorPolicy::Fail
    };
    let config = Config::for_root(".")
        .with_output(cli.output.clone())
        .with_parse_errors(policy)
        .with_gitignore(cli.respect_gitignore)
        .with_encoding(cli.encoding.clone().into());

    if cli.tree {
        let state = base_state(&cli, &config)?;
        let tree = tree_for(&config, &state)?;
        print!("{}", render_arborescence(&tree));
        return Ok(());
    }

    let generated = if cli.no_interactive {
        run_batch(&cli, &config)?
    } else {
        let stdin = io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), io::stdout());
        interactive::run(&config, &mut prompter)?
    };

    report(&generated, &config, cli.json)
}

// --- Batch mode ---

/// Saved settings (or defaults) overlaid with the description and exclusion flags.
fn base_state(cli: &Cli, config: &Config) -> Result<SelectionState, TreegenError> {
    let mut state = settings::load(&config.settings_path)?.unwrap_or_default();

    if let Some(description) = &cli.description {
        state = state.apply(Command::SetDescription(description.clone()));
    }
    if let Some(dirs) = &cli.exclude_dirs {
        state = state.apply(Command::SetExcludedDirs(parse_name_list(dirs)));
    }
    if let Some(files) = &cli.exclude_files {
        state = state.apply(Command::SetExcludedFiles(parse_name_list(files)));
    }

    Ok(state)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, TreegenError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| TreegenError::Pattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

fn any_match(patterns: &[Pattern], path: &Path) -> bool {
    let relative = path.to_string_lossy();
    patterns.iter().any(|p| p.matches(&relative))
}

fn run_batch(cli: &Cli, config: &Config) -> Result<Generated, TreegenError> {
    let select = compile_patterns(&cli.select)?;
    let strip_comments = compile_patterns(&cli.strip_comments)?;
    let strip_functions = compile_patterns(&cli.strip_functions)?;

    let state = base_state(cli, config)?;
    let tree = tree_for(config, &state)?;
    let files = tree.source_files();

    let mut state = state.reconcile(&files).state;
    for path in &files {
        let current = state.flags(path);
        let mut flags = current;
        if any_match(&select, path) {
            flags.include = true;
        }
        if any_match(&strip_comments, path) {
            flags.strip_comments = true;
        }
        if any_match(&strip_functions, path) {
            flags.strip_functions = true;
        }
        if flags != current {
            state = state.apply(Command::SetFlags(path.clone(), flags));
        }
    }

    let generated = generate_from_tree(config, tree, &state)?;
    generated.write(&config.output_path)?;

    if cli.save {
        settings::save(&generated.state, &config.settings_path)?;
    }

    Ok(generated)
}

// --- Summary ---

fn report(generated: &Generated, config: &Config, json: bool) -> Result<(), TreegenError> {
    if json {
        #[derive(Serialize)]
        struct Summary {
            output: String,
            files: usize,
            included: Vec<String>,
            lines: usize,
            tokens: usize,
            encoding: String,
        }

        let summary = Summary {
            output: config.output_path.display().to_string(),
            files: generated.tree.file_count(),
            included: generated
                .included
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            lines: generated.line_count(),
            tokens: generated.tokens,
            encoding: generated.encoding.to_string(),
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| TreegenError::Io(io::Error::other(e.to_string())))?;
        println!("{json}");
    } else {
        println!(
            "{}: {} of {} files, {} lines, {} tokens ({})",
            config.output_path.display(),
            generated.included.len(),
            generated.tree.file_count(),
            generated.line_count(),
            generated.tokens,
            generated.encoding
        );
    }

    Ok(())
}
