//! scribe: code review, commit messages, and READMEs from a hosted model.
//!
//! Model output streams to stdout; diagnostics and errors go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use scribe::exit_codes;
use scribe::io::config::{ScribeConfig, default_config_path, load_config};
use scribe::io::provider::OpenAiCompatProvider;
use scribe::logging;
use scribe::tasks::{TaskSettings, run_commit_message, run_readme, run_review};

#[derive(Debug, Parser)]
#[command(
    name = "scribe",
    version,
    about = "Review changes, draft commit messages, and write READMEs with an LLM"
)]
struct Cli {
    /// Config file (default: `<dir>/.scribe.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the configured step ceiling.
    #[arg(long, global = true)]
    max_steps: Option<u32>,

    /// Debug-level diagnostics on stderr (ignored when `RUST_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `review .` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Review working-tree changes file by file.
    Review {
        #[arg(default_value = ".")]
        target_dir: PathBuf,
    },
    /// Draft a Conventional Commit message from staged changes.
    Commit {
        #[arg(default_value = ".")]
        root_dir: PathBuf,
    },
    /// Generate README.md from a sample of the repository files.
    Readme {
        #[arg(default_value = ".")]
        root_dir: PathBuf,
        /// Replace an existing README.md.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        overwrite: bool,
    },
}

impl Command {
    fn dir(&self) -> &Path {
        match self {
            Command::Review { target_dir } => target_dir,
            Command::Commit { root_dir } | Command::Readme { root_dir, .. } => root_dir,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("{:#}", err);
    }
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FAILED);
    }
    std::process::exit(exit_codes::OK);
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.clone().unwrap_or(Command::Review {
        target_dir: PathBuf::from("."),
    });
    let cfg = resolve_config(&cli, command.dir())?;
    let settings = TaskSettings::from_config(&cfg);
    let provider = OpenAiCompatProvider::from_config(&cfg).context("create model provider")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Review { target_dir } => {
            run_review(&provider, &settings, &target_dir, &mut out)?;
        }
        Command::Commit { root_dir } => {
            run_commit_message(&provider, &settings, &root_dir, &mut out)?;
        }
        Command::Readme {
            root_dir,
            overwrite,
        } => {
            run_readme(&provider, &settings, &root_dir, overwrite, &mut out)?;
        }
    }
    out.flush().context("flush stdout")?;
    Ok(())
}

/// Load the config file and apply command-line overrides.
fn resolve_config(cli: &Cli, dir: &Path) -> Result<ScribeConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(dir));
    let mut cfg = load_config(&path)?;
    if let Some(model) = &cli.model {
        cfg.model = model.clone();
    }
    if let Some(max_steps) = cli.max_steps {
        cfg.max_steps = max_steps;
    }
    cfg.validate().context("invalid command-line override")?;
    debug!(model = %cfg.model, max_steps = cfg.max_steps, config = %path.display(), "config resolved");
    Ok(cfg)
}
