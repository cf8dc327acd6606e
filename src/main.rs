//! Resrun - declarative resource-graph runner.
//!
//! Loads YAML resource documents, resolves dependency order, and runs
//! resource steps with rule-based skip/check/expect evaluation.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resrun::config::Config;
use resrun::core::{source_env_file, write_env_file};
use resrun::App;

/// Declarative resource-graph runner
#[derive(Parser)]
#[command(name = "resrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Resource document to load (path or URL); repeatable, overrides
    /// the config file
    #[arg(short, long, global = true)]
    file: Vec<String>,

    /// Semicolon-separated values exported as RUNNER_PARAMS1..N
    #[arg(long, global = true)]
    params: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every dependency path of the given resources
    Depends {
        /// Resource ids
        ids: Vec<String>,
    },

    /// List every resource that (transitively) requires the given ones
    Rdepends {
        /// Resource ids
        ids: Vec<String>,
    },

    /// Show the entry of each given resource
    Show {
        /// Resource ids
        ids: Vec<String>,
    },

    /// Fuzzy-search resources across selected fields
    Search {
        /// Search query
        query: Option<String>,

        /// Fields to search (id, name, desc, category); default: all
        keys: Vec<String>,
    },

    /// List the resources belonging to the given categories
    Category {
        /// Category names
        categories: Vec<String>,
    },

    /// Print each requirement chain of the given resources, bottom-up
    Tree {
        /// Resource ids
        ids: Vec<String>,
    },

    /// Print the execution order of the given resources, leaves first
    #[command(name = "tree-list")]
    TreeList {
        /// Resource ids
        ids: Vec<String>,
    },

    /// List every loaded resource
    Index,

    /// Run the given resources after their requirements
    Run {
        /// Resource ids
        ids: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging; VERBOSE mirrors the --verbose flag for scripts.
    let debug = cli.verbose || std::env::var_os("VERBOSE").is_some();
    let filter = if debug { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    if let Err(e) = run(cli) {
        tracing::error!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        println!(
            "Usage: resrun [depends|rdepends|show|search|category|tree|tree-list|index|run] [ids...]"
        );
        return Ok(());
    };

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "resrun", &mut io::stdout());
        return Ok(());
    }

    if let Some(params) = cli.params.as_deref() {
        export_params(params);
    }

    let config = Config::load(&std::env::current_dir()?)?;

    // The env file lives in the workdir and seeds RUNNER_ENV; a temp
    // workdir cleans itself up when main returns.
    let mut _workdir_guard: Option<tempfile::TempDir> = None;
    let workdir: PathBuf = match &config.workdir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => {
            let tmp = tempfile::Builder::new().prefix("resrun_workdir").tempdir()?;
            let path = tmp.path().to_path_buf();
            _workdir_guard = Some(tmp);
            path
        }
    };

    let env_file = workdir.join(".resrun_env");
    write_env_file(&env_file)?;
    source_env_file(&env_file)?;

    let mut app = App::new()?;
    for uri in config.resource_uris(&cli.file) {
        app.load(&uri)?;
    }

    match command {
        Commands::Depends { ids } => with_ids(ids, |ids| app.handle_depends(ids)),
        Commands::Rdepends { ids } => with_ids(ids, |ids| app.handle_rdepends(ids)),
        Commands::Show { ids } => with_ids(ids, |ids| app.handle_show(ids)),
        Commands::Search { query, keys } => match query {
            Some(query) => app.handle_search(&query, &keys),
            None => usage("search <query> [fields...]"),
        },
        Commands::Category { categories } => {
            if categories.is_empty() {
                usage("category [categories...]")
            } else {
                app.handle_category(&categories)
            }
        }
        Commands::Tree { ids } => with_ids(ids, |ids| app.handle_tree(ids)),
        Commands::TreeList { ids } => with_ids(ids, |ids| app.handle_tree_list(ids)),
        Commands::Index => app.handle_index(),
        Commands::Run { ids } => with_ids(ids, |ids| app.handle_run(ids)),
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

/// Run `f` over the ids, or print usage when none were given.
fn with_ids(ids: Vec<String>, f: impl FnOnce(&[String]) -> Result<()>) -> Result<()> {
    if ids.is_empty() {
        usage("<command> [ids...]")
    } else {
        f(&ids)
    }
}

/// Print a usage line to stdout. Missing arguments are not an error.
fn usage(args: &str) -> Result<()> {
    println!("Usage: resrun {args}");
    Ok(())
}

/// Split `--params "a;b;c"` into RUNNER_PARAMS1..N.
fn export_params(params: &str) {
    for (i, value) in params.split(';').enumerate() {
        std::env::set_var(format!("RUNNER_PARAMS{}", i + 1), value);
    }
}
