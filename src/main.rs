//! # tfa CLI
//!
//! ## Usage
//!
//! ```bash
//! tfa [--config ./tfa.toml] [-q|-V|--json] [command]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tfa` / `tfa scan [DIR]` | Substitute or fetch every managed file under DIR (default: cwd) |
//! | `tfa export <GROUP> <ARTIFACT> <VERSION>` | Download an artifact by coordinates |
//! | `tfa list` | Show exports recorded in `.state/` |
//! | `tfa path <GROUP> <ARTIFACT> <VERSION>` | Print the repository path for coordinates |
//! | `tfa completions <SHELL>` | Print shell completions |

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use tfa::config::{self, Config};
use tfa::export::run_export;
use tfa::list::list_exports;
use tfa::models::CoordinateSet;
use tfa::report::StatusMode;
use tfa::repository::resolve_cache_path;
use tfa::scan::run_scan;

/// tfa: keep managed files in sync with a local artifact repository.
#[derive(Parser)]
#[command(
    name = "tfa",
    about = "Coordinate-addressed artifact fetcher",
    long_about = "Scans a directory for files whose first line carries @tfamanaged, \
    resolves their group/artefact/version header against a local repository, and \
    substitutes the cached copy or fetches it from a remote service.",
    disable_version_flag = true
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "./tfa.toml")]
    config: PathBuf,

    /// Output as little as possible; overrides --verbose.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output.
    #[arg(short = 'V', long, global = true)]
    verbose: bool,

    /// Emit one JSON object per status line.
    #[arg(long, global = true)]
    json: bool,

    /// Display the version, then exit.
    #[arg(short = 'v', long = "version")]
    print_version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a directory and substitute or fetch every managed file.
    ///
    /// Directories whose name starts with `.` are not entered.
    Scan {
        /// Directory to scan. Defaults to the current directory.
        dir: Option<PathBuf>,
    },

    /// Export an artifact by explicit coordinates.
    ///
    /// Queries `<base-url>/files/<group>/<artifact>/<version>/`, writes a
    /// sidecar descriptor to `.state/`, and downloads the artifact into the
    /// working directory unless it is already there.
    Export {
        group: String,
        artifact: String,
        version: String,

        /// Metadata endpoint; overrides `remote.base_url`.
        #[arg(long)]
        base_url: Option<String>,

        /// Working directory. Defaults to the current directory.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List exports recorded in the working directory's state folder.
    List {
        /// Working directory. Defaults to the current directory.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print the repository path for a coordinate triple.
    Path {
        group: String,
        artifact: String,
        version: String,

        /// File extension, with or without the leading dot.
        #[arg(long, default_value = "")]
        ext: String,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_version {
        println!("tfa version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Some(Commands::Completions { shell }) = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "tfa", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let mode = StatusMode::from_flags(cli.quiet, cli.verbose, cli.json);

    if mode.is_verbose() {
        println!("Start at {}\n", chrono::Local::now().to_rfc3339());
        print_options(&cli, &cfg);
    }

    let result = dispatch(cli.command, &cfg, mode);

    if mode.is_verbose() {
        println!("\nFinished at {}", chrono::Local::now().to_rfc3339());
    }

    match result? {
        Outcome::Done => Ok(()),
        Outcome::PartialFailure(failed) => {
            eprintln!("{} file(s) failed", failed);
            std::process::exit(1);
        }
    }
}

enum Outcome {
    Done,
    PartialFailure(usize),
}

fn dispatch(command: Option<Commands>, cfg: &Config, mode: StatusMode) -> anyhow::Result<Outcome> {
    match command.unwrap_or(Commands::Scan { dir: None }) {
        Commands::Scan { dir } => {
            let root = working_dir(dir)?;
            let summary = run_scan(cfg, &root, mode)?;
            if summary.failed > 0 {
                return Ok(Outcome::PartialFailure(summary.failed));
            }
        }
        Commands::Export {
            group,
            artifact,
            version,
            base_url,
            dir,
        } => {
            let working = working_dir(dir)?;
            let coords = CoordinateSet::new(group, artifact, version);
            run_export(cfg, &coords, base_url.as_deref(), &working, mode)
                .with_context(|| format!("Export of {} failed", coords))?;
        }
        Commands::List { dir } => {
            let working = working_dir(dir)?;
            list_exports(cfg, &working, mode)?;
        }
        Commands::Path {
            group,
            artifact,
            version,
            ext,
        } => {
            let coords = CoordinateSet::new(group, artifact, version);
            let path = resolve_cache_path(&coords, &cfg.repository.root, &dotted(&ext))?;
            println!("{}", path.file().display());
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }
    Ok(Outcome::Done)
}

fn working_dir(dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match dir {
        Some(d) => Ok(d),
        None => std::env::current_dir().context("Cannot determine current directory"),
    }
}

fn dotted(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

fn print_options(cli: &Cli, cfg: &Config) {
    println!("Options:");
    println!("config = {}", cli.config.display());
    println!("quiet = {}", cli.quiet);
    println!("verbose = {}", cli.verbose);
    println!("repository = {}", cfg.repository.root.display());
    println!(
        "base_url = {}",
        cfg.remote.base_url.as_deref().unwrap_or("(none)")
    );
    println!("insecure_tls = {}", cfg.remote.insecure_tls);
}
