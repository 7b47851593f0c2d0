use clap::Parser;
use filesort::cli::{OrganizeCommand, Settings, run_cli_with_settings};
use filesort::organizer::CollisionPolicy;
use filesort::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sort the files of a directory into per-category subdirectories by extension.
#[derive(Parser, Debug)]
#[command(name = "filesort", version, about, long_about = None)]
struct Cli {
    /// Directory whose files should be sorted
    #[arg(required_unless_present = "list")]
    dir: Option<PathBuf>,

    /// Category table (JSON); written with the defaults if missing
    #[arg(short, long, value_name = "FILE")]
    categories: Option<PathBuf>,

    /// Filter rules (TOML)
    #[arg(long, value_name = "FILE")]
    filters: Option<PathBuf>,

    /// Enable only these categories
    #[arg(short, long, value_name = "NAME", value_delimiter = ',')]
    only: Vec<String>,

    /// Disable these categories
    #[arg(short = 'x', long, value_name = "NAME", value_delimiter = ',')]
    skip: Vec<String>,

    /// What to do when a file with the same name already exists
    #[arg(long, value_enum, default_value_t = CollisionPolicy::Rename)]
    on_conflict: CollisionPolicy,

    /// Show what would be moved without touching anything
    #[arg(short = 'n', long, conflicts_with = "undo")]
    dry_run: bool,

    /// Reverse the last run in DIR
    #[arg(long)]
    undo: bool,

    /// Print the category table and exit
    #[arg(long, conflicts_with_all = ["undo", "dry_run"])]
    list: bool,

    /// List every file and enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "filesort=debug" } else { "filesort=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = if cli.list {
        OrganizeCommand::ListCategories
    } else if cli.undo {
        OrganizeCommand::Undo
    } else {
        OrganizeCommand::Organize {
            dry_run: cli.dry_run,
        }
    };

    let settings = Settings {
        categories_path: cli.categories,
        filters_path: cli.filters,
        only: cli.only,
        skip: cli.skip,
        on_conflict: cli.on_conflict,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let dir = cli.dir.unwrap_or_else(|| PathBuf::from("."));
    match run_cli_with_settings(command, &dir, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
