mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::sections::SectionsSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "aif",
    about = "Update ai-framework files in a project without losing team customizations",
    version
)]
struct Cli {
    /// Project root (default: auto-detect from .ai-framework/ or .git/)
    #[arg(long, global = true, env = "AIF_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the category and matching rule for each path
    Classify {
        /// Project-relative paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Parse or assemble framework/team sections
    Sections {
        #[command(subcommand)]
        subcommand: SectionsSubcommand,
    },

    /// Print the SHA-256 checksum of a file
    Checksum { file: PathBuf },

    /// Three-way merge a customized file with new framework content
    Merge {
        /// Checksum of the framework content the file last received
        #[arg(long)]
        checksum: String,

        /// Framework content the file last received, for a line-level merge
        #[arg(long)]
        base: Option<PathBuf>,

        /// Write the merged content back to CURRENT
        #[arg(long)]
        write: bool,

        current: PathBuf,
        incoming: PathBuf,
    },

    /// Bring framework files up to a new template tree
    Update {
        /// Directory holding the new framework templates
        #[arg(long)]
        from: PathBuf,

        /// Version stamped into markers and the manifest
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        target_version: String,

        /// Show the plan without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Classify { paths } => cmd::classify::run(&root, &paths, cli.json),
        Commands::Sections { subcommand } => cmd::sections::run(subcommand, cli.json),
        Commands::Checksum { file } => cmd::checksum::run(&file, cli.json),
        Commands::Merge {
            checksum,
            base,
            write,
            current,
            incoming,
        } => cmd::merge::run(
            &checksum,
            base.as_deref(),
            &current,
            &incoming,
            write,
            cli.json,
        ),
        Commands::Update {
            from,
            target_version,
            dry_run,
        } => cmd::update::run(&root, &from, &target_version, dry_run, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
