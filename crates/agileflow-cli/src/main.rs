//! AgileFlow CLI - install AgileFlow into IDE configuration directories
//!
//! Provides `agileflow install`, `agileflow detect`, `agileflow profiles`
//! and a `transform` preview.

mod commands;

use agileflow_profiles::{ArtifactKind, ProfileLoader, ProfileStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::profiles::ProfileCommands;

#[derive(Parser)]
#[command(name = "agileflow")]
#[command(about = "AgileFlow - multi-IDE installer")]
#[command(version)]
struct Cli {
    /// Directory of `<id>.yaml` profiles replacing the built-in set
    #[arg(long, global = true, env = "AGILEFLOW_PROFILES_DIR", value_name = "DIR")]
    profiles_dir: Option<PathBuf>,

    /// Log pipeline steps (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install AgileFlow into one or more IDEs
    Install {
        /// Target IDE id, repeatable (default: every profile)
        #[arg(long = "ide", value_name = "ID")]
        ides: Vec<String>,

        /// Project root to install into
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Canonical AgileFlow source directory (holds commands/ and agents/)
        #[arg(long, value_name = "DIR")]
        source: PathBuf,

        /// Do not touch guard scripts or hook files
        #[arg(long)]
        skip_damage_control: bool,

        /// Output reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which IDEs are configured in a project
    Detect {
        /// Project root to inspect
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove installed AgileFlow artifacts, keeping hooks
    Cleanup {
        /// Target IDE id
        #[arg(long)]
        ide: String,

        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Remove installed artifacts, owned hook entries and guard scripts
    Uninstall {
        /// Target IDE id
        #[arg(long)]
        ide: String,

        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Inspect capability profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Preview how one canonical file looks for a target IDE
    Transform {
        /// Target IDE id
        #[arg(long)]
        ide: String,

        /// Artifact kind (command, agent, skill)
        #[arg(long, default_value = "command")]
        kind: ArtifactKind,

        /// Canonical markdown file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = match cli.profiles_dir {
        Some(dir) => ProfileLoader::new(ProfileStore::directory(dir)),
        None => ProfileLoader::builtin(),
    };

    let result = match cli.command {
        Commands::Install {
            ides,
            root,
            source,
            skip_damage_control,
            json,
        } => commands::install::run_install(&loader, &ides, &root, &source, skip_damage_control, json),
        Commands::Detect { root, json } => commands::install::run_detect(&loader, &root, json),
        Commands::Cleanup { ide, root } => commands::install::run_cleanup(&loader, &ide, &root),
        Commands::Uninstall { ide, root } => commands::install::run_uninstall(&loader, &ide, &root),
        Commands::Profiles { action } => commands::profiles::run(&loader, action),
        Commands::Transform { ide, kind, file } => {
            commands::transform::run(&loader, &ide, kind, &file)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
