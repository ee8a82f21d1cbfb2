//! Profile CLI commands
//!
//! Handles: agileflow profiles list/show/matrix

use agileflow_profiles::output::markdown::capability_matrix;
use agileflow_profiles::ProfileLoader;
use anyhow::Context;
use clap::Subcommand;

/// Profile commands
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List known profiles
    List,
    /// Print one profile as loaded
    Show {
        /// Profile id
        id: String,
        /// Output as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Print the capability matrix across every valid profile
    Matrix,
}

pub fn run(loader: &ProfileLoader, action: ProfileCommands) -> anyhow::Result<()> {
    match action {
        ProfileCommands::List => {
            let ids = loader.list_available().context("Failed to list profiles")?;
            if ids.is_empty() {
                println!("No profiles found.");
                return Ok(());
            }

            println!("Profiles:");
            for id in ids {
                match loader.load(&id) {
                    Ok(profile) => println!(
                        "  {id} - {} ({})",
                        profile.display_name(),
                        profile.config_dir()
                    ),
                    Err(e) => println!("  {id} - invalid: {e}"),
                }
            }
        }
        ProfileCommands::Show { id, json } => {
            let profile = loader.load(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*profile)?);
            } else {
                print!("{}", serde_yaml::to_string(&*profile)?);
            }
        }
        ProfileCommands::Matrix => {
            print!("{}", capability_matrix(&loader.load_all()));
        }
    }
    Ok(())
}
