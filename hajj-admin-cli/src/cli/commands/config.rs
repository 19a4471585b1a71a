use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::cli::context::load_config;
use crate::config::Config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Store the backend URL (and optionally the admin URL) in the config file
    SetUrl {
        url: String,

        #[arg(long, value_name = "URL")]
        admin: Option<String>,
    },
}

pub fn handle_config_command(command: ConfigCommands, backend_url: Option<String>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = load_config(backend_url)?;
            println!("{} {}", "Config file:".bold(), Config::config_path()?.display());
            println!("{} {}", "Backend:    ".bold(), config.backend_url());
            println!("{} {}", "Admin:      ".bold(), config.admin_url());
            println!("{} {}", "Database:   ".bold(), config.database_path()?.display());
            if let Some(categories) = &config.enums.ambulance_categories {
                println!("{} {}", "Ambulance categories:".bold(), categories.join(", "));
            }
            Ok(())
        }
        ConfigCommands::SetUrl { url, admin } => {
            // Environment overrides must not leak into the saved file
            let path = Config::config_path()?;
            let mut config = if path.exists() {
                Config::load_from(&path)?
            } else {
                Config::default()
            };
            config.backend_url = url.trim_end_matches('/').to_string();
            if admin.is_some() {
                config.admin_url = admin;
            }
            config.save()?;
            println!("{} Backend set to {}", "✓".green(), config.backend_url().bright_green());
            Ok(())
        }
    }
}
