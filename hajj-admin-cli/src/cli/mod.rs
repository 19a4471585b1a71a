//! Command-line surface

pub mod commands;
pub mod context;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};

use commands::auth::AuthCommands;
use commands::config::ConfigCommands;
use commands::import::{ImportArgs, TemplateArgs};
use commands::records::{AddArgs, BulkStatusArgs, DeleteArgs, EditArgs, ListArgs};

#[derive(Debug, Parser)]
#[command(
    name = "hajj-admin-cli",
    version,
    about = "Administrative console for the Hajj/Umrah logistics API"
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the backend URL for this invocation
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the entity types this console manages
    Entities,
    /// Log in, log out, or show the stored credential
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show or change the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// List records, optionally filtered by a search text
    List(ListArgs),
    /// Create a record from field values
    Add(AddArgs),
    /// Change fields of one record
    Edit(EditArgs),
    /// Delete records by id or by search
    Delete(DeleteArgs),
    /// Bulk-create records from an Excel file
    Import(ImportArgs),
    /// Write a blank upload template
    Template(TemplateArgs),
    /// Set the status of several records (notifications)
    BulkStatus(BulkStatusArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let backend_url = cli.backend_url;
    match cli.command {
        Commands::Entities => commands::entities::handle_entities_command(),
        Commands::Auth { command } => {
            commands::auth::handle_auth_command(command, backend_url).await
        }
        Commands::Config { command } => commands::config::handle_config_command(command, backend_url),
        Commands::List(args) => commands::records::handler::handle_list(args, backend_url).await,
        Commands::Add(args) => commands::records::handler::handle_add(args, backend_url).await,
        Commands::Edit(args) => commands::records::handler::handle_edit(args, backend_url).await,
        Commands::Delete(args) => commands::records::handler::handle_delete(args, backend_url).await,
        Commands::Import(args) => commands::import::handler::handle_import(args, backend_url).await,
        Commands::Template(args) => commands::import::handler::handle_template(args, backend_url),
        Commands::BulkStatus(args) => {
            commands::records::handler::handle_bulk_status(args, backend_url).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delete_with_matching() {
        let cli = Cli::try_parse_from([
            "hajj-admin-cli",
            "-vv",
            "delete",
            "clinic",
            "--matching",
            "mina",
            "--yes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.entity, "clinic");
        assert_eq!(args.matching.as_deref(), Some("mina"));
        assert!(args.ids.is_empty());
        assert!(args.yes);
    }

    #[test]
    fn test_flag_alone_is_enough_for_edit() {
        let cli = Cli::try_parse_from([
            "hajj-admin-cli",
            "edit",
            "country",
            "c1",
            "--flag",
            "flags/eg.png",
        ])
        .unwrap();
        let Commands::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        assert!(args.set.is_empty());
        assert_eq!(args.flag, Some(std::path::PathBuf::from("flags/eg.png")));

        assert!(Cli::try_parse_from(["hajj-admin-cli", "edit", "country", "c1"]).is_err());
    }

    #[test]
    fn test_parse_set_pairs() {
        let cli = Cli::try_parse_from([
            "hajj-admin-cli",
            "add",
            "branch",
            "--set",
            "name=Branch 9",
            "--set",
            "ref=Mina",
        ])
        .unwrap();
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(
            args.set,
            vec![
                ("name".to_string(), "Branch 9".to_string()),
                ("ref".to_string(), "Mina".to_string())
            ]
        );
    }
}
