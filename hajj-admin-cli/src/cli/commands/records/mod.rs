//! Record commands: list, add, edit, delete, bulk-status

pub mod handler;

use std::path::PathBuf;

use clap::Args;

use crate::cli::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Entity type (see `entities`)
    pub entity: String,

    /// Only show records whose searchable fields contain this text
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub entity: String,

    /// Field value as name=value (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_key_val, required_unless_present = "flag")]
    pub set: Vec<(String, String)>,

    /// Upload this image as the country flag and store its URL
    #[arg(long, value_name = "IMAGE")]
    pub flag: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub entity: String,

    /// Id of the record to change
    pub id: String,

    /// Field value as name=value (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_key_val, required_unless_present = "flag")]
    pub set: Vec<(String, String)>,

    /// Upload this image as the country flag and store its URL
    #[arg(long, value_name = "IMAGE")]
    pub flag: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub entity: String,

    /// Ids of the records to delete
    pub ids: Vec<String>,

    /// Delete every record matching this search text
    #[arg(long, conflicts_with = "ids")]
    pub matching: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct BulkStatusArgs {
    pub entity: String,

    /// New status (e.g. read, archived)
    pub status: String,

    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Parse `name=value`; the value may itself contain `=`
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
