//! Spreadsheet commands: import, template

pub mod handler;

use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub entity: String,

    /// Excel file (.xlsx or .xls)
    pub file: PathBuf,

    /// Validate every row and report problems without uploading
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    pub entity: String,

    /// Where to write the template (default: <entity>_upload_template.xlsx)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
