use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::*;

use super::{ImportArgs, TemplateArgs};
use crate::api::UploadFile;
use crate::cli::context::{AppContext, load_config, resolve_schema};
use crate::cli::output::print_banner;
use crate::import::{check_file, write_template};

pub async fn handle_import(args: ImportArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = ctx.table(&args.entity)?;
    if !table.schema().supports_import() {
        bail!("Bulk upload is not available for {}", table.schema().plural);
    }

    // Reference lists are needed for validation; records only for the reload
    table.load_references().await;
    let file = UploadFile::from_path(&args.file)?;

    if args.check {
        let problems = check_file(&file, table.schema(), table.references())?;
        if problems.is_empty() {
            println!("{} {} is ready to upload", "✓".green(), file.name);
            return Ok(());
        }
        for problem in &problems {
            eprintln!("  {} {}", "✗".red(), problem);
        }
        bail!("{} row(s) need fixing before upload", problems.len());
    }

    let result = table.import(&file).await;
    print_banner(table.banner());
    result?;
    Ok(())
}

pub fn handle_template(args: TemplateArgs, backend_url: Option<String>) -> Result<()> {
    let config = load_config(backend_url)?;
    let schema = resolve_schema(&config, &args.entity)?;
    if !schema.supports_import() {
        bail!("Bulk upload is not available for {}", schema.plural);
    }

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(schema.template_file_name()));
    write_template(&schema, &path).context("Failed to download template")?;
    println!("{} Template written to {}", "✓".green(), path.display().to_string().bright_green());
    Ok(())
}
