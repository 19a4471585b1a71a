//! Record command handlers driving a `ResourceTable`

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::Confirm;
use log::warn;

use super::{AddArgs, BulkStatusArgs, DeleteArgs, EditArgs, ListArgs};
use crate::api::UploadFile;
use crate::cli::context::AppContext;
use crate::cli::output::{format_records, print_banner};
use crate::table::ResourceTable;

/// Build and mount the table; a failed load is fatal for every command
async fn mounted_table(ctx: &AppContext, entity: &str) -> Result<ResourceTable> {
    let mut table = ctx.table(entity)?;
    table
        .mount()
        .await
        .with_context(|| format!("Failed to load {}", table.schema().plural))?;
    Ok(table)
}

/// Upload a flag image first so the record is written with its URL
async fn upload_flag(table: &mut ResourceTable, id: Option<&str>, path: &Path) -> Result<()> {
    if table.schema().file_upload("flag").is_none() {
        bail!("{} records have no flag", table.schema().label);
    }
    let file = UploadFile::from_path(path)?;
    let uploaded = table.upload_field_file(id, "flag", &file).await;
    print_banner(table.banner());
    table.dismiss_banner();
    uploaded?;
    Ok(())
}

pub async fn handle_list(args: ListArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = mounted_table(&ctx, &args.entity).await?;

    if let Some(search) = &args.search {
        table.set_search(search);
    }
    let visible = table.visible();
    let output = format_records(&table, &visible, args.format)?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    if matches!(args.format, crate::cli::output::OutputFormat::Table) {
        let mut summary =
            format!("{} of {} {}", visible.len(), table.records().len(), table.schema().plural);
        if !table.search_text().trim().is_empty() {
            summary.push_str(&format!(" matching '{}'", table.search_text().trim()));
        }
        println!("{}", summary.dimmed());
    }
    Ok(())
}

pub async fn handle_add(args: AddArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = mounted_table(&ctx, &args.entity).await?;

    for (field, value) in &args.set {
        table.set_draft_input(field, value)?;
    }
    if let Some(path) = &args.flag {
        upload_flag(&mut table, None, path).await?;
    }

    let created = table.add().await;
    print_banner(table.banner());
    if !created? {
        warn!("Server did not answer 201; the table was not reloaded");
        println!(
            "{}",
            "The server accepted the request but did not confirm creation.".yellow()
        );
    }
    Ok(())
}

pub async fn handle_edit(args: EditArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = mounted_table(&ctx, &args.entity).await?;

    table.begin_edit(&args.id)?;
    for (field, value) in &args.set {
        if let Err(e) = table.edit_field_input(&args.id, field, value) {
            table.cancel_edit(&args.id)?;
            return Err(e.into());
        }
    }
    if let Some(path) = &args.flag {
        if let Err(e) = upload_flag(&mut table, Some(&args.id), path).await {
            table.cancel_edit(&args.id)?;
            return Err(e);
        }
    }

    let saved = table.save_edit(&args.id).await;
    print_banner(table.banner());
    saved?;
    Ok(())
}

pub async fn handle_delete(args: DeleteArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = mounted_table(&ctx, &args.entity).await?;

    let ids: Vec<String> = match &args.matching {
        Some(search) => {
            table.set_search(search);
            table.select_all(true);
            table.selected().iter().cloned().collect()
        }
        None => args.ids.clone(),
    };
    if ids.is_empty() {
        bail!("Nothing to delete: give record ids or --matching <text>");
    }

    for id in &ids {
        match table.record(id) {
            Some(record) => {
                let label = table
                    .schema()
                    .search_fields
                    .first()
                    .map(|f| table.display_value(record, f))
                    .unwrap_or_default();
                println!("  {} {}", id.dimmed(), label);
            }
            None => println!("  {} {}", id.dimmed(), "(not loaded)".yellow()),
        }
    }

    let count = table.request_delete(ids);
    let plural = table.schema().plural;
    let confirmed = args.yes
        || Confirm::new()
            .with_prompt(format!("Delete {} {}?", count, plural))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

    if !confirmed {
        table.cancel_delete_request();
        println!("Cancelled");
        return Ok(());
    }

    let result = table.confirm_delete().await;
    print_banner(table.banner());
    let report = result?;
    for (id, err) in report.failed() {
        eprintln!("  {} {}: {}", "✗".red(), id, err.user_message());
    }
    Ok(())
}

pub async fn handle_bulk_status(args: BulkStatusArgs, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    let mut table = mounted_table(&ctx, &args.entity).await?;

    for id in &args.ids {
        if table.record(id).is_none() {
            bail!("No {} with id '{}'", table.schema().label, id);
        }
        if !table.selected().contains(id) {
            table.toggle_select(id);
        }
    }

    let result = table.bulk_update_status(&args.status).await;
    print_banner(table.banner());
    result?;
    Ok(())
}
