//! Rendering of records for the terminal, JSON and CSV

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::Record;
use crate::table::{Banner, ResourceTable};

const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns
    Table,
    /// Pretty-printed JSON array
    Json,
    Csv,
}

/// Column names and display rows for a set of records
fn rows(table: &ResourceTable, records: &[&Record]) -> (Vec<String>, Vec<Vec<String>>) {
    let schema = table.schema();
    let mut headers = vec!["id".to_string()];
    headers.extend(schema.fields.iter().map(|f| f.title.to_string()));

    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![record.id.clone()];
            row.extend(schema.fields.iter().map(|f| table.display_value(record, f.name)));
            row
        })
        .collect();
    (headers, rows)
}

pub fn format_records(table: &ResourceTable, records: &[&Record], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let (headers, rows) = rows(table, records);
            Ok(render_table(&headers, &rows))
        }
        OutputFormat::Json => {
            let data = Value::Array(records.iter().map(|r| r.to_json()).collect());
            serde_json::to_string_pretty(&data).context("Failed to format JSON output")
        }
        OutputFormat::Csv => {
            let (headers, rows) = rows(table, records);
            render_csv(&headers, &rows)
        }
    }
}

/// Left-aligned columns measured in terminal cells, so Arabic and other wide
/// text lines up
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(truncate(cell, MAX_CELL_WIDTH).width());
            }
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    out.push_str(&header_line.join("  ").bold().to_string());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  ").dimmed().to_string());
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&truncate(cell, MAX_CELL_WIDTH), *w))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn render_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(row).context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Cut to at most `max` terminal cells, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    let text = text.replace('\n', " ");
    if text.width() <= max {
        return text;
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

pub fn print_banner(banner: Option<&Banner>) {
    match banner {
        Some(Banner::Success(m)) => println!("{} {}", "✓".green(), m.green()),
        Some(Banner::Warning(m)) => println!("{} {}", "!".yellow(), m.yellow()),
        Some(Banner::Error(m)) => eprintln!("{} {}", "✗".red(), m.red()),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_characters_are_padded_by_display_width() {
        colored::control::set_override(false);
        let headers = vec!["name".to_string(), "phone".to_string()];
        let rows = vec![
            vec!["مستشفى".to_string(), "1".to_string()],
            vec!["東京".to_string(), "2".to_string()],
        ];
        let out = render_table(&headers, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name    phone");
        assert_eq!(lines[3], "東京    2");
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("a\nb", 5), "a b");
    }

    #[test]
    fn test_csv_quotes_commas() {
        let out = render_csv(
            &["name".to_string()],
            &[vec!["Mina, Camp 3".to_string()]],
        )
        .unwrap();
        assert_eq!(out, "name\n\"Mina, Camp 3\"\n");
    }
}
