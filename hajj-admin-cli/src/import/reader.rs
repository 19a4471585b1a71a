//! Read the first sheet of an uploaded workbook
//!
//! Row 1 is the header row; every following non-blank row becomes a map
//! keyed by header. Rows keep the number the user sees in their
//! spreadsheet program, blank rows included.

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use super::error::ImportError;
use crate::api::models::format_number;

/// One data row of the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number as shown in a spreadsheet program
    pub number: u32,
    pub values: BTreeMap<String, String>,
}

impl SheetRow {
    /// Trimmed cell value; empty when the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(|v| v.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl ParsedSheet {
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Parse `.xlsx`/`.xls` bytes; the format is detected from the content
pub fn read_first_sheet(bytes: &[u8]) -> Result<ParsedSheet, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(ImportError::Unreadable(e.to_string())),
        None => return Err(ImportError::EmptyFile),
    };

    let first_row = range.start().map(|(row, _)| row).unwrap_or(0);
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Err(ImportError::EmptyFile),
    };

    let mut parsed = Vec::new();
    for (offset, cells) in rows.enumerate() {
        // Header is sheet row first_row + 1, so data rows start one below it
        let number = first_row + offset as u32 + 2;

        let values: BTreeMap<String, String> = cells
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| {
                let header = headers.get(col).filter(|h| !h.is_empty())?;
                Some((header.clone(), cell_text(cell)))
            })
            .collect();

        if values.values().all(|v| v.trim().is_empty()) {
            continue;
        }
        parsed.push(SheetRow { number, values });
    }

    log::debug!(
        "Read {} data rows with headers [{}]",
        parsed.len(),
        headers.join(", ")
    );

    Ok(ParsedSheet {
        headers,
        rows: parsed,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::test_support::xlsx_bytes;

    #[test]
    fn test_rows_keep_sheet_numbers_across_blank_rows() {
        let bytes = xlsx_bytes(&[
            &["name", "phone"],
            &["Tower A", "123"],
            &["", ""],
            &["Tower B", ""],
        ]);
        let sheet = read_first_sheet(&bytes).unwrap();

        assert_eq!(sheet.headers, vec!["name", "phone"]);
        let numbers: Vec<u32> = sheet.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert_eq!(sheet.rows[1].get("name"), "Tower B");
        assert_eq!(sheet.rows[1].get("phone"), "");
        assert_eq!(sheet.rows[1].get("missing"), "");
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        let bytes = xlsx_bytes(&[&["name", "phone"]]);
        let sheet = read_first_sheet(&bytes).unwrap();
        assert!(sheet.rows.is_empty());
        assert!(sheet.has_header("phone"));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err = read_first_sheet(b"this is not a workbook").unwrap_err();
        assert!(matches!(err, ImportError::Unreadable(_)));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(21.5)), "21.5");
        assert_eq!(cell_text(&Data::Float(101.0)), "101");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
