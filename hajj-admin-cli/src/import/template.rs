//! Blank upload template for an entity
//!
//! Header row uses the exact column names the importer expects, followed by
//! one example row. Built entirely locally.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::Workbook;

use crate::schema::EntitySchema;

pub const TEMPLATE_SHEET: &str = "Template";

/// Build the template workbook in memory
pub fn template_bytes(schema: &EntitySchema) -> Result<Vec<u8>> {
    let Some(layout) = schema.import.as_ref() else {
        bail!("Bulk upload is not available for {}", schema.plural);
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(TEMPLATE_SHEET)?;

    for (col, column) in layout.header().iter().enumerate() {
        let col = col as u16;
        worksheet.write_string(0, col, column.name)?;
        worksheet.write_string(1, col, column.sample)?;
        worksheet.set_column_width(col, column.width)?;
    }

    workbook
        .save_to_buffer()
        .context("Failed to download template")
}

pub fn write_template<P: AsRef<Path>>(schema: &EntitySchema, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = template_bytes(schema)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to save template: {}", path.display()))?;
    log::info!("Wrote {} template to {}", schema.label, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::reader::read_first_sheet;
    use crate::import::validate::check_headers;
    use crate::schema::find_schema;

    #[test]
    fn test_template_headers_round_trip_through_the_reader() {
        let schema = find_schema("clinic").unwrap();
        let bytes = template_bytes(schema).unwrap();
        let sheet = read_first_sheet(&bytes).unwrap();

        assert_eq!(
            sheet.headers,
            vec![
                "name",
                "location_name",
                "branch_name",
                "center",
                "poll",
                "latitude",
                "longitude"
            ]
        );
        assert!(check_headers(&sheet, schema.import.as_ref().unwrap()).is_ok());
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("branch_name"), "Branch 1");
    }

    #[test]
    fn test_template_sheet_name() {
        use calamine::{Reader, open_workbook_auto_from_rs};
        let bytes = template_bytes(find_schema("thanima").unwrap()).unwrap();
        let workbook = open_workbook_auto_from_rs(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![TEMPLATE_SHEET.to_string()]);
    }

    #[test]
    fn test_no_template_without_import() {
        assert!(template_bytes(find_schema("location").unwrap()).is_err());
    }

    #[test]
    fn test_write_template_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let schema = find_schema("bus-station").unwrap();
        let path = dir.path().join(schema.template_file_name());
        write_template(schema, &path).unwrap();
        assert!(path.ends_with("bus_station_upload_template.xlsx"));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
