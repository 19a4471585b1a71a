//! Shape validation of parsed rows against an entity's import columns

use log::warn;

use super::error::ImportError;
use super::reader::{ParsedSheet, SheetRow};
use crate::schema::{ColumnRule, ImportSpec};
use crate::table::ReferenceCache;

/// Every required column must be present in the header row
pub fn check_headers(sheet: &ParsedSheet, layout: &ImportSpec) -> Result<(), ImportError> {
    let required = layout.required_columns();
    if required.iter().all(|c| sheet.has_header(c)) {
        return Ok(());
    }
    Err(ImportError::MissingHeaders {
        required: required.iter().map(|c| c.to_string()).collect(),
    })
}

/// First problem in the sheet, scanning rows top to bottom
pub fn validate_rows(sheet: &ParsedSheet, layout: &ImportSpec, refs: &ReferenceCache) -> Result<(), ImportError> {
    warn_unchecked_references(layout, refs);
    sheet
        .rows
        .iter()
        .try_for_each(|row| validate_row(row, layout, refs))
}

/// The first problem of every failing row, for a dry-run report
pub fn collect_problems(sheet: &ParsedSheet, layout: &ImportSpec, refs: &ReferenceCache) -> Vec<ImportError> {
    warn_unchecked_references(layout, refs);
    sheet
        .rows
        .iter()
        .filter_map(|row| validate_row(row, layout, refs).err())
        .collect()
}

/// Check one row: required cells first, then each column's rule
pub fn validate_row(row: &SheetRow, layout: &ImportSpec, refs: &ReferenceCache) -> Result<(), ImportError> {
    if let Some(missing) = layout
        .columns
        .iter()
        .find(|c| c.required && row.get(c.name).is_empty())
    {
        return Err(ImportError::MissingRequiredField {
            row: row.number,
            field: missing.name.to_string(),
            required: layout.required_columns().iter().map(|c| c.to_string()).collect(),
        });
    }

    for column in &layout.columns {
        let value = row.get(column.name);
        if value.is_empty() {
            continue;
        }

        match &column.rule {
            ColumnRule::Text => {}
            ColumnRule::Enum(allowed) => {
                if !allowed.iter().any(|a| a == value) {
                    return Err(ImportError::InvalidEnumValue {
                        row: row.number,
                        field: column.name.to_string(),
                        value: value.to_string(),
                        allowed: allowed.clone(),
                    });
                }
            }
            ColumnRule::Reference(kind) => {
                // An empty cache means the list could not be fetched; the server decides
                if !refs.is_empty(*kind) && refs.find_by_name(*kind, value).is_none() {
                    return Err(ImportError::InvalidReference {
                        row: row.number,
                        kind: *kind,
                        value: value.to_string(),
                    });
                }
            }
            ColumnRule::Latitude => check_coordinate(row, column.name, value, 90.0)?,
            ColumnRule::Longitude => check_coordinate(row, column.name, value, 180.0)?,
        }
    }
    Ok(())
}

fn check_coordinate(row: &SheetRow, field: &str, value: &str, limit: f64) -> Result<(), ImportError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && (-limit..=limit).contains(&n) => Ok(()),
        _ => Err(ImportError::InvalidCoordinate {
            row: row.number,
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn warn_unchecked_references(layout: &ImportSpec, refs: &ReferenceCache) {
    for kind in layout.reference_kinds() {
        if refs.is_empty(kind) {
            warn!("No {} list loaded; {} names will not be checked", kind, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::normalize::ReferenceEntry;
    use crate::schema::{ReferenceKind, find_schema};
    use std::collections::BTreeMap;

    fn row(number: u32, cells: &[(&str, &str)]) -> SheetRow {
        SheetRow {
            number,
            values: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn sheet(headers: &[&str], rows: Vec<SheetRow>) -> ParsedSheet {
        ParsedSheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn clinic_refs() -> ReferenceCache {
        let mut refs = ReferenceCache::new();
        refs.insert(ReferenceKind::Location, vec![ReferenceEntry::new("loc1", "Mina")]);
        refs.insert(ReferenceKind::Branch, vec![ReferenceEntry::new("b1", "Branch 1")]);
        refs
    }

    fn clinic_spec() -> ImportSpec {
        find_schema("clinic").unwrap().import.clone().unwrap()
    }

    #[test]
    fn test_missing_headers_lists_required_columns() {
        let sheet = sheet(&["name", "location_name"], vec![]);
        let err = check_headers(&sheet, &clinic_spec()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Excel file must have required columns: name, location_name, and branch_name"
        );
    }

    #[test]
    fn test_nth_row_reports_n_plus_two() {
        let headers = ["name", "location_name", "branch_name"];
        let good = |n| row(n, &[("name", "C"), ("location_name", "Mina"), ("branch_name", "Branch 1")]);
        let sheet = sheet(
            &headers,
            vec![good(2), good(3), row(4, &[("name", "C"), ("location_name", "Mina")])],
        );

        let err = validate_rows(&sheet, &clinic_spec(), &clinic_refs()).unwrap_err();
        assert_eq!(err.row(), Some(4));
        assert_eq!(
            err.to_string(),
            "Row 4: Missing required data. Each row must have name, location_name, and branch_name."
        );
    }

    #[test]
    fn test_reference_names_are_case_insensitive() {
        let r = row(2, &[("name", "C"), ("location_name", "MINA"), ("branch_name", "branch 1")]);
        assert!(validate_row(&r, &clinic_spec(), &clinic_refs()).is_ok());

        let r = row(2, &[("name", "C"), ("location_name", "Jeddah"), ("branch_name", "Branch 1")]);
        assert_eq!(
            validate_row(&r, &clinic_spec(), &clinic_refs()),
            Err(ImportError::InvalidReference {
                row: 2,
                kind: ReferenceKind::Location,
                value: "Jeddah".into()
            })
        );
    }

    #[test]
    fn test_empty_cache_skips_reference_check() {
        let r = row(2, &[("name", "C"), ("location_name", "Anywhere"), ("branch_name", "Any")]);
        assert!(validate_row(&r, &clinic_spec(), &ReferenceCache::new()).is_ok());
    }

    #[test]
    fn test_invalid_category_names_value_and_allowed_set() {
        let layout = find_schema("ambulance").unwrap().import.clone().unwrap();
        let r = row(2, &[("category", "type9"), ("center", "X"), ("poll", "P")]);
        let err = validate_row(&r, &layout, &ReferenceCache::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 2: Invalid category: type9. Must be one of: type1, type2, type3"
        );
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let layout = find_schema("hospital").unwrap().import.clone().unwrap();
        let base = [("name", "H"), ("arabicName", "م"), ("phone", "1")];

        let mut cells = base.to_vec();
        cells.push(("latitude", "91"));
        assert!(matches!(
            validate_row(&row(2, &cells), &layout, &ReferenceCache::new()),
            Err(ImportError::InvalidCoordinate { .. })
        ));

        let mut cells = base.to_vec();
        cells.push(("longitude", "abc"));
        assert!(validate_row(&row(2, &cells), &layout, &ReferenceCache::new()).is_err());

        let mut cells = base.to_vec();
        cells.extend([("latitude", "21.4225"), ("longitude", "-180")]);
        assert!(validate_row(&row(2, &cells), &layout, &ReferenceCache::new()).is_ok());
    }

    #[test]
    fn test_collect_problems_reports_each_failing_row() {
        let headers = ["name", "location_name", "branch_name"];
        let sheet = sheet(
            &headers,
            vec![
                row(2, &[("name", "A")]),
                row(3, &[("name", "B"), ("location_name", "Mina"), ("branch_name", "Branch 1")]),
                row(5, &[("name", "C"), ("location_name", "Nowhere"), ("branch_name", "Branch 1")]),
            ],
        );
        let problems = collect_problems(&sheet, &clinic_spec(), &clinic_refs());
        let rows: Vec<Option<u32>> = problems.iter().map(ImportError::row).collect();
        assert_eq!(rows, vec![Some(2), Some(5)]);
    }
}
