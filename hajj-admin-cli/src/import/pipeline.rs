//! Validate a spreadsheet locally, then hand it to the bulk-upload endpoint
//!
//! Gates run in a fixed order and the file reaches the network only after
//! every one of them has passed.

use log::{debug, info};
use serde_json::Value;

use super::error::ImportError;
use super::reader::{ParsedSheet, read_first_sheet};
use super::validate::{check_headers, collect_problems, validate_rows};
use crate::api::{ApiError, ResourceApi, Session, UploadFile};
use crate::schema::{EntitySchema, ImportSpec};
use crate::table::ReferenceCache;

const EXCEL_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Result of an accepted upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub count: u64,
}

impl ImportSummary {
    pub fn message(&self, schema: &EntitySchema) -> String {
        format!("Successfully uploaded {} {}", self.count, schema.plural)
    }
}

pub fn check_extension(file_name: &str) -> Result<(), ImportError> {
    let lower = file_name.to_lowercase();
    if EXCEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(ImportError::WrongExtension)
    }
}

/// Extension, parse, emptiness and header gates
fn parse_upload<'a>(
    file: &UploadFile,
    schema: &'a EntitySchema,
) -> Result<(ParsedSheet, &'a ImportSpec), ImportError> {
    let layout = schema
        .import
        .as_ref()
        .ok_or(ImportError::NotSupported(schema.plural))?;

    check_extension(&file.name)?;
    let sheet = read_first_sheet(&file.bytes)?;
    if sheet.rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }
    check_headers(&sheet, layout)?;
    Ok((sheet, layout))
}

/// Dry run: every row problem, without contacting the server.
///
/// File-level problems (extension, empty, headers) are returned as `Err`.
pub fn check_file(
    file: &UploadFile,
    schema: &EntitySchema,
    refs: &ReferenceCache,
) -> Result<Vec<ImportError>, ImportError> {
    let (sheet, layout) = parse_upload(file, schema)?;
    Ok(collect_problems(&sheet, layout, refs))
}

/// Run every gate, then POST the original bytes as multipart field `file`
pub async fn validate_and_import(
    file: &UploadFile,
    schema: &EntitySchema,
    refs: &ReferenceCache,
    api: &dyn ResourceApi,
    session: &Session,
) -> Result<ImportSummary, ImportError> {
    let (sheet, layout) = parse_upload(file, schema)?;
    validate_rows(&sheet, layout, refs)?;
    debug!("{} passed validation with {} rows", file.name, sheet.rows.len());

    let token = session
        .bearer()
        .await
        .map_err(|_| ImportError::MissingCredential)?;

    let response = api
        .bulk_upload(schema.endpoint, file, &token)
        .await
        .map_err(|e| match e {
            ApiError::MissingCredential => ImportError::MissingCredential,
            ApiError::ServerRejected { message, .. } => ImportError::ServerRejected(message),
            other => {
                log::error!("Bulk upload failed: {}", other);
                ImportError::ServerRejected("Error processing file. Please try again.".to_string())
            }
        })?;

    let count = match response.get("count").and_then(Value::as_u64) {
        Some(count) => count,
        None => {
            debug!("Upload response without count: {}", response);
            sheet.rows.len() as u64
        }
    };
    info!("Uploaded {} {} from {}", count, schema.plural, file.name);
    Ok(ImportSummary { count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MemoryCredentialStore, MockApi};
    use crate::import::test_support::xlsx_bytes;
    use crate::api::ReferenceEntry;
    use crate::schema::{ReferenceKind, find_schema};
    use serde_json::json;
    use std::sync::Arc;

    fn signed_in() -> Session {
        Session::new(Arc::new(MemoryCredentialStore::with_token("t")))
    }

    fn ambulance_file() -> UploadFile {
        UploadFile::new(
            "ambulances.XLSX",
            xlsx_bytes(&[
                &["category", "center", "poll", "latitude", "longitude"],
                &["type1", "C1", "P1", "21.4", "39.8"],
            ]),
        )
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(check_extension("data.xlsx").is_ok());
        assert!(check_extension("DATA.XLS").is_ok());
        assert_eq!(check_extension("data.csv"), Err(ImportError::WrongExtension));
        assert_eq!(check_extension("xlsx"), Err(ImportError::WrongExtension));
    }

    #[tokio::test]
    async fn test_valid_ambulance_upload() {
        let api = MockApi::new();
        api.set_upload_response(Ok(json!({"count": 1})));
        let schema = find_schema("ambulance").unwrap();

        let summary = validate_and_import(
            &ambulance_file(),
            schema,
            &ReferenceCache::new(),
            &api,
            &signed_in(),
        )
        .await
        .unwrap();

        assert_eq!(summary.message(schema), "Successfully uploaded 1 ambulances");
        assert_eq!(
            api.calls(),
            vec![Call::BulkUpload {
                endpoint: "ambulance".into(),
                file_name: "ambulances.XLSX".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_ambulance_branch_name_is_checked_against_the_branch_list() {
        let api = MockApi::new();
        api.set_upload_response(Ok(json!({"count": 1})));
        let schema = find_schema("ambulance").unwrap();
        let mut refs = ReferenceCache::new();
        refs.insert(ReferenceKind::Branch, vec![ReferenceEntry::new("br1", "Branch 1")]);

        let file = |branch: &str| {
            UploadFile::new(
                "ambulances.xlsx",
                xlsx_bytes(&[
                    &["category", "center", "poll", "latitude", "longitude", "branch_name"],
                    &["type1", "C1", "P1", "21.4225", "39.8262", branch],
                ]),
            )
        };

        let summary = validate_and_import(&file("Branch 1"), schema, &refs, &api, &signed_in())
            .await
            .unwrap();
        assert_eq!(summary.message(schema), "Successfully uploaded 1 ambulances");
        assert_eq!(api.calls().len(), 1);

        let err = validate_and_import(&file("Branch 7"), schema, &refs, &api, &signed_in())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 2: Invalid branch name \"Branch 7\". Please use a valid branch name."
        );
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections_happen_before_the_network() {
        let api = MockApi::new();
        let schema = find_schema("ambulance").unwrap();
        let refs = ReferenceCache::new();

        let cases = [
            (UploadFile::new("a.csv", b"category\ntype1".to_vec()), ImportError::WrongExtension),
            (
                UploadFile::new("a.xlsx", xlsx_bytes(&[&["category", "center", "poll"]])),
                ImportError::EmptyFile,
            ),
            (
                UploadFile::new("a.xlsx", xlsx_bytes(&[&["category", "center"], &["type1", "C"]])),
                ImportError::MissingHeaders {
                    required: vec!["category".into(), "center".into(), "poll".into()],
                },
            ),
        ];
        for (file, expected) in cases {
            let err = validate_and_import(&file, schema, &refs, &api, &signed_in())
                .await
                .unwrap_err();
            assert_eq!(err, expected);
        }

        let invalid = UploadFile::new(
            "a.xlsx",
            xlsx_bytes(&[&["category", "center", "poll"], &["type9", "C", "P"]]),
        );
        let err = validate_and_import(&invalid, schema, &refs, &api, &signed_in())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 2: Invalid category: type9. Must be one of: type1, type2, type3"
        );

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_stops_before_upload() {
        let api = MockApi::new();
        let session = Session::new(Arc::new(MemoryCredentialStore::default()));
        let err = validate_and_import(
            &ambulance_file(),
            find_schema("ambulance").unwrap(),
            &ReferenceCache::new(),
            &api,
            &session,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Authentication token not found. Please log in again."
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let api = MockApi::new();
        api.set_upload_response(Err(ApiError::rejected(
            400,
            r#"{"message":"Duplicate ambulance center"}"#,
        )));
        let err = validate_and_import(
            &ambulance_file(),
            find_schema("ambulance").unwrap(),
            &ReferenceCache::new(),
            &api,
            &signed_in(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ImportError::ServerRejected("Duplicate ambulance center".into()));
    }

    #[test]
    fn test_entities_without_import() {
        let file = UploadFile::new("x.xlsx", Vec::new());
        let err = check_file(&file, find_schema("emergency").unwrap(), &ReferenceCache::new())
            .unwrap_err();
        assert_eq!(err, ImportError::NotSupported("emergency contacts"));
    }
}
