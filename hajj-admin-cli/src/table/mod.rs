//! Generic resource table controller
//!
//! One `ResourceTable` drives any entity: it owns the loaded records, the
//! single in-progress edit, the selection, the search text, the pending
//! delete set, the add-form draft and the status banner. Every operation
//! takes `&mut self`, so a table never runs two operations at once and a
//! slow response cannot overwrite a newer one.

pub mod error;
pub mod filter;
pub mod reference;

pub use error::TableError;
pub use filter::filter_records;
pub use reference::ReferenceCache;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde_json::{Value, json};

use crate::api::models::draft_to_json;
use crate::api::{
    ApiError, Coordinates, Draft, FieldValue, Record, ResourceApi, Session, UploadFile,
    normalize_collection, normalize_record,
};
use crate::import::{ImportError, ImportSummary, validate_and_import};
use crate::schema::{EntitySchema, FieldKind};

/// Dismissible status line shown above the table
#[derive(Debug, Clone, PartialEq)]
pub enum Banner {
    Success(String),
    Warning(String),
    Error(String),
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Banner::Success(m) | Banner::Warning(m) | Banner::Error(m) => m,
        }
    }
}

#[derive(Debug, Clone)]
struct EditState {
    id: String,
    snapshot: Record,
}

/// Per-id outcome of a confirmed delete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub outcomes: Vec<(String, Result<(), ApiError>)>,
}

impl DeleteReport {
    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &ApiError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id.as_str(), e)))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }
}

pub struct ResourceTable {
    schema: EntitySchema,
    api: Arc<dyn ResourceApi>,
    session: Session,
    records: Vec<Record>,
    editing: Option<EditState>,
    selected: BTreeSet<String>,
    search_text: String,
    pending_delete: BTreeSet<String>,
    draft: Draft,
    references: ReferenceCache,
    banner: Option<Banner>,
}

impl ResourceTable {
    pub fn new(schema: EntitySchema, api: Arc<dyn ResourceApi>, session: Session) -> Self {
        let draft = schema.empty_draft();
        Self {
            schema,
            api,
            session,
            records: Vec::new(),
            editing: None,
            selected: BTreeSet::new(),
            search_text: String::new(),
            pending_delete: BTreeSet::new(),
            draft,
            references: ReferenceCache::new(),
            banner: None,
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.id.as_str())
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn pending_delete(&self) -> &BTreeSet<String> {
        &self.pending_delete
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn references(&self) -> &ReferenceCache {
        &self.references
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Cell text for a field, resolving references through the cache
    pub fn display_value(&self, record: &Record, field: &str) -> String {
        match record.get(field) {
            Some(value) => self.references.display(self.schema.field_kind(field), value),
            None => String::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch reference lists, then the records
    pub async fn mount(&mut self) -> Result<(), TableError> {
        self.load_references().await;
        self.load().await
    }

    pub async fn load_references(&mut self) {
        let kinds = self.schema.reference_kinds();
        if kinds.is_empty() {
            return;
        }
        self.references = ReferenceCache::fetch(self.api.as_ref(), &self.session, &kinds).await;
    }

    /// Replace `records` with the server's collection.
    ///
    /// On failure the table is left empty with an error banner.
    pub async fn load(&mut self) -> Result<(), TableError> {
        match self.fetch_records().await {
            Ok(records) => {
                debug!("Loaded {} {}", records.len(), self.schema.plural);
                self.records = records;
                self.selected.retain(|id| self.records.iter().any(|r| &r.id == id));
                if let Some(edit) = &self.editing
                    && self.record(&edit.id).is_none()
                {
                    self.editing = None;
                }
                Ok(())
            }
            Err(e) => {
                error!("Failed to load {}: {}", self.schema.plural, e);
                self.records.clear();
                self.editing = None;
                self.selected.clear();
                self.banner = Some(Banner::Error(format!(
                    "Failed to load {}: {}",
                    self.schema.plural,
                    e.user_message()
                )));
                Err(e.into())
            }
        }
    }

    async fn fetch_records(&self) -> Result<Vec<Record>, ApiError> {
        let token = if self.schema.list_requires_auth {
            Some(self.session.bearer().await?)
        } else {
            self.session.optional_bearer().await
        };
        let value = self.api.list(self.schema.endpoint, token.as_ref()).await?;
        normalize_collection(&self.schema, value)
    }

    // ========================================================================
    // Inline editing
    // ========================================================================

    pub fn begin_edit(&mut self, id: &str) -> Result<(), TableError> {
        if let Some(edit) = &self.editing {
            if edit.id == id {
                return Ok(());
            }
            return Err(TableError::AlreadyEditing {
                current: edit.id.clone(),
            });
        }
        let snapshot = self
            .record(id)
            .cloned()
            .ok_or_else(|| TableError::NotFoundLocally(id.to_string()))?;
        debug!("Editing {} {}", self.schema.label, id);
        self.editing = Some(EditState {
            id: id.to_string(),
            snapshot,
        });
        Ok(())
    }

    /// Set a field of the record being edited
    pub fn edit_field(&mut self, id: &str, field: &str, value: FieldValue) -> Result<(), TableError> {
        self.ensure_editing(id)?;
        let value = self.resolve_references(field, value);
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| TableError::NotFoundLocally(id.to_string()))?;
        if self.schema.field(field).is_none() && record.get(field).is_none() {
            return Err(TableError::UnknownField(field.to_string()));
        }
        record.set(field, value);
        Ok(())
    }

    /// Parse typed-in text and set it on the record being edited
    pub fn edit_field_input(&mut self, id: &str, field: &str, input: &str) -> Result<(), TableError> {
        let value = self.parse_input(field, input)?;
        self.edit_field(id, field, value)
    }

    /// PUT the edited record; on failure the edit stays open
    pub async fn save_edit(&mut self, id: &str) -> Result<(), TableError> {
        self.ensure_editing(id)?;
        let body = self
            .record(id)
            .map(Record::to_request_json)
            .ok_or_else(|| TableError::NotFoundLocally(id.to_string()))?;

        let result = match self.session.bearer().await {
            Ok(token) => self.api.update(self.schema.endpoint, id, &body, &token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                match normalize_record(&self.schema, response) {
                    Ok(saved) => {
                        if let Some(slot) = self.records.iter_mut().find(|r| r.id == id) {
                            *slot = saved;
                        }
                    }
                    Err(e) => warn!(
                        "Update response for {} was not a record ({}); keeping local copy",
                        id, e
                    ),
                }
                self.editing = None;
                info!("Updated {} {}", self.schema.label, id);
                self.banner = Some(Banner::Success(format!("{} updated", self.schema.label)));
                Ok(())
            }
            Err(e) => {
                error!("Failed to update {} {}: {}", self.schema.label, id, e);
                self.banner = Some(Banner::Error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Restore the snapshot taken by `begin_edit`
    pub fn cancel_edit(&mut self, id: &str) -> Result<(), TableError> {
        self.ensure_editing(id)?;
        if let Some(edit) = self.editing.take()
            && let Some(slot) = self.records.iter_mut().find(|r| r.id == edit.id)
        {
            *slot = edit.snapshot;
        }
        Ok(())
    }

    fn ensure_editing(&self, id: &str) -> Result<(), TableError> {
        match &self.editing {
            Some(edit) if edit.id == id => Ok(()),
            _ => Err(TableError::NotEditing(id.to_string())),
        }
    }

    // ========================================================================
    // Deleting
    // ========================================================================

    /// First step of the two-step delete; nothing is removed yet
    pub fn request_delete<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending_delete = ids.into_iter().map(Into::into).collect();
        self.pending_delete.len()
    }

    pub fn cancel_delete_request(&mut self) {
        self.pending_delete.clear();
    }

    /// Delete every pending id concurrently.
    ///
    /// All requested ids are dropped from the local list once every call has
    /// settled, whatever the individual outcomes; the report carries them.
    pub async fn confirm_delete(&mut self) -> Result<DeleteReport, TableError> {
        if self.pending_delete.is_empty() {
            return Ok(DeleteReport::default());
        }
        if let Err(e) = self.session.bearer().await {
            error!("Cannot delete {}: {}", self.schema.plural, e);
            self.banner = Some(Banner::Error(e.user_message()));
            return Err(e.into());
        }

        let ids: Vec<String> = self.pending_delete.iter().cloned().collect();
        let endpoint = self.schema.endpoint;
        let api = self.api.as_ref();
        let session = &self.session;

        let results = join_all(ids.iter().map(|id| async move {
            let token = session.bearer().await?;
            api.delete(endpoint, id, &token).await
        }))
        .await;

        let report = DeleteReport {
            outcomes: ids.into_iter().zip(results).collect(),
        };

        for (id, err) in report.failed() {
            error!("Failed to delete {} {}: {}", self.schema.label, id, err);
        }

        let pending = std::mem::take(&mut self.pending_delete);
        self.records.retain(|r| !pending.contains(&r.id));
        self.selected.clear();
        if self
            .editing
            .as_ref()
            .is_some_and(|e| pending.contains(&e.id))
        {
            self.editing = None;
        }

        let deleted = report.succeeded().len();
        self.banner = Some(if report.all_succeeded() {
            info!("Deleted {} {}", deleted, self.schema.plural);
            Banner::Success(format!("Deleted {} {}", deleted, self.schema.plural))
        } else {
            warn!(
                "{} of {} deletes failed",
                report.failed().len(),
                report.outcomes.len()
            );
            Banner::Warning(format!(
                "Deleted {} of {} {}; {} failed on the server",
                deleted,
                report.outcomes.len(),
                self.schema.plural,
                report.failed().len()
            ))
        });
        Ok(report)
    }

    // ========================================================================
    // Adding
    // ========================================================================

    pub fn set_draft_field(&mut self, field: &str, value: FieldValue) -> Result<(), TableError> {
        if self.schema.field(field).is_none() {
            return Err(TableError::UnknownField(field.to_string()));
        }
        let value = self.resolve_references(field, value);
        self.draft.insert(field.to_string(), value);
        Ok(())
    }

    pub fn set_draft_input(&mut self, field: &str, input: &str) -> Result<(), TableError> {
        let value = self.parse_input(field, input)?;
        self.set_draft_field(field, value)
    }

    pub fn reset_draft(&mut self) {
        self.draft = self.schema.empty_draft();
    }

    /// POST the draft. Returns whether the server answered 201.
    ///
    /// On 201 the draft is reset and the table reloaded; otherwise the draft
    /// is kept so it can be corrected and resubmitted.
    pub async fn add(&mut self) -> Result<bool, TableError> {
        let body = draft_to_json(&self.draft);
        let result = match self.session.bearer().await {
            Ok(token) => self.api.create(self.schema.endpoint, &body, &token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) if response.is_created() => {
                info!("Created {}", self.schema.label);
                self.reset_draft();
                self.reload_after_write(format!("{} added", self.schema.label))
                    .await;
                Ok(true)
            }
            Ok(response) => {
                warn!(
                    "Create {} answered {} instead of 201; not reloading",
                    self.schema.label, response.status
                );
                Ok(false)
            }
            Err(e) => {
                error!("Failed to add {}: {}", self.schema.label, e);
                self.banner = Some(Banner::Error(e.user_message()));
                Err(e.into())
            }
        }
    }

    // ========================================================================
    // Selection and search
    // ========================================================================

    pub fn toggle_select(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
    }

    /// Select every visible record, or clear the selection
    pub fn select_all(&mut self, select: bool) {
        self.selected = if select {
            self.visible().iter().map(|r| r.id.clone()).collect()
        } else {
            BTreeSet::new()
        };
    }

    pub fn set_search(&mut self, text: &str) {
        self.search_text = text.to_string();
    }

    /// Records matching the current search text, in load order
    pub fn visible(&self) -> Vec<&Record> {
        filter_records(&self.records, &self.schema, &self.search_text, &self.references)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Validate and upload a spreadsheet, then reload
    pub async fn import(&mut self, file: &UploadFile) -> Result<ImportSummary, ImportError> {
        let result = validate_and_import(
            file,
            &self.schema,
            &self.references,
            self.api.as_ref(),
            &self.session,
        )
        .await;

        match result {
            Ok(summary) => {
                let message = summary.message(&self.schema);
                info!("{}", message);
                self.reload_after_write(message).await;
                Ok(summary)
            }
            Err(e) => {
                error!("Import of {} failed: {}", file.name, e);
                self.banner = Some(Banner::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Set the status of every selected record, then reload
    pub async fn bulk_update_status(&mut self, status: &str) -> Result<(), TableError> {
        if self.schema.bulk_statuses.is_empty() {
            return Err(TableError::Unsupported("bulk status updates"));
        }
        if !self.schema.bulk_statuses.iter().any(|s| *s == status) {
            return Err(TableError::InvalidValue {
                field: "status".to_string(),
                message: format!("must be one of: {}", self.schema.bulk_statuses.join(", ")),
            });
        }
        if self.selected.is_empty() {
            return Err(TableError::NothingSelected);
        }

        let ids: Vec<&String> = self.selected.iter().collect();
        let body = json!({ "ids": ids, "status": status });
        let result = match self.session.bearer().await {
            Ok(token) => self.api.bulk_update(self.schema.endpoint, &body, &token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                let count = self.selected.len();
                info!("Marked {} {} as {}", count, self.schema.plural, status);
                self.selected.clear();
                self.reload_after_write(format!(
                    "Marked {} {} as {}",
                    count, self.schema.plural, status
                ))
                .await;
                Ok(())
            }
            Err(e) => {
                error!("Bulk update of {} failed: {}", self.schema.plural, e);
                self.banner = Some(Banner::Error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Upload a file for a URL-valued field (a country's flag) and store the
    /// returned URL on the draft, or on record `id` while it is being edited
    pub async fn upload_field_file(
        &mut self,
        id: Option<&str>,
        field: &str,
        file: &UploadFile,
    ) -> Result<String, TableError> {
        let upload = self
            .schema
            .file_upload(field)
            .cloned()
            .ok_or(TableError::Unsupported("file uploads for this field"))?;
        if let Some(id) = id {
            self.ensure_editing(id)?;
        }

        let result = match self.session.bearer().await {
            Ok(token) => self
                .api
                .upload_file(upload.endpoint, upload.part, file, &token)
                .await
                .and_then(|body| uploaded_url(&body)),
            Err(e) => Err(e),
        };

        let url = match result {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to upload {} for {}: {}", file.name, field, e);
                self.banner = Some(Banner::Error(e.user_message()));
                return Err(e.into());
            }
        };

        info!("Uploaded {} as {}", file.name, url);
        let value = FieldValue::Text(url.clone());
        match id {
            Some(id) => self.edit_field(id, field, value)?,
            None => self.set_draft_field(field, value)?,
        }
        let title = self.schema.field(field).map(|f| f.title).unwrap_or(field);
        self.banner = Some(Banner::Success(format!("{} uploaded", title)));
        Ok(url)
    }

    /// Reload after a write the server accepted. The write's `message` stays
    /// visible when the reload fails, followed by the load error.
    async fn reload_after_write(&mut self, message: String) {
        match self.load().await {
            Ok(()) => self.banner = Some(Banner::Success(message)),
            Err(e) => {
                warn!("Reload after \"{}\" failed: {}", message, e);
                let reload = self
                    .banner
                    .take()
                    .map(|b| b.message().to_string())
                    .unwrap_or_default();
                self.banner = Some(Banner::Warning(format!("{}. {}", message, reload)));
            }
        }
    }

    // ========================================================================
    // Input handling
    // ========================================================================

    /// Reference fields given as an id or name become populated references
    fn resolve_references(&self, field: &str, value: FieldValue) -> FieldValue {
        let Some(kind) = self.schema.field_kind(field).and_then(FieldKind::reference_kind) else {
            return value;
        };
        match value {
            FieldValue::Text(s) if s.trim().is_empty() => FieldValue::Null,
            FieldValue::Text(s) => FieldValue::Reference(self.references.resolve(kind, &s)),
            FieldValue::Reference(r) if r.expanded_name().is_none() => {
                FieldValue::Reference(self.references.resolve(kind, r.id()))
            }
            other => other,
        }
    }

    /// Interpret command-line text according to the field's kind
    pub fn parse_input(&self, field: &str, input: &str) -> Result<FieldValue, TableError> {
        let kind = self
            .schema
            .field_kind(field)
            .ok_or_else(|| TableError::UnknownField(field.to_string()))?;
        let input = input.trim();
        let invalid = |message: String| TableError::InvalidValue {
            field: field.to_string(),
            message,
        };

        match kind {
            FieldKind::Text => Ok(FieldValue::text(input)),
            FieldKind::Number if input.is_empty() => Ok(FieldValue::Null),
            FieldKind::Number => input
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| invalid(format!("'{}' is not a number", input))),
            FieldKind::Enum(options) => options
                .iter()
                .find(|o| o.value.eq_ignore_ascii_case(input) || o.label.eq_ignore_ascii_case(input))
                .map(|o| FieldValue::text(o.value.clone()))
                .ok_or_else(|| {
                    let allowed: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
                    invalid(format!("must be one of: {}", allowed.join(", ")))
                }),
            FieldKind::Coordinates if input.is_empty() => Ok(FieldValue::Null),
            FieldKind::Coordinates => parse_coordinates(input)
                .map(FieldValue::Coordinates)
                .ok_or_else(|| invalid(format!("'{}' is not a 'lat, lng' pair in range", input))),
            FieldKind::Reference(kind) if input.is_empty() => {
                debug!("Clearing {} reference {}", kind, field);
                Ok(FieldValue::Null)
            }
            FieldKind::Reference(kind) => {
                Ok(FieldValue::Reference(self.references.resolve(*kind, input)))
            }
            FieldKind::DateTime if input.is_empty() => Ok(FieldValue::Null),
            FieldKind::DateTime => parse_datetime(input)
                .map(FieldValue::Text)
                .ok_or_else(|| invalid(format!("'{}' is not a date and time", input))),
        }
    }
}

fn uploaded_url(body: &Value) -> Result<String, ApiError> {
    body.get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode("No URL returned from server".to_string()))
}

fn parse_coordinates(input: &str) -> Option<Coordinates> {
    let (lat, lng) = input.split_once(',')?;
    let coords = Coordinates::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    coords.is_valid().then_some(coords)
}

/// RFC 3339 is kept as given; `YYYY-MM-DD HH:MM` forms are read as UTC
fn parse_datetime(input: &str) -> Option<String> {
    if DateTime::parse_from_rfc3339(input).is_ok() {
        return Some(input.to_string());
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}
