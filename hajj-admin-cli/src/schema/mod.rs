//! Entity schema descriptors
//!
//! Every admin entity (ambulance, clinic, camp, ...) is described by one
//! `EntitySchema`. The table controller, the filter, the import validator and
//! the template writer are all driven by these descriptors instead of having
//! per-entity code.

pub mod registry;

pub use registry::{all_schemas, find_schema, schema_keys};

use crate::api::models::{Draft, FieldValue};

/// Entity types that other records point at by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    Location,
    Branch,
    Country,
}

impl ReferenceKind {
    /// Collection endpoint the reference list is fetched from
    pub fn endpoint(&self) -> &'static str {
        match self {
            ReferenceKind::Location => "location",
            ReferenceKind::Branch => "branch",
            ReferenceKind::Country => "camp/countries/list",
        }
    }

    /// Field holding the human-readable name
    pub fn name_field(&self) -> &'static str {
        "name"
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Location => "location",
            ReferenceKind::Branch => "branch",
            ReferenceKind::Country => "country",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One allowed value of an enumerated field
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    pub value: String,
    pub label: String,
}

impl EnumOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label is its value
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// How a field's value is interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    Enum(Vec<EnumOption>),
    Coordinates,
    Reference(ReferenceKind),
    /// ISO-8601 timestamp kept as text
    DateTime,
}

impl FieldKind {
    pub fn reference_kind(&self) -> Option<ReferenceKind> {
        match self {
            FieldKind::Reference(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Value a fresh add-form starts with
    pub fn empty_value(&self) -> FieldValue {
        match self {
            FieldKind::Coordinates => FieldValue::Null,
            _ => FieldValue::Text(String::new()),
        }
    }
}

/// A field of an entity record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub title: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: &'static str, title: &'static str, kind: FieldKind) -> Self {
        Self { name, title, kind }
    }
}

/// Validation applied to one spreadsheet column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRule {
    /// Free text; only presence is checked for required columns
    Text,
    /// Must be one of the given values
    Enum(Vec<String>),
    /// Must name an existing record of the given kind
    Reference(ReferenceKind),
    Latitude,
    Longitude,
}

/// A column of the bulk-import spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub struct ImportColumn {
    pub name: &'static str,
    pub required: bool,
    pub rule: ColumnRule,
    /// Value written in the template's example row
    pub sample: &'static str,
    /// Template column width (characters)
    pub width: f64,
}

impl ImportColumn {
    pub fn required(name: &'static str, rule: ColumnRule, sample: &'static str) -> Self {
        Self {
            name,
            required: true,
            rule,
            sample,
            width: 30.0,
        }
    }

    pub fn optional(name: &'static str, rule: ColumnRule, sample: &'static str) -> Self {
        Self {
            name,
            required: false,
            rule,
            sample,
            width: 20.0,
        }
    }
}

/// Spreadsheet contract of an entity's bulk-upload endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub columns: Vec<ImportColumn>,
}

impl ImportSpec {
    pub fn required_columns(&self) -> Vec<&'static str> {
        self.columns.iter().filter(|c| c.required).map(|c| c.name).collect()
    }

    pub fn optional_columns(&self) -> Vec<&'static str> {
        self.columns.iter().filter(|c| !c.required).map(|c| c.name).collect()
    }

    /// Template header: required columns first, then optional ones
    pub fn header(&self) -> Vec<&ImportColumn> {
        let mut cols: Vec<&ImportColumn> = self.columns.iter().filter(|c| c.required).collect();
        cols.extend(self.columns.iter().filter(|c| !c.required));
        cols
    }

    /// Reference kinds the validator needs caches for
    pub fn reference_kinds(&self) -> Vec<ReferenceKind> {
        let mut kinds: Vec<ReferenceKind> = self
            .columns
            .iter()
            .filter_map(|c| match c.rule {
                ColumnRule::Reference(kind) => Some(kind),
                _ => None,
            })
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// A field whose value is the URL of a file uploaded to its own endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub field: &'static str,
    /// Path below the backend URL (e.g. "countries/upload-flag")
    pub endpoint: &'static str,
    /// Multipart field name the server reads the file from
    pub part: &'static str,
}

/// Descriptor of one admin entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    /// Command-line name (e.g. "bus-station")
    pub key: &'static str,
    pub label: &'static str,
    /// Plural used in user messages ("Successfully uploaded 3 clinics")
    pub plural: &'static str,
    /// Collection path segment on the server (e.g. "busStation")
    pub endpoint: &'static str,
    pub fields: Vec<FieldDef>,
    /// Fields matched by the free-text search
    pub search_fields: Vec<&'static str>,
    pub import: Option<ImportSpec>,
    /// Whether even list calls need the bearer credential
    pub list_requires_auth: bool,
    /// Key wrapping the record array in list responses, if any
    pub list_envelope: Option<&'static str>,
    /// Statuses accepted by the collection's bulk-update endpoint
    pub bulk_statuses: Vec<&'static str>,
    pub file_uploads: Vec<FileUpload>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_kind(&self, name: &str) -> Option<&FieldKind> {
        self.field(name).map(|f| &f.kind)
    }

    /// Reference kinds needed to display and import this entity
    pub fn reference_kinds(&self) -> Vec<ReferenceKind> {
        let mut kinds: Vec<ReferenceKind> = self
            .fields
            .iter()
            .filter_map(|f| f.kind.reference_kind())
            .collect();
        if let Some(import) = &self.import {
            kinds.extend(import.reference_kinds());
        }
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// The add-form's initial, empty shape
    pub fn empty_draft(&self) -> Draft {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.kind.empty_value()))
            .collect()
    }

    pub fn file_upload(&self, field: &str) -> Option<&FileUpload> {
        self.file_uploads.iter().find(|u| u.field == field)
    }

    pub fn supports_import(&self) -> bool {
        self.import.is_some()
    }

    pub fn template_file_name(&self) -> String {
        format!("{}_upload_template.xlsx", self.key.replace('-', "_"))
    }

    /// Replace the allowed values of an enumerated field (and its import column)
    pub fn override_enum(&mut self, field: &str, options: Vec<EnumOption>) -> bool {
        let Some(def) = self.fields.iter_mut().find(|f| f.name == field) else {
            return false;
        };
        if !matches!(def.kind, FieldKind::Enum(_)) {
            return false;
        }

        let values: Vec<String> = options.iter().map(|o| o.value.clone()).collect();
        def.kind = FieldKind::Enum(options);

        if let Some(import) = &mut self.import {
            for column in import.columns.iter_mut().filter(|c| c.name == field) {
                column.rule = ColumnRule::Enum(values.clone());
            }
        }
        true
    }
}
