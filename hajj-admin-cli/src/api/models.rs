//! Canonical record representation shared by every entity type

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};

/// Wire name of the server-assigned identifier
pub const ID_KEY: &str = "_id";

/// Placeholder shown when a reference cannot be resolved to a name
pub const NOT_AVAILABLE: &str = "N/A";

/// A `{lat, lng}` coordinate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// A foreign key to another entity's record
///
/// The server returns either the bare id or a populated `{_id, name}` object;
/// both are kept as-is so the display layer can prefer the populated name.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Id(String),
    Expanded { id: String, name: String },
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Id(id) => id,
            Reference::Expanded { id, .. } => id,
        }
    }

    /// Name carried by a populated reference
    pub fn expanded_name(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Expanded { name, .. } => Some(name),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Reference::Id(id) => Value::String(id.clone()),
            Reference::Expanded { id, name } => json!({ ID_KEY: id, "name": name }),
        }
    }
}

/// A single field value of a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Coordinates(Coordinates),
    Reference(Reference),
    /// Server data the schema does not describe, kept verbatim
    Json(Value),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Null, empty text, or whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            FieldValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => format_number_json(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Coordinates(c) => json!({ "lat": c.lat, "lng": c.lng }),
            FieldValue::Reference(r) => r.to_json(),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Request-body form: references are sent as bare ids
    pub fn to_request_json(&self) -> Value {
        match self {
            FieldValue::Reference(r) => Value::String(r.id().to_string()),
            other => other.to_json(),
        }
    }

    /// Plain-text rendering for non-reference values.
    ///
    /// References render as their populated name or the placeholder; callers
    /// that hold a reference cache should resolve through it instead.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Coordinates(c) => c.to_string(),
            FieldValue::Reference(r) => r.expanded_name().unwrap_or(NOT_AVAILABLE).to_string(),
            FieldValue::Json(v) => v.to_string(),
        }
    }
}

/// Render whole numbers without a trailing `.0`
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_number_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// One persisted entity instance
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Full JSON form, including the id and populated references
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        Value::Object(map)
    }

    /// Body of an update call; references collapse to their ids
    pub fn to_request_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_request_json());
        }
        Value::Object(map)
    }
}

/// Field values of a record that does not exist yet (no id)
pub type Draft = BTreeMap<String, FieldValue>;

pub fn draft_to_json(draft: &Draft) -> Value {
    let map: Map<String, Value> = draft
        .iter()
        .map(|(name, value)| (name.clone(), value.to_request_json()))
        .collect();
    Value::Object(map)
}

/// A spreadsheet handed to the bulk-upload endpoint
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name as chosen by the user (extension is significant)
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_to_json_includes_id_and_fields() {
        let record = Record::new("a1")
            .with_field("name", FieldValue::text("Mina Clinic"))
            .with_field("location", FieldValue::Coordinates(Coordinates::new(21.4, 39.8)))
            .with_field(
                "ref",
                FieldValue::Reference(Reference::Expanded {
                    id: "loc1".into(),
                    name: "Mina".into(),
                }),
            );

        let json = record.to_json();
        assert_eq!(json["_id"], "a1");
        assert_eq!(json["name"], "Mina Clinic");
        assert_eq!(json["location"]["lat"], 21.4);
        assert_eq!(json["ref"]["_id"], "loc1");
        assert_eq!(json["ref"]["name"], "Mina");
        assert_eq!(record.to_request_json()["ref"], "loc1");
    }

    #[test]
    fn test_whole_numbers_render_without_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(21.4225), "21.4225");
        assert_eq!(FieldValue::Number(7.0).to_json(), json!(7));
    }

    #[test]
    fn test_empty_values() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::text("  ").is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(21.4225, 39.8262).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
    }
}
