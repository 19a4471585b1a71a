//! Normalization of server JSON into the canonical `Record` shape
//!
//! Every response that carries records passes through here, so the table
//! state never depends on which endpoint produced it or whether the server
//! populated reference fields.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ApiError;
use super::models::{Coordinates, FieldValue, ID_KEY, Record, Reference};
use crate::schema::{EntitySchema, FieldKind, ReferenceKind};

/// An `{id, name}` pair from a reference collection
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub id: String,
    pub name: String,
}

impl ReferenceEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Normalize a list response into records.
///
/// Accepts a bare array or, for schemas with a `list_envelope`, an object
/// wrapping the array under that key.
pub fn normalize_collection(schema: &EntitySchema, value: Value) -> Result<Vec<Record>, ApiError> {
    let items = unwrap_collection(value, schema.list_envelope)?;
    items
        .into_iter()
        .map(|item| normalize_record(schema, item))
        .collect()
}

/// Normalize a single record object
pub fn normalize_record(schema: &EntitySchema, value: Value) -> Result<Record, ApiError> {
    let Value::Object(map) = value else {
        return Err(ApiError::Decode(format!(
            "expected a {} object, got {}",
            schema.label,
            json_type(&value)
        )));
    };

    let id = map
        .get(ID_KEY)
        .and_then(id_string)
        .ok_or_else(|| ApiError::Decode(format!("{} record without {}", schema.label, ID_KEY)))?;

    let mut fields = BTreeMap::new();
    for (name, raw) in map {
        if name == ID_KEY {
            continue;
        }
        let value = match schema.field_kind(&name) {
            Some(kind) => normalize_field(kind, raw),
            None => normalize_untyped(raw),
        };
        fields.insert(name, value);
    }

    // Declared fields the server omitted still get a slot so editing can set them
    for def in &schema.fields {
        fields.entry(def.name.to_string()).or_insert(FieldValue::Null);
    }

    Ok(Record { id, fields })
}

/// Normalize one field according to its declared kind
pub fn normalize_field(kind: &FieldKind, raw: Value) -> FieldValue {
    match kind {
        FieldKind::Text | FieldKind::Enum(_) | FieldKind::DateTime => normalize_untyped(raw),
        FieldKind::Number => match &raw {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Number)
                .unwrap_or_else(|_| normalize_untyped(raw)),
            _ => normalize_untyped(raw),
        },
        FieldKind::Coordinates => normalize_coordinates(raw),
        FieldKind::Reference(_) => match normalize_reference(&raw) {
            Some(reference) => FieldValue::Reference(reference),
            None if is_blank(&raw) => FieldValue::Null,
            None => FieldValue::Json(raw),
        },
    }
}

/// Accept either a bare id or a populated `{_id, name}` object
pub fn normalize_reference(raw: &Value) -> Option<Reference> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(Reference::Id(s.clone())),
        Value::Number(n) => Some(Reference::Id(n.to_string())),
        Value::Object(map) => {
            let id = map.get(ID_KEY).and_then(id_string)?;
            match map.get("name").and_then(Value::as_str) {
                Some(name) => Some(Reference::Expanded {
                    id,
                    name: name.to_string(),
                }),
                None => Some(Reference::Id(id)),
            }
        }
        _ => None,
    }
}

/// Extract `{id, name}` pairs from a reference collection response
pub fn normalize_reference_list(kind: ReferenceKind, value: Value) -> Result<Vec<ReferenceEntry>, ApiError> {
    let items = unwrap_collection(value, None)?;
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let id = item.get(ID_KEY).and_then(id_string);
        let name = item.get(kind.name_field()).and_then(Value::as_str);
        match (id, name) {
            (Some(id), Some(name)) => entries.push(ReferenceEntry::new(id, name)),
            _ => log::debug!("Skipping {} entry without id or name: {}", kind, item),
        }
    }
    Ok(entries)
}

fn normalize_coordinates(raw: Value) -> FieldValue {
    if is_blank(&raw) {
        return FieldValue::Null;
    }
    let parsed = match &raw {
        Value::Object(map) => {
            let lat = map.get("lat").and_then(number_like);
            let lng = map.get("lng").and_then(number_like);
            lat.zip(lng).map(|(lat, lng)| Coordinates::new(lat, lng))
        }
        _ => None,
    };
    match parsed {
        Some(c) => FieldValue::Coordinates(c),
        None => FieldValue::Json(raw),
    }
}

fn normalize_untyped(raw: Value) -> FieldValue {
    match raw {
        Value::Null => FieldValue::Null,
        Value::String(s) => FieldValue::Text(s),
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(ref n) => match n.as_f64() {
            Some(f) => FieldValue::Number(f),
            None => FieldValue::Json(raw),
        },
        other => FieldValue::Json(other),
    }
}

fn unwrap_collection(value: Value, envelope: Option<&str>) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            let key = envelope.unwrap_or("data");
            match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Err(ApiError::Decode(format!(
                    "expected an array under '{}', got {}",
                    key,
                    json_type(&other)
                ))),
                None => Err(ApiError::Decode(format!(
                    "expected an array or an object with '{}'",
                    key
                ))),
            }
        }
        other => Err(ApiError::Decode(format!(
            "expected an array, got {}",
            json_type(&other)
        ))),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.values().all(is_blank),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
