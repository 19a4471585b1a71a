//! Locally cached reference lists (locations, branches, countries)
//!
//! Fetched once when a table is mounted and used both to render reference
//! fields by name and to validate `*_name` columns during import.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::api::models::NOT_AVAILABLE;
use crate::api::normalize::{ReferenceEntry, normalize_reference_list};
use crate::api::{FieldValue, Reference, ResourceApi, Session};
use crate::schema::{FieldKind, ReferenceKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCache {
    lists: BTreeMap<ReferenceKind, Vec<ReferenceEntry>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every requested list; a failed fetch leaves that list empty
    pub async fn fetch(api: &dyn ResourceApi, session: &Session, kinds: &[ReferenceKind]) -> Self {
        let token = session.optional_bearer().await;
        let mut cache = Self::new();

        for &kind in kinds {
            let entries = match api.list(kind.endpoint(), token.as_ref()).await {
                Ok(value) => normalize_reference_list(kind, value),
                Err(e) => Err(e),
            };
            match entries {
                Ok(entries) => {
                    debug!("Cached {} {} entries", entries.len(), kind);
                    cache.insert(kind, entries);
                }
                Err(e) => {
                    log::error!("Failed to fetch {} list: {}", kind, e);
                    cache.insert(kind, Vec::new());
                }
            }
        }
        cache
    }

    pub fn insert(&mut self, kind: ReferenceKind, entries: Vec<ReferenceEntry>) {
        self.lists.insert(kind, entries);
    }

    pub fn entries(&self, kind: ReferenceKind) -> &[ReferenceEntry] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self, kind: ReferenceKind) -> bool {
        self.entries(kind).is_empty()
    }

    pub fn name_of(&self, kind: ReferenceKind, id: &str) -> Option<&str> {
        self.entries(kind)
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, kind: ReferenceKind, name: &str) -> Option<&ReferenceEntry> {
        let needle = name.trim().to_lowercase();
        self.entries(kind)
            .iter()
            .find(|e| e.name.trim().to_lowercase() == needle)
    }

    /// Turn user input (an id or a name) into a reference, populated when known
    pub fn resolve(&self, kind: ReferenceKind, input: &str) -> Reference {
        let input = input.trim();
        if let Some(name) = self.name_of(kind, input) {
            return Reference::Expanded {
                id: input.to_string(),
                name: name.to_string(),
            };
        }
        match self.find_by_name(kind, input) {
            Some(entry) => Reference::Expanded {
                id: entry.id.clone(),
                name: entry.name.clone(),
            },
            None => {
                warn!("No cached {} matches '{}', keeping it as a raw id", kind, input);
                Reference::Id(input.to_string())
            }
        }
    }

    /// Populated name, else the cached name, else nothing
    pub fn reference_name(&self, kind: ReferenceKind, reference: &Reference) -> Option<String> {
        reference
            .expanded_name()
            .map(str::to_string)
            .or_else(|| self.name_of(kind, reference.id()).map(str::to_string))
    }

    /// Text of a field value as it is shown and searched.
    ///
    /// `None` means "nothing to show": an empty value, or a reference that
    /// cannot be resolved to a name. Raw ids are never returned for
    /// reference fields.
    pub fn field_text(&self, kind: Option<&FieldKind>, value: &FieldValue) -> Option<String> {
        let reference_kind = kind.and_then(FieldKind::reference_kind);
        match (reference_kind, value) {
            (_, FieldValue::Null) => None,
            (Some(kind), FieldValue::Reference(r)) => self.reference_name(kind, r),
            (Some(kind), FieldValue::Text(id)) if !id.trim().is_empty() => {
                self.name_of(kind, id).map(str::to_string)
            }
            (Some(_), FieldValue::Text(_)) => None,
            (None, FieldValue::Reference(r)) => r.expanded_name().map(str::to_string),
            (_, other) => {
                let text = other.display();
                (!text.is_empty()).then_some(text)
            }
        }
    }

    /// Table cell rendering; unresolved references show the placeholder
    pub fn display(&self, kind: Option<&FieldKind>, value: &FieldValue) -> String {
        let is_reference = kind.and_then(FieldKind::reference_kind).is_some()
            || matches!(value, FieldValue::Reference(_));
        match self.field_text(kind, value) {
            Some(text) => text,
            None if is_reference && !value.is_empty() => NOT_AVAILABLE.to_string(),
            None => String::new(),
        }
    }
}
