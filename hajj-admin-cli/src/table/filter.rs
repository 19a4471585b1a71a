//! Free-text search over loaded records

use crate::api::Record;
use crate::schema::EntitySchema;

use super::reference::ReferenceCache;

/// Records whose searchable fields contain `search` (case-insensitive).
///
/// Pure and order-preserving. Blank search text returns every record.
pub fn filter_records<'a>(
    records: &'a [Record],
    schema: &EntitySchema,
    search: &str,
    refs: &ReferenceCache,
) -> Vec<&'a Record> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| matches(record, schema, &needle, refs))
        .collect()
}

fn matches(record: &Record, schema: &EntitySchema, needle: &str, refs: &ReferenceCache) -> bool {
    schema.search_fields.iter().any(|field| {
        record
            .get(field)
            .and_then(|value| refs.field_text(schema.field_kind(field), value))
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::normalize::ReferenceEntry;
    use crate::api::{FieldValue, Reference};
    use crate::schema::{ReferenceKind, find_schema};

    fn clinics() -> Vec<Record> {
        vec![
            Record::new("c1")
                .with_field("name", FieldValue::text("Mina Clinic"))
                .with_field("ref", FieldValue::Reference(Reference::Id("loc1".into()))),
            Record::new("c2")
                .with_field("name", FieldValue::text("Arafat Clinic"))
                .with_field("center", FieldValue::text("North")),
            Record::new("c3")
                .with_field("name", FieldValue::text("Field Hospital"))
                .with_field("ref", FieldValue::Reference(Reference::Id("missing".into()))),
        ]
    }

    fn refs() -> ReferenceCache {
        let mut refs = ReferenceCache::new();
        refs.insert(
            ReferenceKind::Location,
            vec![ReferenceEntry::new("loc1", "Muzdalifah")],
        );
        refs
    }

    fn ids(records: Vec<&Record>) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_blank_search_returns_everything_in_order() {
        let schema = find_schema("clinic").unwrap();
        let records = clinics();
        assert_eq!(ids(filter_records(&records, schema, "   ", &refs())), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_case_insensitive_and_order_preserving() {
        let schema = find_schema("clinic").unwrap();
        let records = clinics();
        assert_eq!(ids(filter_records(&records, schema, "CLINIC", &refs())), vec!["c1", "c2"]);
        assert_eq!(ids(filter_records(&records, schema, " north ", &refs())), vec!["c2"]);
    }

    #[test]
    fn test_matches_resolved_reference_name_but_not_placeholder() {
        let schema = find_schema("clinic").unwrap();
        let records = clinics();
        assert_eq!(ids(filter_records(&records, schema, "muzda", &refs())), vec!["c1"]);
        assert!(filter_records(&records, schema, "n/a", &refs()).is_empty());
        assert!(filter_records(&records, schema, "loc1", &refs()).is_empty());
    }

    #[test]
    fn test_filter_is_pure() {
        let schema = find_schema("clinic").unwrap();
        let records = clinics();
        let before = records.clone();
        let first = ids(filter_records(&records, schema, "clinic", &refs()));
        let second = ids(filter_records(&records, schema, "clinic", &refs()));
        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn test_every_result_contains_the_search_text() {
        let schema = find_schema("clinic").unwrap();
        let records = clinics();
        let refs = refs();
        for record in filter_records(&records, schema, "a", &refs) {
            let hit = schema.search_fields.iter().any(|f| {
                record
                    .get(f)
                    .and_then(|v| refs.field_text(schema.field_kind(f), v))
                    .is_some_and(|t| t.to_lowercase().contains('a'))
            });
            assert!(hit, "{} should not match", record.id);
        }
    }
}
