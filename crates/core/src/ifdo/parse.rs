//! Turns an iFDO document into flat column maps plus pending relations.
//!
//! Nothing here touches the database: relations are returned as data for
//! the import repository to get-or-create inside its transaction.

use serde_json::{Map, Value};

use super::mapping::{json_kind, FieldKind, RelationKind, Section, IFDO_MAPPING};
use crate::error::CoreError;
use crate::vocab;

pub const HEADER_KEY: &str = "image-set-header";
pub const ITEMS_KEY: &str = "image-set-items";

/// A single relation to resolve and store in `column` as a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRelation {
    pub column: &'static str,
    pub kind: RelationKind,
    pub data: Map<String, Value>,
}

/// Rows to resolve and link through a join table.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRelationList {
    pub kind: RelationKind,
    pub items: Vec<Map<String, Value>>,
}

/// One header or item, mapped onto catalog columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSection {
    pub fields: Map<String, Value>,
    pub relations: Vec<PendingRelation>,
    pub lists: Vec<PendingRelationList>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    /// The item key, i.e. the image file name.
    pub key: String,
    pub section: ParsedSection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub header: ParsedSection,
    pub items: Vec<ParsedItem>,
}

/// Map every known key of `section` that applies to `target`.
///
/// Unknown keys are ignored. Null and empty relation values are skipped.
pub fn parse_section(
    section: &Map<String, Value>,
    target: Section,
) -> Result<ParsedSection, CoreError> {
    let mut parsed = ParsedSection::default();

    for mapping in IFDO_MAPPING {
        if !mapping.location.applies_to(target) {
            continue;
        }
        let Some(value) = section.get(mapping.key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let in_key = |err: CoreError| match err {
            CoreError::Validation(msg) => CoreError::Validation(format!("{}: {msg}", mapping.key)),
            other => other,
        };

        match mapping.kind {
            FieldKind::Scalar => {
                parsed.fields.insert(mapping.column.to_string(), value.clone());
            }
            FieldKind::Vocabulary => {
                let raw = value.as_str().ok_or_else(|| {
                    CoreError::Validation(format!(
                        "{}: expected a string, got {}",
                        mapping.key,
                        json_kind(value)
                    ))
                })?;
                let normalize = vocab::normalizer_for(mapping.column).ok_or_else(|| {
                    CoreError::Internal(format!("No vocabulary for column {}", mapping.column))
                })?;
                let canonical = normalize(raw).map_err(in_key)?;
                parsed
                    .fields
                    .insert(mapping.column.to_string(), Value::String(canonical.to_string()));
            }
            FieldKind::Relation(kind) => {
                if is_empty(value) {
                    continue;
                }
                let data = kind.translate(value).map_err(in_key)?;
                parsed.relations.push(PendingRelation {
                    column: mapping.column,
                    kind,
                    data,
                });
            }
            FieldKind::RelationList(kind) => {
                let elements = value.as_array().ok_or_else(|| {
                    CoreError::Validation(format!(
                        "{}: expected an array, got {}",
                        mapping.key,
                        json_kind(value)
                    ))
                })?;
                if elements.is_empty() {
                    continue;
                }
                let items = elements
                    .iter()
                    .map(|element| kind.translate(element))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(in_key)?;
                parsed.lists.push(PendingRelationList { kind, items });
            }
        }
    }

    Ok(parsed)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(object) => object.is_empty(),
        Value::Array(array) => array.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// The object carrying an item's fields.
///
/// Video items are arrays whose first element holds the defaults for the
/// whole clip; later per-frame entries are not stored.
fn item_object<'a>(key: &str, value: &'a Value) -> Result<&'a Map<String, Value>, CoreError> {
    let candidate = match value {
        Value::Array(frames) => frames.first().ok_or_else(|| {
            CoreError::Validation(format!("Item '{key}' is an empty array"))
        })?,
        other => other,
    };
    candidate.as_object().ok_or_else(|| {
        CoreError::Validation(format!(
            "Item '{key}' must be an object, got {}",
            json_kind(candidate)
        ))
    })
}

/// Split and map a whole document.
///
/// Fails before any database work when the header or the items are missing
/// or empty. Each item's name defaults to its key.
pub fn parse_document(document: &Value) -> Result<ParsedDocument, CoreError> {
    let missing = || {
        CoreError::Validation(
            "Image set header and image set items are required in IFDO data".to_string(),
        )
    };
    let header = document
        .get(HEADER_KEY)
        .and_then(Value::as_object)
        .filter(|h| !h.is_empty())
        .ok_or_else(missing)?;
    let items = document
        .get(ITEMS_KEY)
        .and_then(Value::as_object)
        .filter(|i| !i.is_empty())
        .ok_or_else(missing)?;

    let header = parse_section(header, Section::Header)?;

    let items = items
        .iter()
        .map(|(key, value)| -> Result<ParsedItem, CoreError> {
            let object = item_object(key, value)?;
            let mut section = parse_section(object, Section::Items).map_err(|err| match err {
                CoreError::Validation(msg) => CoreError::Validation(format!("Item '{key}': {msg}")),
                other => other,
            })?;
            section
                .fields
                .entry("name")
                .or_insert_with(|| Value::String(key.clone()));
            Ok(ParsedItem {
                key: key.clone(),
                section,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedDocument { header, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "image-set-header": {
                "image-set-name": "Dive 42",
                "image-set-uuid": "8f9c0a36-1f5e-4c8e-9a53-2f6f1b7d4e10",
                "image-set-handle": "https://hdl.handle.net/20.500/42",
                "image-set-ifdo-version": "v2.1.0",
                "image-deployment": "Survey",
                "image-context": { "name": "Habitat mapping" },
                "image-creators": [{ "name": "A. Diver" }, { "name": "B. Pilot", "uri": "https://orcid.org/0" }],
                "image-set-related-materials": [{ "related-material-resource": "https://doi.org/x" }]
            },
            "image-set-items": {
                "IMG_0001.jpg": {
                    "image-latitude": 50.1,
                    "image-longitude": -4.2,
                    "image-hash-sha256": "abc"
                }
            }
        })
    }

    #[test]
    fn header_fields_are_mapped() {
        let doc = parse_document(&minimal()).unwrap();
        assert_eq!(doc.header.fields["name"], "Dive 42");
        assert_eq!(doc.header.fields["ifdo_version"], "v2.1.0");
        assert_eq!(doc.header.fields["deployment"], "survey");
        assert_eq!(doc.header.fields["uuid"], "8f9c0a36-1f5e-4c8e-9a53-2f6f1b7d4e10");
    }

    #[test]
    fn header_relations_are_pending() {
        let doc = parse_document(&minimal()).unwrap();
        assert_eq!(doc.header.relations.len(), 1);
        assert_eq!(doc.header.relations[0].column, "context_id");
        assert_eq!(doc.header.relations[0].data["name"], "Habitat mapping");

        let kinds: Vec<_> = doc.header.lists.iter().map(|l| l.kind).collect();
        assert!(kinds.contains(&RelationKind::Creator));
        assert!(kinds.contains(&RelationKind::RelatedMaterial));
        let creators = doc.header.lists.iter().find(|l| l.kind == RelationKind::Creator).unwrap();
        assert_eq!(creators.items.len(), 2);
    }

    #[test]
    fn item_name_defaults_to_key() {
        let doc = parse_document(&minimal()).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].key, "IMG_0001.jpg");
        assert_eq!(doc.items[0].section.fields["name"], "IMG_0001.jpg");
        assert_eq!(doc.items[0].section.fields["latitude"], 50.1);
    }

    #[test]
    fn header_only_keys_ignored_in_items() {
        let mut raw = minimal();
        raw["image-set-items"]["IMG_0001.jpg"]["image-set-handle"] = json!("nope");
        let doc = parse_document(&raw).unwrap();
        assert!(!doc.items[0].section.fields.contains_key("handle"));
    }

    #[test]
    fn video_item_uses_first_frame() {
        let mut raw = minimal();
        raw["image-set-items"]["clip.mp4"] = json!([
            { "image-acquisition": "video", "image-entropy": 0.5 },
            { "image-entropy": 0.9 }
        ]);
        let doc = parse_document(&raw).unwrap();
        let clip = doc.items.iter().find(|i| i.key == "clip.mp4").unwrap();
        assert_eq!(clip.section.fields["acquisition"], "video");
        assert_eq!(clip.section.fields["entropy"], 0.5);
    }

    #[test]
    fn missing_items_rejected() {
        let err = parse_document(&json!({ "image-set-header": { "image-set-name": "x" } }))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Image set header and image set items are required in IFDO data"
        );
    }

    #[test]
    fn empty_header_rejected() {
        assert_matches!(
            parse_document(&json!({ "image-set-header": {}, "image-set-items": { "a": {} } })),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn bad_vocabulary_names_the_item_and_field() {
        let mut raw = minimal();
        raw["image-set-items"]["IMG_0001.jpg"]["image-quality"] = json!("excellent");
        let err = parse_document(&raw).unwrap_err().to_string();
        assert!(err.starts_with("Item 'IMG_0001.jpg': image-quality: Invalid quality"));
        assert!(err.contains("raw, processed, product"));
    }

    #[test]
    fn empty_relation_skipped() {
        let section = json!({ "image-project": {}, "image-creators": [] });
        let parsed = parse_section(section.as_object().unwrap(), Section::Header).unwrap();
        assert!(parsed.relations.is_empty());
        assert!(parsed.lists.is_empty());
    }

    #[test]
    fn non_array_relation_list_rejected() {
        let section = json!({ "image-creators": { "name": "A" } });
        let err = parse_section(section.as_object().unwrap(), Section::Header).unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }
}
