//! Annotations on images and the label vocabulary applied to them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::annotation::{self, Shape};
use ifdo_core::error::CoreError;
use ifdo_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A row from the `annotations` table.
///
/// `coordinates` is a JSON list of float lists, one per frame.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub uuid: Uuid,
    pub image_id: DbId,
    pub annotation_set_id: Option<DbId>,
    pub annotation_platform: Option<String>,
    pub shape: String,
    pub coordinates: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateAnnotation {
    pub uuid: Option<Uuid>,
    pub image_id: DbId,
    pub annotation_set_id: Option<DbId>,
    pub annotation_platform: Option<String>,
    pub shape: String,
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateAnnotation {
    pub image_id: Option<DbId>,
    pub annotation_set_id: Option<DbId>,
    pub annotation_platform: Option<String>,
    pub shape: Option<String>,
    pub coordinates: Option<Vec<Vec<f64>>>,
}

fn parse_coordinates(value: &Value) -> Result<Vec<Vec<f64>>, CoreError> {
    serde_json::from_value(value.clone()).map_err(|_| {
        CoreError::Validation("coordinates must be a list of lists of numbers".to_string())
    })
}

impl Resource for Annotation {
    const ENTITY: &'static str = "Annotation";
    const TABLE: &'static str = "annotations";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "uuid",
        "image_id",
        "annotation_set_id",
        "annotation_platform",
        "shape",
        "coordinates",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "uuid",
        "image_id",
        "annotation_set_id",
        "annotation_platform",
        "shape",
        "coordinates",
    ];

    fn id(&self) -> DbId {
        self.id
    }

    /// Shape and coordinates are checked together, taking whichever of the
    /// two the payload leaves out from the stored row.
    fn validate(payload: &mut Map<String, Value>, existing: Option<&Self>) -> Result<(), CoreError> {
        if !payload.contains_key("shape") && !payload.contains_key("coordinates") {
            return Ok(());
        }

        let shape = match (payload.get("shape"), existing) {
            (Some(Value::String(raw)), _) => Shape::parse(raw)?,
            (Some(_), _) => {
                return Err(CoreError::Validation("shape must be a string".to_string()))
            }
            (None, Some(row)) => Shape::parse(&row.shape)?,
            (None, None) => {
                return Err(CoreError::Validation("shape is required".to_string()))
            }
        };
        let coordinates = match (payload.get("coordinates"), existing) {
            (Some(value), _) => parse_coordinates(value)?,
            (None, Some(row)) => parse_coordinates(&row.coordinates)?,
            (None, None) => Vec::new(),
        };

        annotation::validate_coordinates(shape, &coordinates)?;
        payload.insert("shape".to_string(), Value::String(shape.as_str().to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AnnotationLabel
// ---------------------------------------------------------------------------

/// A label applied to an annotation, optionally by a known annotator.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationLabel {
    pub id: DbId,
    pub uuid: Uuid,
    pub annotation_id: DbId,
    pub label_id: DbId,
    pub annotator_id: Option<DbId>,
    pub creation_datetime: Option<Timestamp>,
    pub confidence: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateAnnotationLabel {
    pub uuid: Option<Uuid>,
    pub annotation_id: DbId,
    pub label_id: DbId,
    pub annotator_id: Option<DbId>,
    pub creation_datetime: Option<Timestamp>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateAnnotationLabel {
    pub annotation_id: Option<DbId>,
    pub label_id: Option<DbId>,
    pub annotator_id: Option<DbId>,
    pub creation_datetime: Option<Timestamp>,
    pub confidence: Option<f64>,
}

impl Resource for AnnotationLabel {
    const ENTITY: &'static str = "Annotation label";
    const TABLE: &'static str = "annotation_labels";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "uuid",
        "annotation_id",
        "label_id",
        "annotator_id",
        "creation_datetime",
        "confidence",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "uuid",
        "annotation_id",
        "label_id",
        "annotator_id",
        "creation_datetime",
        "confidence",
    ];

    fn id(&self) -> DbId {
        self.id
    }

    fn validate(payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        match payload.get("confidence") {
            None => Ok(()),
            Some(value) => match value.as_f64() {
                Some(confidence) => annotation::validate_confidence(Some(confidence)),
                None => Err(CoreError::Validation("confidence must be a number".to_string())),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Label / Annotator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Label {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub info: Option<String>,
    pub parent_label_name: Option<String>,
    pub lowest_taxonomic_name: Option<String>,
    /// WoRMS AphiaID of the lowest taxonomic rank.
    pub lowest_aphia_id: Option<String>,
    pub identification_qualifier: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateLabel {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub info: Option<String>,
    pub parent_label_name: Option<String>,
    pub lowest_taxonomic_name: Option<String>,
    pub lowest_aphia_id: Option<String>,
    pub identification_qualifier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateLabel {
    pub name: Option<String>,
    pub info: Option<String>,
    pub parent_label_name: Option<String>,
    pub lowest_taxonomic_name: Option<String>,
    pub lowest_aphia_id: Option<String>,
    pub identification_qualifier: Option<String>,
}

impl Resource for Label {
    const ENTITY: &'static str = "Label";
    const TABLE: &'static str = "labels";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "uuid",
        "name",
        "info",
        "parent_label_name",
        "lowest_taxonomic_name",
        "lowest_aphia_id",
        "identification_qualifier",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "uuid",
        "name",
        "info",
        "parent_label_name",
        "lowest_taxonomic_name",
        "lowest_aphia_id",
        "identification_qualifier",
    ];

    fn id(&self) -> DbId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Annotator {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateAnnotator {
    pub uuid: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateAnnotator {
    pub name: Option<String>,
}

impl Resource for Annotator {
    const ENTITY: &'static str = "Annotator";
    const TABLE: &'static str = "annotators";
    const COLUMNS: &'static [&'static str] = &["id", "uuid", "name", "created_at", "updated_at"];
    const WRITABLE: &'static [&'static str] = &["uuid", "name"];

    fn id(&self) -> DbId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// AnnotationSet
// ---------------------------------------------------------------------------

/// A named collection of annotations, linkable to several datasets.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationSet {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub handle: Option<String>,
    #[sqlx(rename = "abstract")]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub objective: Option<String>,
    pub target_environment: Option<String>,
    pub curation_protocol: Option<String>,
    pub version: Option<String>,
    pub local_path: Option<String>,
    pub context_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub pi_id: Option<DbId>,
    pub license_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateAnnotationSet {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub handle: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub objective: Option<String>,
    pub target_environment: Option<String>,
    pub curation_protocol: Option<String>,
    pub version: Option<String>,
    pub local_path: Option<String>,
    pub context_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub pi_id: Option<DbId>,
    pub license_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateAnnotationSet {
    pub name: Option<String>,
    pub handle: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub objective: Option<String>,
    pub target_environment: Option<String>,
    pub curation_protocol: Option<String>,
    pub version: Option<String>,
    pub local_path: Option<String>,
    pub context_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub pi_id: Option<DbId>,
    pub license_id: Option<DbId>,
}

impl Resource for AnnotationSet {
    const ENTITY: &'static str = "Annotation set";
    const TABLE: &'static str = "annotation_sets";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "uuid",
        "name",
        "handle",
        "abstract",
        "objective",
        "target_environment",
        "curation_protocol",
        "version",
        "local_path",
        "context_id",
        "project_id",
        "pi_id",
        "license_id",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &[
        "uuid",
        "name",
        "handle",
        "abstract",
        "objective",
        "target_environment",
        "curation_protocol",
        "version",
        "local_path",
        "context_id",
        "project_id",
        "pi_id",
        "license_id",
    ];

    fn id(&self) -> DbId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn stored_polygon() -> Annotation {
        Annotation {
            id: 1,
            uuid: Uuid::new_v4(),
            image_id: 1,
            annotation_set_id: None,
            annotation_platform: None,
            shape: "polygon".to_string(),
            coordinates: json!([[0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 0.0]]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // -- Annotation::validate -----------------------------------------------

    #[test]
    fn shape_is_normalized_on_create() {
        let mut body = payload(json!({ "shape": "Single-Pixel", "coordinates": [[3.0, 4.0]] }));
        Annotation::validate(&mut body, None).unwrap();
        assert_eq!(body["shape"], "single-pixel");
    }

    #[test]
    fn circle_radius_checked_on_create() {
        let mut body = payload(json!({ "shape": "circle", "coordinates": [[3.0, 4.0, 0.0]] }));
        assert_matches!(Annotation::validate(&mut body, None), Err(CoreError::Validation(_)));
    }

    #[test]
    fn update_checks_new_coordinates_against_stored_shape() {
        let row = stored_polygon();
        let mut open_ring = payload(json!({ "coordinates": [[0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 1.0, 1.0]] }));
        assert_matches!(
            Annotation::validate(&mut open_ring, Some(&row)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn update_checks_new_shape_against_stored_coordinates() {
        let row = stored_polygon();
        let mut body = payload(json!({ "shape": "single-pixel" }));
        assert!(Annotation::validate(&mut body, Some(&row)).is_err());
    }

    #[test]
    fn unrelated_update_skips_shape_checks() {
        let row = stored_polygon();
        let mut body = payload(json!({ "annotation_platform": "BIIGLE" }));
        assert!(Annotation::validate(&mut body, Some(&row)).is_ok());
    }

    #[test]
    fn malformed_coordinates_rejected() {
        let mut body = payload(json!({ "shape": "polyline", "coordinates": ["a", "b"] }));
        assert_matches!(Annotation::validate(&mut body, None), Err(CoreError::Validation(_)));
    }

    // -- AnnotationLabel::validate ------------------------------------------

    #[test]
    fn confidence_range() {
        let mut ok = payload(json!({ "confidence": 0.75 }));
        assert!(AnnotationLabel::validate(&mut ok, None).is_ok());
        let mut high = payload(json!({ "confidence": 1.5 }));
        assert!(AnnotationLabel::validate(&mut high, None).is_err());
        let mut text = payload(json!({ "confidence": "high" }));
        assert!(AnnotationLabel::validate(&mut text, None).is_err());
    }

    #[test]
    fn annotation_set_abstract_uses_column_name() {
        let input = CreateAnnotationSet {
            name: "Megafauna".to_string(),
            abstract_text: Some("Counts".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["abstract"], "Counts");
    }
}
