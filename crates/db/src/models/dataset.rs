//! Datasets (iFDO image sets), the aggregate root of the catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::geometry;
use ifdo_core::types::{DbId, Timestamp};
use uuid::Uuid;

use super::common::{validate_shared_payload, with_shared_columns, CommonFields, LookupRefs, NestedLookups};
use super::fields::{ImageCreator, ImageSetRelatedMaterial};
use super::image::Image;
use crate::resource::{derive_if_changed, Resource};

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub handle: Option<String>,
    pub ifdo_version: Option<String>,
    pub local_path: Option<String>,
    pub min_latitude_degrees: Option<f64>,
    pub max_latitude_degrees: Option<f64>,
    pub min_longitude_degrees: Option<f64>,
    pub max_longitude_degrees: Option<f64>,
    /// GeoJSON polygon built from the four bounds.
    pub limits: Option<Value>,
    /// GeoJSON point built from latitude/longitude.
    pub location: Option<Value>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub common: CommonFields,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub refs: LookupRefs,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a dataset.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateDataset {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub handle: Option<String>,
    pub ifdo_version: Option<String>,
    pub local_path: Option<String>,
    pub min_latitude_degrees: Option<f64>,
    pub max_latitude_degrees: Option<f64>,
    pub min_longitude_degrees: Option<f64>,
    pub max_longitude_degrees: Option<f64>,
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(flatten)]
    pub refs: LookupRefs,
    #[serde(flatten)]
    pub nested: NestedLookups,
    /// Related materials created alongside the dataset.
    #[serde(default)]
    pub related_materials: Vec<Value>,
}

/// DTO for updating a dataset. Only present fields are written.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateDataset {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub ifdo_version: Option<String>,
    pub local_path: Option<String>,
    pub min_latitude_degrees: Option<f64>,
    pub max_latitude_degrees: Option<f64>,
    pub min_longitude_degrees: Option<f64>,
    pub max_longitude_degrees: Option<f64>,
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(flatten)]
    pub refs: LookupRefs,
}

/// A dataset with its images, returned by listings that ask for them.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetWithImages {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub images: Vec<Image>,
}

/// A single dataset with its linked creators and related materials.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub creators: Vec<ImageCreator>,
    pub related_materials: Vec<ImageSetRelatedMaterial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
}

const BOUND_COLUMNS: [&str; 4] = [
    "min_latitude_degrees",
    "max_latitude_degrees",
    "min_longitude_degrees",
    "max_longitude_degrees",
];

impl Resource for Dataset {
    const ENTITY: &'static str = "Dataset";
    const TABLE: &'static str = "datasets";
    const COLUMNS: &'static [&'static str] = with_shared_columns![
        "id",
        "uuid",
        "name",
        "handle",
        "ifdo_version",
        "local_path",
        "min_latitude_degrees",
        "max_latitude_degrees",
        "min_longitude_degrees",
        "max_longitude_degrees",
        "limits",
        "location",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = with_shared_columns![
        "uuid",
        "name",
        "handle",
        "ifdo_version",
        "local_path",
        "min_latitude_degrees",
        "max_latitude_degrees",
        "min_longitude_degrees",
        "max_longitude_degrees",
    ];

    fn id(&self) -> DbId {
        self.id
    }

    fn validate(payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        validate_shared_payload(payload)?;
        for column in BOUND_COLUMNS {
            if let Some(value) = payload.get(column).and_then(Value::as_f64) {
                if column.contains("latitude") {
                    geometry::validate_latitude(column, value)?;
                } else {
                    geometry::validate_longitude(column, value)?;
                }
            }
        }
        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            if name.trim().is_empty() {
                return Err(CoreError::Validation("Dataset name must not be empty".to_string()));
            }
        }
        Ok(())
    }

    fn derived(&self) -> Map<String, Value> {
        let mut derived = Map::new();
        derive_if_changed(
            &mut derived,
            "location",
            &self.location,
            geometry::point(self.common.latitude, self.common.longitude),
        );
        derive_if_changed(
            &mut derived,
            "limits",
            &self.limits,
            geometry::bounding_polygon(
                self.min_latitude_degrees,
                self.max_latitude_degrees,
                self.min_longitude_degrees,
                self.max_longitude_degrees,
            ),
        );
        derived
    }
}
