//! Images (iFDO items). Each belongs to at most one dataset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::geometry;
use ifdo_core::types::{DbId, Timestamp};
use uuid::Uuid;

use super::common::{validate_shared_payload, with_shared_columns, CommonFields, LookupRefs, NestedLookups};
use super::dataset::Dataset;
use crate::resource::{derive_if_changed, Resource};

/// A row from the `images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub uuid: Uuid,
    pub dataset_id: Option<DbId>,
    pub name: String,
    pub handle: Option<String>,
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

impl Image {
    /// The image as seen through its dataset: unset fields take the dataset's value.
    pub fn merged_with(&self, dataset: &Dataset) -> Image {
        let common = self.common.merged_with(&dataset.common);
        let location = self
            .location
            .clone()
            .or_else(|| geometry::point(common.latitude, common.longitude));
        Image {
            location,
            common,
            refs: self.refs.merged_with(&dataset.refs),
            handle: self.handle.clone().or_else(|| dataset.handle.clone()),
            ..self.clone()
        }
    }
}

/// DTO for creating an image.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateImage {
    pub uuid: Option<Uuid>,
    pub dataset_id: Option<DbId>,
    pub name: String,
    pub handle: Option<String>,
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(flatten)]
    pub refs: LookupRefs,
    #[serde(flatten)]
    pub nested: NestedLookups,
}

/// DTO for updating an image. Only present fields are written.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateImage {
    pub dataset_id: Option<DbId>,
    pub name: Option<String>,
    pub handle: Option<String>,
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(flatten)]
    pub refs: LookupRefs,
}

impl Resource for Image {
    const ENTITY: &'static str = "Image";
    const TABLE: &'static str = "images";
    const COLUMNS: &'static [&'static str] = with_shared_columns![
        "id",
        "uuid",
        "dataset_id",
        "name",
        "handle",
        "location",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] =
        with_shared_columns!["uuid", "dataset_id", "name", "handle"];

    fn id(&self) -> DbId {
        self.id
    }

    fn validate(payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        validate_shared_payload(payload)?;
        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            if name.trim().is_empty() {
                return Err(CoreError::Validation("Image name must not be empty".to_string()));
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
        derived
    }
}
