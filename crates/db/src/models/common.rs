//! The descriptive field set shared by datasets and images.
//!
//! An image column left NULL falls back to its dataset's value when read
//! through [`CommonFields::merged_with`] / [`LookupRefs::merged_with`]; the
//! fallback is never written back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::geometry;
use ifdo_core::ifdo::mapping::RelationKind;
use ifdo_core::ifdo::parse::{PendingRelation, PendingRelationList};
use ifdo_core::types::{DbId, Timestamp};
use ifdo_core::vocab;

/// Expands to a column slice: the given leading columns followed by every
/// column of [`CommonFields`] and [`LookupRefs`].
macro_rules! with_shared_columns {
    [$($column:literal),* $(,)?] => {
        &[
            $($column,)*
            "sha256_hash", "date_time", "latitude", "longitude", "altitude_meters",
            "coordinate_uncertainty_meters", "copyright", "abstract", "entropy",
            "particle_count", "average_color", "mpeg7_color_layout",
            "mpeg7_color_statistic", "mpeg7_color_structure", "mpeg7_dominant_color",
            "mpeg7_edge_histogram", "mpeg7_homogeneous_texture", "mpeg7_scalable_color",
            "acquisition", "quality", "deployment", "navigation", "scale_reference",
            "illumination", "pixel_magnitude", "marine_zone", "spectral_resolution",
            "capture_mode", "fauna_attraction", "area_square_meters",
            "meters_above_ground", "acquisition_settings", "camera_yaw_degrees",
            "camera_pitch_degrees", "camera_roll_degrees", "overlap_fraction",
            "objective", "target_environment", "target_timescale",
            "spatial_constraints", "temporal_constraints", "time_synchronisation",
            "item_identification_scheme", "curation_protocol", "visual_constraints",
            "context_id", "project_id", "event_id", "platform_id", "sensor_id",
            "pi_id", "license_id", "camera_pose_id", "camera_housing_viewport_id",
            "flatport_parameters_id", "domeport_parameters_id",
            "camera_calibration_model_id", "photometric_calibration_id",
        ]
    };
}

pub(crate) use with_shared_columns;

/// Builds `merged_with` for a struct whose fields are all `Option`s.
macro_rules! fallback_merge {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $ty {
            /// Copy of `self` with every `None` field taken from `parent`.
            pub fn merged_with(&self, parent: &Self) -> Self {
                Self {
                    $($field: self.$field.clone().or_else(|| parent.$field.clone()),)+
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Descriptive fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommonFields {
    pub sha256_hash: Option<String>,
    pub date_time: Option<Timestamp>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_meters: Option<f64>,
    pub coordinate_uncertainty_meters: Option<f64>,
    pub copyright: Option<String>,
    #[sqlx(rename = "abstract")]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub entropy: Option<f64>,
    pub particle_count: Option<i32>,
    pub average_color: Option<Vec<f64>>,
    pub mpeg7_color_layout: Option<Vec<f64>>,
    pub mpeg7_color_statistic: Option<Vec<f64>>,
    pub mpeg7_color_structure: Option<Vec<f64>>,
    pub mpeg7_dominant_color: Option<Vec<f64>>,
    pub mpeg7_edge_histogram: Option<Vec<f64>>,
    pub mpeg7_homogeneous_texture: Option<Vec<f64>>,
    pub mpeg7_scalable_color: Option<Vec<f64>>,
    pub acquisition: Option<String>,
    pub quality: Option<String>,
    pub deployment: Option<String>,
    pub navigation: Option<String>,
    pub scale_reference: Option<String>,
    pub illumination: Option<String>,
    pub pixel_magnitude: Option<String>,
    pub marine_zone: Option<String>,
    pub spectral_resolution: Option<String>,
    pub capture_mode: Option<String>,
    pub fauna_attraction: Option<String>,
    pub area_square_meters: Option<f64>,
    pub meters_above_ground: Option<f64>,
    pub acquisition_settings: Option<Value>,
    pub camera_yaw_degrees: Option<f64>,
    pub camera_pitch_degrees: Option<f64>,
    pub camera_roll_degrees: Option<f64>,
    pub overlap_fraction: Option<f64>,
    pub objective: Option<String>,
    pub target_environment: Option<String>,
    pub target_timescale: Option<String>,
    pub spatial_constraints: Option<String>,
    pub temporal_constraints: Option<String>,
    pub time_synchronisation: Option<String>,
    pub item_identification_scheme: Option<String>,
    pub curation_protocol: Option<String>,
    pub visual_constraints: Option<String>,
}

fallback_merge!(CommonFields {
    sha256_hash,
    date_time,
    latitude,
    longitude,
    altitude_meters,
    coordinate_uncertainty_meters,
    copyright,
    abstract_text,
    entropy,
    particle_count,
    average_color,
    mpeg7_color_layout,
    mpeg7_color_statistic,
    mpeg7_color_structure,
    mpeg7_dominant_color,
    mpeg7_edge_histogram,
    mpeg7_homogeneous_texture,
    mpeg7_scalable_color,
    acquisition,
    quality,
    deployment,
    navigation,
    scale_reference,
    illumination,
    pixel_magnitude,
    marine_zone,
    spectral_resolution,
    capture_mode,
    fauna_attraction,
    area_square_meters,
    meters_above_ground,
    acquisition_settings,
    camera_yaw_degrees,
    camera_pitch_degrees,
    camera_roll_degrees,
    overlap_fraction,
    objective,
    target_environment,
    target_timescale,
    spatial_constraints,
    temporal_constraints,
    time_synchronisation,
    item_identification_scheme,
    curation_protocol,
    visual_constraints,
});

// ---------------------------------------------------------------------------
// Lookup references
// ---------------------------------------------------------------------------

/// Foreign keys into the lookup and parameter-set tables.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LookupRefs {
    pub context_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub event_id: Option<DbId>,
    pub platform_id: Option<DbId>,
    pub sensor_id: Option<DbId>,
    pub pi_id: Option<DbId>,
    pub license_id: Option<DbId>,
    pub camera_pose_id: Option<DbId>,
    pub camera_housing_viewport_id: Option<DbId>,
    pub flatport_parameters_id: Option<DbId>,
    pub domeport_parameters_id: Option<DbId>,
    pub camera_calibration_model_id: Option<DbId>,
    pub photometric_calibration_id: Option<DbId>,
}

fallback_merge!(LookupRefs {
    context_id,
    project_id,
    event_id,
    platform_id,
    sensor_id,
    pi_id,
    license_id,
    camera_pose_id,
    camera_housing_viewport_id,
    flatport_parameters_id,
    domeport_parameters_id,
    camera_calibration_model_id,
    photometric_calibration_id,
});

// ---------------------------------------------------------------------------
// Nested lookups on create
// ---------------------------------------------------------------------------

/// Lookups given inline on create instead of by id.
///
/// Each value is an object using column names or hyphenated iFDO keys; named
/// lookups also accept a bare name string. Resolved with get-or-create.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NestedLookups {
    pub context: Option<Value>,
    pub project: Option<Value>,
    pub event: Option<Value>,
    pub platform: Option<Value>,
    pub sensor: Option<Value>,
    pub pi: Option<Value>,
    pub license: Option<Value>,
    pub camera_pose: Option<Value>,
    pub camera_housing_viewport: Option<Value>,
    pub flatport_parameters: Option<Value>,
    pub domeport_parameters: Option<Value>,
    pub camera_calibration_model: Option<Value>,
    pub photometric_calibration: Option<Value>,
    #[serde(default)]
    pub creators: Vec<Value>,
}

impl NestedLookups {
    pub fn pending_relations(&self) -> Result<Vec<PendingRelation>, CoreError> {
        let slots = [
            (&self.context, "context_id", RelationKind::Context),
            (&self.project, "project_id", RelationKind::Project),
            (&self.event, "event_id", RelationKind::Event),
            (&self.platform, "platform_id", RelationKind::Platform),
            (&self.sensor, "sensor_id", RelationKind::Sensor),
            (&self.pi, "pi_id", RelationKind::Pi),
            (&self.license, "license_id", RelationKind::License),
            (&self.camera_pose, "camera_pose_id", RelationKind::CameraPose),
            (
                &self.camera_housing_viewport,
                "camera_housing_viewport_id",
                RelationKind::CameraHousingViewport,
            ),
            (
                &self.flatport_parameters,
                "flatport_parameters_id",
                RelationKind::FlatportParameters,
            ),
            (
                &self.domeport_parameters,
                "domeport_parameters_id",
                RelationKind::DomeportParameters,
            ),
            (
                &self.camera_calibration_model,
                "camera_calibration_model_id",
                RelationKind::CameraCalibrationModel,
            ),
            (
                &self.photometric_calibration,
                "photometric_calibration_id",
                RelationKind::PhotometricCalibration,
            ),
        ];

        slots
            .into_iter()
            .filter_map(|(value, column, kind)| value.as_ref().map(|v| (v, column, kind)))
            .map(|(value, column, kind)| -> Result<PendingRelation, CoreError> {
                Ok(PendingRelation {
                    column,
                    kind,
                    data: kind.translate(value)?,
                })
            })
            .collect()
    }

    pub fn pending_creators(&self) -> Result<Option<PendingRelationList>, CoreError> {
        if self.creators.is_empty() {
            return Ok(None);
        }
        let items = self
            .creators
            .iter()
            .map(|c| RelationKind::Creator.translate(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(PendingRelationList {
            kind: RelationKind::Creator,
            items,
        }))
    }
}

// ---------------------------------------------------------------------------
// Write validation
// ---------------------------------------------------------------------------

/// Normalize vocabulary columns and range-check coordinates in a write payload.
pub fn validate_shared_payload(payload: &mut Map<String, Value>) -> Result<(), CoreError> {
    vocab::normalize_fields(payload)?;
    for (column, check) in [
        ("latitude", geometry::validate_latitude as fn(&str, f64) -> Result<(), CoreError>),
        ("longitude", geometry::validate_longitude),
    ] {
        if let Some(value) = payload.get(column).and_then(Value::as_f64) {
            check(column, value)?;
        }
    }
    if let Some(fraction) = payload.get("overlap_fraction").and_then(Value::as_f64) {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(CoreError::Validation(format!(
                "overlap_fraction must be between 0 and 1, got {fraction}"
            )));
        }
    }
    Ok(())
}
