//! Lookup entities and parameter sets referenced by datasets and images.
//!
//! Named lookups (context, project, event, platform, sensor, PI, creator,
//! license) share one shape and are unique by name. Parameter sets and
//! related materials are plain records without deduplication.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Named lookups
// ---------------------------------------------------------------------------

/// DTO for creating any named lookup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateNamedLookup {
    pub name: String,
    pub uri: Option<String>,
}

/// DTO for updating any named lookup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateNamedLookup {
    pub name: Option<String>,
    pub uri: Option<String>,
}

const NAMED_COLUMNS: &[&str] = &["id", "uuid", "name", "uri", "created_at", "updated_at"];
const NAMED_WRITABLE: &[&str] = &["uuid", "name", "uri"];

fn validate_name(entity: &str, payload: &Map<String, Value>) -> Result<(), CoreError> {
    match payload.get("name").and_then(Value::as_str) {
        Some(name) if name.trim().is_empty() => Err(CoreError::Validation(format!(
            "{entity} name must not be empty"
        ))),
        _ => Ok(()),
    }
}

macro_rules! named_lookup {
    ($(#[$meta:meta])* $name:ident, $table:literal, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
        pub struct $name {
            pub id: DbId,
            pub uuid: Uuid,
            pub name: String,
            pub uri: Option<String>,
            pub created_at: Timestamp,
            pub updated_at: Timestamp,
        }

        impl Resource for $name {
            const ENTITY: &'static str = $entity;
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [&'static str] = NAMED_COLUMNS;
            const WRITABLE: &'static [&'static str] = NAMED_WRITABLE;

            fn id(&self) -> DbId {
                self.id
            }

            fn validate(
                payload: &mut Map<String, Value>,
                _existing: Option<&Self>,
            ) -> Result<(), CoreError> {
                validate_name(Self::ENTITY, payload)
            }
        }
    };
}

named_lookup!(
    /// The overarching project context of an image set.
    ImageContext, "image_contexts", "Image context"
);
named_lookup!(ImageProject, "image_projects", "Image project");
named_lookup!(
    /// The expedition or cruise during which images were taken.
    ImageEvent, "image_events", "Image event"
);
named_lookup!(ImagePlatform, "image_platforms", "Image platform");
named_lookup!(ImageSensor, "image_sensors", "Image sensor");
named_lookup!(
    /// Principal investigator.
    ImagePi, "image_pis", "Image PI"
);
named_lookup!(ImageCreator, "image_creators", "Image creator");
named_lookup!(ImageLicense, "image_licenses", "Image license");

// ---------------------------------------------------------------------------
// Parameter sets
// ---------------------------------------------------------------------------

/// Declares a parameter-set row, its all-optional input DTO and its `Resource` impl.
macro_rules! parameter_set {
    (
        $(#[$meta:meta])*
        $name:ident / $input:ident, $table:literal, $entity:literal {
            $($field:ident: $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
        pub struct $name {
            pub id: DbId,
            pub uuid: Uuid,
            $(pub $field: Option<$ty>,)+
            pub created_at: Timestamp,
            pub updated_at: Timestamp,
        }

        /// Create and update DTO: every field is optional.
        #[derive(Debug, Clone, Default, Deserialize, Serialize)]
        pub struct $input {
            pub uuid: Option<Uuid>,
            $(pub $field: Option<$ty>,)+
        }

        impl Resource for $name {
            const ENTITY: &'static str = $entity;
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [&'static str] =
                &["id", "uuid", $(stringify!($field),)+ "created_at", "updated_at"];
            const WRITABLE: &'static [&'static str] = &["uuid", $(stringify!($field),)+];

            fn id(&self) -> DbId {
                self.id
            }
        }
    };
}

parameter_set!(
    /// Absolute camera position and orientation in UTM.
    ImageCameraPose / ImageCameraPoseInput, "image_camera_poses", "Image camera pose" {
        utm_zone: String,
        utm_epsg: String,
        utm_east_north_up_meters: Vec<f64>,
        absolute_orientation_utm_matrix: Vec<f64>,
    }
);

parameter_set!(
    ImageCameraHousingViewport / ImageCameraHousingViewportInput,
    "image_camera_housing_viewports",
    "Image camera housing viewport" {
        viewport_type: String,
        optical_density: f64,
        thickness_millimeters: f64,
        extra_description: String,
    }
);

parameter_set!(
    ImageFlatportParameter / ImageFlatportParameterInput,
    "image_flatport_parameters",
    "Image flatport parameter" {
        lens_port_distance_millimeters: f64,
        interface_normal_direction: Vec<f64>,
        extra_description: String,
    }
);

parameter_set!(
    ImageDomeportParameter / ImageDomeportParameterInput,
    "image_domeport_parameters",
    "Image domeport parameter" {
        outer_radius_millimeters: f64,
        decentering_offset_xyz_millimeters: Vec<f64>,
        extra_description: String,
    }
);

parameter_set!(
    /// Intrinsic lens calibration.
    ImageCameraCalibrationModel / ImageCameraCalibrationModelInput,
    "image_camera_calibration_models",
    "Image camera calibration model" {
        calibration_model_type: String,
        focal_length_xy_pixel: Vec<f64>,
        principal_point_xy_pixel: Vec<f64>,
        distortion_coefficients: Vec<f64>,
        approximate_field_of_view_water_xy_degree: Vec<f64>,
        extra_description: String,
    }
);

parameter_set!(
    ImagePhotometricCalibration / ImagePhotometricCalibrationInput,
    "image_photometric_calibrations",
    "Image photometric calibration" {
        sequence_white_balancing: String,
        exposure_factor_rgb: Vec<f64>,
        sequence_illumination_type: String,
        sequence_illumination_description: String,
        illumination_factor_rgb: Vec<f64>,
        water_properties_description: String,
    }
);

parameter_set!(
    /// A resource related to an image set, e.g. a cruise report.
    ImageSetRelatedMaterial / ImageSetRelatedMaterialInput,
    "image_set_related_materials",
    "Related material" {
        uri: String,
        title: String,
        relation: String,
    }
);
