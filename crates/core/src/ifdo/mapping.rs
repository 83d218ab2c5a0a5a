//! Static mapping from hyphenated iFDO keys to catalog columns and relations.

use serde_json::{Map, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Sections and locations
// ---------------------------------------------------------------------------

/// The two parts of an iFDO document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Items,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "image-set-header",
            Self::Items => "image-set-items",
        }
    }
}

/// Which sections a mapped key is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Header,
    Items,
    Both,
}

impl Location {
    pub fn applies_to(&self, section: Section) -> bool {
        matches!(
            (self, section),
            (Self::Both, _) | (Self::Header, Section::Header) | (Self::Items, Section::Items)
        )
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// A table an iFDO key points into instead of a plain column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Context,
    Project,
    Event,
    Platform,
    Sensor,
    Pi,
    License,
    Creator,
    CameraPose,
    CameraHousingViewport,
    FlatportParameters,
    DomeportParameters,
    CameraCalibrationModel,
    PhotometricCalibration,
    RelatedMaterial,
}

const NAMED_KEYS: &[(&str, &str)] = &[("name", "name"), ("uri", "uri")];

const CAMERA_POSE_KEYS: &[(&str, &str)] = &[
    ("pose-utm-zone", "utm_zone"),
    ("pose-utm-epsg", "utm_epsg"),
    ("pose-utm-east-north-up-meters", "utm_east_north_up_meters"),
    ("pose-absolute-orientation-utm-matrix", "absolute_orientation_utm_matrix"),
];

const HOUSING_VIEWPORT_KEYS: &[(&str, &str)] = &[
    ("viewport-type", "viewport_type"),
    ("viewport-optical-density", "optical_density"),
    ("viewport-thickness-millimeters", "thickness_millimeters"),
    ("viewport-extra-description", "extra_description"),
];

const FLATPORT_KEYS: &[(&str, &str)] = &[
    ("flatport-lens-port-distance-millimeters", "lens_port_distance_millimeters"),
    ("flatport-interface-normal-direction", "interface_normal_direction"),
    ("flatport-extra-description", "extra_description"),
];

const DOMEPORT_KEYS: &[(&str, &str)] = &[
    ("domeport-outer-radius-millimeters", "outer_radius_millimeters"),
    ("domeport-decentering-offset-xyz-millimeters", "decentering_offset_xyz_millimeters"),
    ("domeport-extra-description", "extra_description"),
];

const CALIBRATION_MODEL_KEYS: &[(&str, &str)] = &[
    ("calibration-model-type", "calibration_model_type"),
    ("calibration-focal-length-xy-pixel", "focal_length_xy_pixel"),
    ("calibration-principal-point-xy-pixel", "principal_point_xy_pixel"),
    ("calibration-distortion-coefficients", "distortion_coefficients"),
    (
        "calibration-approximate-field-of-view-water-xy-degree",
        "approximate_field_of_view_water_xy_degree",
    ),
    ("calibration-model-extra-description", "extra_description"),
];

const PHOTOMETRIC_KEYS: &[(&str, &str)] = &[
    ("photometric-sequence-white-balancing", "sequence_white_balancing"),
    ("photometric-exposure-factor-RGB", "exposure_factor_rgb"),
    ("photometric-sequence-illumination-type", "sequence_illumination_type"),
    ("photometric-sequence-illumination-description", "sequence_illumination_description"),
    ("photometric-illumination-factor-RGB", "illumination_factor_rgb"),
    ("photometric-water-properties-description", "water_properties_description"),
];

const RELATED_MATERIAL_KEYS: &[(&str, &str)] = &[
    ("related-material-resource", "uri"),
    ("related-material-title", "title"),
    ("related-material-relation", "relation"),
];

impl RelationKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Context => "image_contexts",
            Self::Project => "image_projects",
            Self::Event => "image_events",
            Self::Platform => "image_platforms",
            Self::Sensor => "image_sensors",
            Self::Pi => "image_pis",
            Self::License => "image_licenses",
            Self::Creator => "image_creators",
            Self::CameraPose => "image_camera_poses",
            Self::CameraHousingViewport => "image_camera_housing_viewports",
            Self::FlatportParameters => "image_flatport_parameters",
            Self::DomeportParameters => "image_domeport_parameters",
            Self::CameraCalibrationModel => "image_camera_calibration_models",
            Self::PhotometricCalibration => "image_photometric_calibrations",
            Self::RelatedMaterial => "image_set_related_materials",
        }
    }

    /// Column rows of this kind are deduplicated on. Parameter sets have none.
    pub fn unique_key(&self) -> Option<&'static str> {
        match self {
            Self::Context
            | Self::Project
            | Self::Event
            | Self::Platform
            | Self::Sensor
            | Self::Pi
            | Self::License
            | Self::Creator => Some("name"),
            _ => None,
        }
    }

    /// `(iFDO key, column)` pairs for the nested object.
    pub fn key_map(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::CameraPose => CAMERA_POSE_KEYS,
            Self::CameraHousingViewport => HOUSING_VIEWPORT_KEYS,
            Self::FlatportParameters => FLATPORT_KEYS,
            Self::DomeportParameters => DOMEPORT_KEYS,
            Self::CameraCalibrationModel => CALIBRATION_MODEL_KEYS,
            Self::PhotometricCalibration => PHOTOMETRIC_KEYS,
            Self::RelatedMaterial => RELATED_MATERIAL_KEYS,
            _ => NAMED_KEYS,
        }
    }

    /// Translate a nested iFDO value into a column map.
    ///
    /// Hyphenated keys and plain column names are both accepted; anything
    /// else is dropped. Named lookups also accept a bare string as the name.
    pub fn translate(&self, raw: &Value) -> Result<Map<String, Value>, CoreError> {
        let object = match raw {
            Value::Object(object) => object,
            Value::String(name) if self.unique_key().is_some() => {
                let mut data = Map::new();
                data.insert("name".to_string(), Value::String(name.clone()));
                return Ok(data);
            }
            other => {
                return Err(CoreError::Validation(format!(
                    "Expected an object for {}, got {}",
                    self.table(),
                    json_kind(other)
                )))
            }
        };

        let mut data = Map::new();
        for (key, value) in object {
            if value.is_null() {
                continue;
            }
            let column = self
                .key_map()
                .iter()
                .find(|(ifdo_key, column)| ifdo_key == key || column == key)
                .map(|(_, column)| *column);
            if let Some(column) = column {
                data.insert(column.to_string(), value.clone());
            }
        }

        if let Some(unique) = self.unique_key() {
            let present = data
                .get(unique)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(CoreError::Validation(format!(
                    "Entries of {} require a non-empty '{unique}'",
                    self.table()
                )));
            }
        }
        Ok(data)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied as-is into the column.
    Scalar,
    /// Copied after controlled-vocabulary normalization.
    Vocabulary,
    /// Get-or-created and referenced through the `column` foreign key.
    Relation(RelationKind),
    /// Each element get-or-created and linked through a join table.
    RelationList(RelationKind),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub key: &'static str,
    /// Target column, or the association name for relation lists.
    pub column: &'static str,
    pub location: Location,
    pub kind: FieldKind,
}

const fn field(key: &'static str, column: &'static str, location: Location, kind: FieldKind) -> FieldMapping {
    FieldMapping {
        key,
        column,
        location,
        kind,
    }
}

const fn scalar(key: &'static str, column: &'static str) -> FieldMapping {
    field(key, column, Location::Both, FieldKind::Scalar)
}

const fn vocabulary(key: &'static str, column: &'static str) -> FieldMapping {
    field(key, column, Location::Both, FieldKind::Vocabulary)
}

const fn relation(key: &'static str, column: &'static str, kind: RelationKind) -> FieldMapping {
    field(key, column, Location::Both, FieldKind::Relation(kind))
}

/// Every iFDO key the importer understands.
pub static IFDO_MAPPING: &[FieldMapping] = &[
    // Header-only identity and extent.
    field("image-set-ifdo-version", "ifdo_version", Location::Header, FieldKind::Scalar),
    field("image-set-uuid", "uuid", Location::Header, FieldKind::Scalar),
    field("image-set-handle", "handle", Location::Header, FieldKind::Scalar),
    field("image-set-local-path", "local_path", Location::Header, FieldKind::Scalar),
    field("image-set-min-latitude-degrees", "min_latitude_degrees", Location::Header, FieldKind::Scalar),
    field("image-set-max-latitude-degrees", "max_latitude_degrees", Location::Header, FieldKind::Scalar),
    field("image-set-min-longitude-degrees", "min_longitude_degrees", Location::Header, FieldKind::Scalar),
    field("image-set-max-longitude-degrees", "max_longitude_degrees", Location::Header, FieldKind::Scalar),
    field(
        "image-set-related-materials",
        "related_materials",
        Location::Header,
        FieldKind::RelationList(RelationKind::RelatedMaterial),
    ),
    // Item-only identity.
    field("image-uuid", "uuid", Location::Items, FieldKind::Scalar),
    field("image-handle", "handle", Location::Items, FieldKind::Scalar),
    // Shared fields.
    scalar("image-set-name", "name"),
    scalar("image-datetime", "date_time"),
    scalar("image-latitude", "latitude"),
    scalar("image-longitude", "longitude"),
    scalar("image-altitude-meters", "altitude_meters"),
    scalar("image-coordinate-uncertainty-meters", "coordinate_uncertainty_meters"),
    scalar("image-copyright", "copyright"),
    scalar("image-hash-sha256", "sha256_hash"),
    scalar("image-abstract", "abstract"),
    scalar("image-entropy", "entropy"),
    scalar("image-particle-count", "particle_count"),
    scalar("image-average-color", "average_color"),
    scalar("image-mpeg7-color-layout", "mpeg7_color_layout"),
    scalar("image-mpeg7-color-statistic", "mpeg7_color_statistic"),
    scalar("image-mpeg7-color-structure", "mpeg7_color_structure"),
    scalar("image-mpeg7-dominant-color", "mpeg7_dominant_color"),
    scalar("image-mpeg7-edge-histogram", "mpeg7_edge_histogram"),
    scalar("image-mpeg7-homogeneous-texture", "mpeg7_homogeneous_texture"),
    scalar("image-mpeg7-scalable-color", "mpeg7_scalable_color"),
    vocabulary("image-acquisition", "acquisition"),
    vocabulary("image-quality", "quality"),
    vocabulary("image-deployment", "deployment"),
    vocabulary("image-navigation", "navigation"),
    vocabulary("image-scale-reference", "scale_reference"),
    vocabulary("image-illumination", "illumination"),
    vocabulary("image-pixel-magnitude", "pixel_magnitude"),
    vocabulary("image-marine-zone", "marine_zone"),
    vocabulary("image-spectral-resolution", "spectral_resolution"),
    vocabulary("image-capture-mode", "capture_mode"),
    vocabulary("image-fauna-attraction", "fauna_attraction"),
    scalar("image-area-square-meters", "area_square_meters"),
    scalar("image-meters-above-ground", "meters_above_ground"),
    scalar("image-acquisition-settings", "acquisition_settings"),
    scalar("image-camera-yaw-degrees", "camera_yaw_degrees"),
    scalar("image-camera-pitch-degrees", "camera_pitch_degrees"),
    scalar("image-camera-roll-degrees", "camera_roll_degrees"),
    scalar("image-overlap-fraction", "overlap_fraction"),
    scalar("image-objective", "objective"),
    scalar("image-target-environment", "target_environment"),
    scalar("image-target-timescale", "target_timescale"),
    scalar("image-spatial-constraints", "spatial_constraints"),
    scalar("image-temporal-constraints", "temporal_constraints"),
    scalar("image-time-synchronisation", "time_synchronisation"),
    scalar("image-item-identification-scheme", "item_identification_scheme"),
    scalar("image-curation-protocol", "curation_protocol"),
    scalar("image-visual-constraints", "visual_constraints"),
    // Lookups and parameter sets.
    relation("image-context", "context_id", RelationKind::Context),
    relation("image-project", "project_id", RelationKind::Project),
    relation("image-event", "event_id", RelationKind::Event),
    relation("image-platform", "platform_id", RelationKind::Platform),
    relation("image-sensor", "sensor_id", RelationKind::Sensor),
    relation("image-pi", "pi_id", RelationKind::Pi),
    relation("image-license", "license_id", RelationKind::License),
    relation("image-camera-pose", "camera_pose_id", RelationKind::CameraPose),
    relation(
        "image-camera-housing-viewport",
        "camera_housing_viewport_id",
        RelationKind::CameraHousingViewport,
    ),
    relation(
        "image-flatport-parameters",
        "flatport_parameters_id",
        RelationKind::FlatportParameters,
    ),
    relation(
        "image-domeport-parameters",
        "domeport_parameters_id",
        RelationKind::DomeportParameters,
    ),
    relation(
        "image-camera-calibration-model",
        "camera_calibration_model_id",
        RelationKind::CameraCalibrationModel,
    ),
    relation(
        "image-photometric-calibration",
        "photometric_calibration_id",
        RelationKind::PhotometricCalibration,
    ),
    field(
        "image-creators",
        "creators",
        Location::Both,
        FieldKind::RelationList(RelationKind::Creator),
    ),
];

/// Look up the mapping for an iFDO key.
pub fn mapping_for(key: &str) -> Option<&'static FieldMapping> {
    IFDO_MAPPING.iter().find(|m| m.key == key)
}
