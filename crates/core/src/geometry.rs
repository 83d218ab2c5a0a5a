//! Geometry derivation for datasets and images.
//!
//! Geometries are stored as GeoJSON objects in WGS84 (EPSG:4326) with
//! longitude first, the axis order GeoJSON mandates.

use serde_json::{json, Value};

use crate::error::CoreError;

/// Spatial reference of every derived geometry.
pub const WGS84_SRID: i32 = 4326;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

fn crs() -> Value {
    json!({
        "type": "name",
        "properties": { "name": format!("EPSG:{WGS84_SRID}") }
    })
}

/// Point geometry from a latitude/longitude pair.
///
/// Returns `None` unless both coordinates are present and finite.
pub fn point(latitude: Option<f64>, longitude: Option<f64>) -> Option<Value> {
    let (lat, lon) = (latitude?, longitude?);
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(json!({
        "type": "Point",
        "coordinates": [lon, lat],
        "crs": crs(),
    }))
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Builds a box only when all four bounds are present and finite.
    pub fn from_bounds(
        min_latitude: Option<f64>,
        max_latitude: Option<f64>,
        min_longitude: Option<f64>,
        max_longitude: Option<f64>,
    ) -> Option<Self> {
        let bbox = Self {
            min_latitude: min_latitude?,
            max_latitude: max_latitude?,
            min_longitude: min_longitude?,
            max_longitude: max_longitude?,
        };
        let finite = [
            bbox.min_latitude,
            bbox.max_latitude,
            bbox.min_longitude,
            bbox.max_longitude,
        ]
        .iter()
        .all(|v| v.is_finite());
        finite.then_some(bbox)
    }

    /// Closed counter-clockwise exterior ring starting at (max lon, min lat).
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.max_longitude, self.min_latitude],
            [self.max_longitude, self.max_latitude],
            [self.min_longitude, self.max_latitude],
            [self.min_longitude, self.min_latitude],
            [self.max_longitude, self.min_latitude],
        ]
    }

    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [self.ring()],
            "crs": crs(),
        })
    }
}

/// Polygon geometry from the four dataset bounds, or `None` if any is missing.
pub fn bounding_polygon(
    min_latitude: Option<f64>,
    max_latitude: Option<f64>,
    min_longitude: Option<f64>,
    max_longitude: Option<f64>,
) -> Option<Value> {
    BoundingBox::from_bounds(min_latitude, max_latitude, min_longitude, max_longitude)
        .map(|bbox| bbox.to_geojson())
}

/// Reject latitudes outside [-90, 90].
pub fn validate_latitude(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{field} must be between {MIN_LATITUDE} and {MAX_LATITUDE}, got {value}"
        )));
    }
    Ok(())
}

/// Reject longitudes outside [-180, 180].
pub fn validate_longitude(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{field} must be between {MIN_LONGITUDE} and {MAX_LONGITUDE}, got {value}"
        )));
    }
    Ok(())
}
