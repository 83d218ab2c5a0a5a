//! Controlled vocabularies shared by datasets and images.
//!
//! Every vocabulary is stored as TEXT holding the canonical value below.
//! Parsing is case-insensitive and ignores surrounding whitespace, so iFDO
//! documents that write `"Laser marker"` or `"laser marker"` both land on
//! the same stored value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Declares a vocabulary enum with `ALL`, `as_str`, `parse` and `Display`.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            /// Every canonical value, in declaration order.
            pub const ALL: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            pub fn parse(s: &str) -> Result<Self, CoreError> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($value) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(CoreError::Validation(format!(
                    "Invalid {} '{s}'. Must be one of: {}",
                    $label,
                    Self::ALL.join(", ")
                )))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use vocabulary;

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

vocabulary! {
    /// How the imagery was acquired.
    Acquisition, "acquisition" {
        Photo => "photo",
        Video => "video",
        Slide => "slide",
    }
}

vocabulary! {
    Quality, "quality" {
        Raw => "raw",
        Processed => "processed",
        Product => "product",
    }
}

vocabulary! {
    Deployment, "deployment" {
        Mapping => "mapping",
        Stationary => "stationary",
        Survey => "survey",
        Exploration => "exploration",
        Experiment => "experiment",
        Sampling => "sampling",
    }
}

vocabulary! {
    Navigation, "navigation" {
        Satellite => "satellite",
        Beacon => "beacon",
        Transponder => "transponder",
        Reconstructed => "reconstructed",
    }
}

vocabulary! {
    ScaleReference, "scale_reference" {
        Camera3d => "3D camera",
        CalibratedCamera => "Calibrated camera",
        LaserMarker => "Laser marker",
        OpticalFlow => "Optical flow",
    }
}

vocabulary! {
    Illumination, "illumination" {
        Sunlight => "sunlight",
        ArtificialLight => "artificial light",
        MixedLight => "mixed light",
    }
}

vocabulary! {
    /// Order of magnitude of the ground distance covered by one pixel.
    PixelMagnitude, "pixel_magnitude" {
        Km => "km",
        Hm => "hm",
        Dam => "dam",
        M => "m",
        Cm => "cm",
        Mm => "mm",
        Um => "µm",
    }
}

vocabulary! {
    MarineZone, "marine_zone" {
        Seafloor => "seafloor",
        WaterColumn => "water column",
        SeaSurface => "sea surface",
        Atmosphere => "atmosphere",
        Laboratory => "laboratory",
    }
}

vocabulary! {
    SpectralResolution, "spectral_resolution" {
        Grayscale => "grayscale",
        Rgb => "rgb",
        MultiSpectral => "multi-spectral",
        HyperSpectral => "hyper-spectral",
    }
}

vocabulary! {
    CaptureMode, "capture_mode" {
        Timer => "timer",
        Manual => "manual",
        Mixed => "mixed",
    }
}

vocabulary! {
    FaunaAttraction, "fauna_attraction" {
        None => "none",
        Baited => "baited",
        Light => "light",
    }
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

/// Parses a raw value and returns its canonical spelling.
pub type Normalizer = fn(&str) -> Result<&'static str, CoreError>;

/// Columns of the shared field set that hold a controlled vocabulary.
pub const VOCABULARY_COLUMNS: &[&str] = &[
    "acquisition",
    "quality",
    "deployment",
    "navigation",
    "scale_reference",
    "illumination",
    "pixel_magnitude",
    "marine_zone",
    "spectral_resolution",
    "capture_mode",
    "fauna_attraction",
];

/// Normalizer for a vocabulary column, or `None` for free-form columns.
pub fn normalizer_for(column: &str) -> Option<Normalizer> {
    let normalizer: Normalizer = match column {
        "acquisition" => |s| Acquisition::parse(s).map(|v| v.as_str()),
        "quality" => |s| Quality::parse(s).map(|v| v.as_str()),
        "deployment" => |s| Deployment::parse(s).map(|v| v.as_str()),
        "navigation" => |s| Navigation::parse(s).map(|v| v.as_str()),
        "scale_reference" => |s| ScaleReference::parse(s).map(|v| v.as_str()),
        "illumination" => |s| Illumination::parse(s).map(|v| v.as_str()),
        "pixel_magnitude" => |s| PixelMagnitude::parse(s).map(|v| v.as_str()),
        "marine_zone" => |s| MarineZone::parse(s).map(|v| v.as_str()),
        "spectral_resolution" => |s| SpectralResolution::parse(s).map(|v| v.as_str()),
        "capture_mode" => |s| CaptureMode::parse(s).map(|v| v.as_str()),
        "fauna_attraction" => |s| FaunaAttraction::parse(s).map(|v| v.as_str()),
        _ => return None,
    };
    Some(normalizer)
}

/// Rewrites every vocabulary column present in `fields` to its canonical value.
///
/// Nulls are left alone; any non-string value is rejected.
pub fn normalize_fields(
    fields: &mut serde_json::Map<String, serde_json::Value>,
) -> Result<(), CoreError> {
    for column in VOCABULARY_COLUMNS {
        let Some(value) = fields.get_mut(*column) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let raw = value.as_str().ok_or_else(|| {
            CoreError::Validation(format!("Field '{column}' must be a string"))
        })?;
        if let Some(normalize) = normalizer_for(column) {
            *value = serde_json::Value::String(normalize(raw)?.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn acquisition_round_trip() {
        assert_eq!(Acquisition::Video.as_str(), "video");
        assert_eq!(Acquisition::parse("video").unwrap(), Acquisition::Video);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            ScaleReference::parse("laser marker").unwrap(),
            ScaleReference::LaserMarker
        );
        assert_eq!(Quality::parse("  RAW ").unwrap(), Quality::Raw);
    }

    #[test]
    fn canonical_spelling_keeps_original_case() {
        assert_eq!(ScaleReference::Camera3d.as_str(), "3D camera");
        assert_eq!(PixelMagnitude::Um.to_string(), "µm");
    }

    #[test]
    fn invalid_value_lists_allowed_values() {
        let err = MarineZone::parse("outer space").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invalid marine_zone 'outer space'"));
        assert!(msg.contains("seafloor, water column, sea surface, atmosphere, laboratory"));
    }

    #[test]
    fn empty_value_rejected() {
        assert!(CaptureMode::parse("").is_err());
    }

    #[test]
    fn serde_uses_canonical_values() {
        let json = serde_json::to_string(&SpectralResolution::MultiSpectral).unwrap();
        assert_eq!(json, "\"multi-spectral\"");
        let parsed: Illumination = serde_json::from_str("\"mixed light\"").unwrap();
        assert_eq!(parsed, Illumination::MixedLight);
    }

    #[test]
    fn every_vocabulary_column_has_a_normalizer() {
        for column in VOCABULARY_COLUMNS {
            assert!(normalizer_for(column).is_some(), "{column}");
        }
        assert!(normalizer_for("copyright").is_none());
    }

    #[test]
    fn normalize_fields_rewrites_in_place() {
        let mut fields = json!({
            "deployment": "Survey",
            "fauna_attraction": null,
            "copyright": "CC-BY"
        })
        .as_object()
        .cloned()
        .unwrap();
        normalize_fields(&mut fields).unwrap();
        assert_eq!(fields["deployment"], "survey");
        assert!(fields["fauna_attraction"].is_null());
        assert_eq!(fields["copyright"], "CC-BY");
    }

    #[test]
    fn normalize_fields_rejects_non_strings() {
        let mut fields = json!({ "quality": 3 }).as_object().cloned().unwrap();
        assert_matches!(normalize_fields(&mut fields), Err(CoreError::Validation(_)));
    }
}
