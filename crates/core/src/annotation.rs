//! Annotation shapes, coordinate arity rules and label confidence checks.
//!
//! Coordinates are a list of flat `[x0, y0, x1, y1, ...]` pixel lists, one
//! per video frame (a still image has exactly one inner list).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::vocab::vocabulary;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Values for a single pixel: x, y.
pub const SINGLE_PIXEL_VALUES: usize = 2;

/// Values for a circle: center x, center y, radius.
pub const CIRCLE_VALUES: usize = 3;

/// Values for rectangles and ellipses: four corner points.
pub const QUAD_VALUES: usize = 8;

/// Minimum values for a polyline: two points.
pub const MIN_POLYLINE_VALUES: usize = 4;

/// Minimum values for a polygon: three points plus the closing point.
pub const MIN_POLYGON_VALUES: usize = 8;

pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

vocabulary! {
    /// Geometric shape of an annotation.
    Shape, "shape" {
        SinglePixel => "single-pixel",
        Polyline => "polyline",
        Polygon => "polygon",
        Circle => "circle",
        Rectangle => "rectangle",
        Ellipse => "ellipse",
        WholeImage => "whole-image",
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate every coordinate list against the arity rules of `shape`.
pub fn validate_coordinates(shape: Shape, coordinates: &[Vec<f64>]) -> Result<(), CoreError> {
    if coordinates.is_empty() && shape != Shape::WholeImage {
        return Err(CoreError::Validation(format!(
            "A {shape} annotation needs at least one coordinate list"
        )));
    }
    for (frame, values) in coordinates.iter().enumerate() {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(CoreError::Validation(format!(
                "Coordinate list {frame} contains a non-finite value ({bad})"
            )));
        }
        validate_frame(shape, values)
            .map_err(|msg| CoreError::Validation(format!("Coordinate list {frame}: {msg}")))?;
    }
    Ok(())
}

fn validate_frame(shape: Shape, values: &[f64]) -> Result<(), String> {
    let n = values.len();
    match shape {
        Shape::WholeImage if n != 0 => Err(format!("whole-image takes no values, got {n}")),
        Shape::SinglePixel if n != SINGLE_PIXEL_VALUES => Err(format!(
            "single-pixel takes exactly {SINGLE_PIXEL_VALUES} values, got {n}"
        )),
        Shape::Circle if n != CIRCLE_VALUES => Err(format!(
            "circle takes exactly {CIRCLE_VALUES} values (x, y, radius), got {n}"
        )),
        Shape::Circle if values[2] <= 0.0 => {
            Err(format!("circle radius must be positive, got {}", values[2]))
        }
        Shape::Rectangle | Shape::Ellipse if n != QUAD_VALUES => Err(format!(
            "{shape} takes exactly {QUAD_VALUES} values, got {n}"
        )),
        Shape::Polyline if n < MIN_POLYLINE_VALUES || n % 2 != 0 => Err(format!(
            "polyline takes an even number of at least {MIN_POLYLINE_VALUES} values, got {n}"
        )),
        Shape::Polygon if n < MIN_POLYGON_VALUES || n % 2 != 0 => Err(format!(
            "polygon takes an even number of at least {MIN_POLYGON_VALUES} values, got {n}"
        )),
        Shape::Polygon if values[..2] != values[n - 2..] => {
            Err("polygon must be closed (first point equal to last point)".to_string())
        }
        _ => Ok(()),
    }
}

/// Validate a label confidence, if one is given.
///
/// Must be between [`MIN_CONFIDENCE`] and [`MAX_CONFIDENCE`] inclusive.
pub fn validate_confidence(confidence: Option<f64>) -> Result<(), CoreError> {
    let Some(value) = confidence else {
        return Ok(());
    };
    if !value.is_finite() || !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- Shape::as_str / parse ---------------------------------------------

    #[test]
    fn shape_single_pixel_round_trip() {
        assert_eq!(Shape::SinglePixel.as_str(), "single-pixel");
        assert_eq!(Shape::parse("single-pixel").unwrap(), Shape::SinglePixel);
    }

    #[test]
    fn shape_whole_image_round_trip() {
        assert_eq!(Shape::WholeImage.as_str(), "whole-image");
        assert_eq!(Shape::parse("Whole-Image").unwrap(), Shape::WholeImage);
    }

    #[test]
    fn shape_invalid_rejected() {
        let err = Shape::parse("triangle").unwrap_err();
        assert!(err.to_string().contains("Invalid shape"));
    }

    // -- validate_coordinates ----------------------------------------------

    #[test]
    fn whole_image_accepts_no_values() {
        assert!(validate_coordinates(Shape::WholeImage, &[]).is_ok());
        assert!(validate_coordinates(Shape::WholeImage, &[vec![]]).is_ok());
        assert!(validate_coordinates(Shape::WholeImage, &[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn single_pixel_needs_two_values() {
        assert!(validate_coordinates(Shape::SinglePixel, &[vec![1.0, 2.0]]).is_ok());
        assert!(validate_coordinates(Shape::SinglePixel, &[vec![1.0]]).is_err());
    }

    #[test]
    fn circle_needs_positive_radius() {
        assert!(validate_coordinates(Shape::Circle, &[vec![5.0, 5.0, 2.0]]).is_ok());
        let err = validate_coordinates(Shape::Circle, &[vec![5.0, 5.0, 0.0]]).unwrap_err();
        assert!(err.to_string().contains("radius must be positive"));
    }

    #[test]
    fn rectangle_and_ellipse_need_eight_values() {
        let quad = vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        assert!(validate_coordinates(Shape::Rectangle, &[quad.clone()]).is_ok());
        assert!(validate_coordinates(Shape::Ellipse, &[quad]).is_ok());
        assert!(validate_coordinates(Shape::Rectangle, &[vec![0.0; 6]]).is_err());
    }

    #[test]
    fn polyline_needs_even_count_of_at_least_four() {
        assert!(validate_coordinates(Shape::Polyline, &[vec![0.0, 0.0, 1.0, 1.0]]).is_ok());
        assert!(validate_coordinates(Shape::Polyline, &[vec![0.0, 0.0, 1.0]]).is_err());
        assert!(validate_coordinates(Shape::Polyline, &[vec![0.0, 0.0, 1.0, 1.0, 2.0]]).is_err());
    }

    #[test]
    fn polygon_must_be_closed() {
        let closed = vec![0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 0.0, 0.0];
        let open = vec![0.0, 0.0, 4.0, 0.0, 4.0, 3.0, 1.0, 1.0];
        assert!(validate_coordinates(Shape::Polygon, &[closed]).is_ok());
        let err = validate_coordinates(Shape::Polygon, &[open]).unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn polygon_too_short_rejected() {
        assert!(validate_coordinates(Shape::Polygon, &[vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]]).is_err());
    }

    #[test]
    fn every_frame_is_checked() {
        let err = validate_coordinates(
            Shape::SinglePixel,
            &[vec![1.0, 2.0], vec![1.0, 2.0, 3.0]],
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Coordinate list 1"));
    }

    #[test]
    fn non_whole_image_needs_a_frame() {
        assert_matches!(
            validate_coordinates(Shape::Circle, &[]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn nan_rejected() {
        assert!(validate_coordinates(Shape::SinglePixel, &[vec![f64::NAN, 1.0]]).is_err());
    }

    // -- validate_confidence -----------------------------------------------

    #[test]
    fn confidence_bounds_inclusive() {
        assert!(validate_confidence(Some(MIN_CONFIDENCE)).is_ok());
        assert!(validate_confidence(Some(MAX_CONFIDENCE)).is_ok());
        assert!(validate_confidence(None).is_ok());
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        assert!(validate_confidence(Some(1.01)).is_err());
        assert!(validate_confidence(Some(-0.1)).is_err());
    }
}
