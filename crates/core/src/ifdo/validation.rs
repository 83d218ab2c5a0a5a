//! Structural validation of iFDO documents.
//!
//! This is not a JSON-Schema validator. It catches the mistakes that would
//! otherwise surface as confusing import failures: a missing or unsupported
//! version, missing header identity keys, malformed items, unknown
//! vocabulary values and out-of-range coordinates.

use std::fmt;

use serde_json::{Map, Value};

use super::mapping::{json_kind, FieldKind, Section, IFDO_MAPPING};
use super::parse::{HEADER_KEY, ITEMS_KEY};
use crate::geometry;
use crate::vocab;

pub const VERSION_KEY: &str = "image-set-ifdo-version";

/// Major versions the importer maps.
pub const SUPPORTED_VERSIONS: &[&str] = &["v2"];

/// Header keys every image set must declare.
pub const REQUIRED_HEADER_KEYS: &[&str] = &["image-set-name", "image-set-uuid", "image-set-handle"];

const LATITUDE_KEYS: &[&str] = &[
    "image-latitude",
    "image-set-min-latitude-degrees",
    "image-set-max-latitude-degrees",
];

const LONGITUDE_KEYS: &[&str] = &[
    "image-longitude",
    "image-set-min-longitude-degrees",
    "image-set-max-longitude-degrees",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Slash-separated location, e.g. `image-set-items/IMG_1.jpg/image-quality`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Collect every structural issue in `document`. An empty list means valid.
pub fn validate_document(document: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(root) = document.as_object() else {
        issues.push(ValidationIssue::new(
            "/",
            format!("document must be an object, got {}", json_kind(document)),
        ));
        return issues;
    };

    match root.get(HEADER_KEY).and_then(Value::as_object) {
        Some(header) => {
            check_version(header, &mut issues);
            for key in REQUIRED_HEADER_KEYS {
                if header.get(*key).map_or(true, Value::is_null) {
                    issues.push(ValidationIssue::new(
                        format!("{HEADER_KEY}/{key}"),
                        "required key is missing",
                    ));
                }
            }
            check_fields(header, Section::Header, HEADER_KEY, &mut issues);
        }
        None => issues.push(ValidationIssue::new(HEADER_KEY, "must be present and an object")),
    }

    match root.get(ITEMS_KEY).and_then(Value::as_object) {
        Some(items) if items.is_empty() => {
            issues.push(ValidationIssue::new(ITEMS_KEY, "must contain at least one item"))
        }
        Some(items) => {
            for (name, item) in items {
                let path = format!("{ITEMS_KEY}/{name}");
                check_item(&path, item, &mut issues);
            }
        }
        None => issues.push(ValidationIssue::new(ITEMS_KEY, "must be present and an object")),
    }

    issues
}

/// One line per issue, prefixed with a summary line.
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::from("Validation errors in the iFDO document:");
    for issue in issues {
        out.push('\n');
        out.push_str(&issue.to_string());
    }
    out
}

fn check_version(header: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
    let path = format!("{HEADER_KEY}/{VERSION_KEY}");
    match header.get(VERSION_KEY).and_then(Value::as_str) {
        None => issues.push(ValidationIssue::new(path, "version is not declared")),
        Some(version) => {
            let major = version.split('.').next().unwrap_or_default();
            if !SUPPORTED_VERSIONS.contains(&major) {
                issues.push(ValidationIssue::new(
                    path,
                    format!(
                        "unsupported version '{version}'. Supported: {}",
                        SUPPORTED_VERSIONS.join(", ")
                    ),
                ));
            }
        }
    }
}

fn check_item(path: &str, item: &Value, issues: &mut Vec<ValidationIssue>) {
    match item {
        Value::Object(fields) => check_fields(fields, Section::Items, path, issues),
        Value::Array(frames) if frames.is_empty() => {
            issues.push(ValidationIssue::new(path, "video item must contain at least one entry"))
        }
        Value::Array(frames) => {
            for (index, frame) in frames.iter().enumerate() {
                let frame_path = format!("{path}/{index}");
                match frame.as_object() {
                    Some(fields) => check_fields(fields, Section::Items, &frame_path, issues),
                    None => issues.push(ValidationIssue::new(
                        frame_path,
                        format!("must be an object, got {}", json_kind(frame)),
                    )),
                }
            }
        }
        other => issues.push(ValidationIssue::new(
            path,
            format!("must be an object or an array, got {}", json_kind(other)),
        )),
    }
}

fn check_fields(
    fields: &Map<String, Value>,
    section: Section,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for mapping in IFDO_MAPPING
        .iter()
        .filter(|m| m.kind == FieldKind::Vocabulary && m.location.applies_to(section))
    {
        let Some(value) = fields.get(mapping.key).filter(|v| !v.is_null()) else {
            continue;
        };
        let field_path = format!("{path}/{}", mapping.key);
        let Some(raw) = value.as_str() else {
            issues.push(ValidationIssue::new(field_path, "must be a string"));
            continue;
        };
        if let Some(normalize) = vocab::normalizer_for(mapping.column) {
            if let Err(err) = normalize(raw) {
                issues.push(ValidationIssue::new(field_path, err.to_string()));
            }
        }
    }

    let ranges: [(&[&str], fn(&str, f64) -> Result<(), crate::error::CoreError>); 2] = [
        (LATITUDE_KEYS, geometry::validate_latitude),
        (LONGITUDE_KEYS, geometry::validate_longitude),
    ];
    for (keys, check) in ranges {
        for key in keys {
            let Some(value) = fields.get(*key).filter(|v| !v.is_null()) else {
                continue;
            };
            let field_path = format!("{path}/{key}");
            match value.as_f64() {
                Some(number) => {
                    if let Err(err) = check(key, number) {
                        issues.push(ValidationIssue::new(field_path, err.to_string()));
                    }
                }
                None => issues.push(ValidationIssue::new(field_path, "must be a number")),
            }
        }
    }
}
