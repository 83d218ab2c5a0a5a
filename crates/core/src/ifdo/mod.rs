//! iFDO (image FAIR Digital Object) documents.
//!
//! - [`mapping`]: which iFDO key lands in which column or relation.
//! - [`parse`]: document to flat column maps plus pending relations.
//! - [`validation`]: structural checks run before import.

pub mod mapping;
pub mod parse;
pub mod validation;

pub use mapping::{FieldKind, FieldMapping, Location, RelationKind, Section, IFDO_MAPPING};
pub use parse::{parse_document, parse_section, ParsedDocument, ParsedItem, ParsedSection};
pub use validation::{validate_document, ValidationIssue};
