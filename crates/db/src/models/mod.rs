pub mod annotation;
pub mod common;
pub mod dataset;
pub mod fields;
pub mod image;
pub mod provenance;
