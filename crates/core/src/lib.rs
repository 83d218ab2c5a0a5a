//! Pure domain logic for the iFDO catalog.
//!
//! Nothing in this crate touches the database or the network. The `db` and
//! `api` crates call into it for identifier parsing, controlled vocabularies,
//! geometry derivation, annotation rules, query rendering and the iFDO
//! document mapper.

pub mod annotation;
pub mod error;
pub mod geometry;
pub mod ifdo;
pub mod provenance;
pub mod query;
pub mod relation;
pub mod types;
pub mod vocab;
