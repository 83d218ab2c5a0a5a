//! Repository layer: zero-sized structs with async methods over a pool or
//! an open transaction.

pub mod crud_repo;
pub mod dataset_repo;
pub mod ifdo_import_repo;
pub mod image_repo;
pub mod link_repo;
pub mod relation_repo;

pub use crud_repo::CrudRepo;
pub use dataset_repo::DatasetRepo;
pub use ifdo_import_repo::IfdoImportRepo;
pub use image_repo::ImageRepo;
pub use link_repo::{LinkRepo, LinkTable};
pub use relation_repo::{LinkOwner, RelationRepo};
