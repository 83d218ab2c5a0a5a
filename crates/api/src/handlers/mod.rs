pub mod crud;
pub mod dataset;
pub mod ifdo;
pub mod image;
pub mod links;
