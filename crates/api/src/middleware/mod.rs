//! Response middleware.
//!
//! - [`error_path::add_error_path`] -- Stamps the request path into JSON error bodies.

pub mod error_path;
