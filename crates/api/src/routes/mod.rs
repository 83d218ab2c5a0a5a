pub mod annotation;
pub mod crud;
pub mod dataset;
pub mod fields;
pub mod health;
pub mod image;
pub mod provenance;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /datasets                       datasets, attachments, iFDO import
/// /images                         images, creators, merged view
/// /fields/{table}                 vocabulary and parameter-set tables
/// /annotations/{table}            annotations, labels, annotators, sets
/// /provenance/{agents|entities|activities}
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/datasets", dataset::router())
        .nest("/images", image::router())
        .nest("/fields", fields::router())
        .nest("/annotations", annotation::router())
        .nest("/provenance", provenance::router())
}
