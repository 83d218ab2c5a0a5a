use axum::routing::{get, post};
use axum::Router;
use ifdo_db::models::image::{Image, UpdateImage};

use crate::handlers::{crud, image};
use crate::state::AppState;

/// Image routes mounted at `/images`.
///
/// ```text
/// GET    /                              -> index
/// POST   /                              -> create
/// GET    /{id}                          -> show
/// PUT    /{id}                          -> update
/// DELETE /{id}                          -> delete
/// GET    /{id}/merged                   -> merged (dataset fallback applied)
/// GET    /{id}/annotations              -> annotations
/// GET    /{id}/creators                 -> creators
/// POST   /{id}/creators                 -> attach_creator (body)
/// POST   /{id}/creators/{creator_id}    -> attach_creator_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(crud::index::<Image>).post(image::create))
        .route(
            "/{id}",
            get(crud::show::<Image>)
                .put(crud::update::<Image, UpdateImage>)
                .delete(crud::delete::<Image>),
        )
        .route("/{id}/merged", get(image::merged))
        .route("/{id}/annotations", get(image::annotations))
        .route("/{id}/creators", get(image::creators).post(image::attach_creator))
        .route("/{id}/creators/{creator_id}", post(image::attach_creator_by_id))
}
