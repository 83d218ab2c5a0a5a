use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use ifdo_db::models::dataset::{Dataset, UpdateDataset};

use crate::handlers::ifdo::IMPORT_BODY_LIMIT;
use crate::handlers::{crud, dataset, ifdo, links};
use crate::state::AppState;

/// Dataset routes mounted at `/datasets`.
///
/// ```text
/// GET    /                                          -> index (?include_images)
/// POST   /                                          -> create
/// GET    /{id}                                      -> show (?include_images)
/// PUT    /{id}                                      -> update
/// DELETE /{id}                                      -> delete
/// GET    /{id}/annotations                          -> annotations
/// GET    /{id}/labels                               -> labels
/// POST   /{id}/creators                             -> attach_creator (body)
/// POST   /{id}/creators/{creator_id}                -> attach_creator_by_id
/// POST   /{id}/images                               -> attach_image (body)
/// POST   /{id}/images/{image_id}                    -> attach_image_by_id
/// POST   /{id}/related_materials/{rm_id}            -> attach, DELETE detaches
/// POST   /{id}/provenance/agents/{agent_id}         -> attach, DELETE detaches
/// POST   /{id}/provenance/entities/{entity_id}      -> attach, DELETE detaches
/// POST   /{id}/provenance/activities/{activity_id}  -> attach, DELETE detaches
/// POST   /ifdo/file                                 -> import (multipart `input_file`)
/// POST   /ifdo/{format}                             -> import (json | yaml body)
/// ```
pub fn router() -> Router<AppState> {
    let imports = Router::new()
        .route("/ifdo/file", post(ifdo::import_file))
        .route("/ifdo/{format}", post(ifdo::import_body))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT));

    Router::new()
        .route("/", get(dataset::index).post(dataset::create))
        .route(
            "/{id}",
            get(dataset::show)
                .put(crud::update::<Dataset, UpdateDataset>)
                .delete(crud::delete::<Dataset>),
        )
        .route("/{id}/annotations", get(dataset::annotations))
        .route("/{id}/labels", get(dataset::labels))
        .route("/{id}/creators", post(dataset::attach_creator))
        .route("/{id}/creators/{creator_id}", post(dataset::attach_creator_by_id))
        .route("/{id}/images", post(dataset::attach_image))
        .route("/{id}/images/{image_id}", post(dataset::attach_image_by_id))
        .route(
            "/{id}/related_materials/{related_material_id}",
            post(links::attach_dataset_related_material)
                .delete(links::detach_dataset_related_material),
        )
        .route(
            "/{id}/provenance/agents/{agent_id}",
            post(links::attach_dataset_agent).delete(links::detach_dataset_agent),
        )
        .route(
            "/{id}/provenance/entities/{entity_id}",
            post(links::attach_dataset_entity).delete(links::detach_dataset_entity),
        )
        .route(
            "/{id}/provenance/activities/{activity_id}",
            post(links::attach_dataset_activity).delete(links::detach_dataset_activity),
        )
        .merge(imports)
}
