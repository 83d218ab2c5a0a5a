use axum::routing::post;
use axum::Router;
use ifdo_db::models::annotation::{
    Annotation, AnnotationLabel, AnnotationSet, Annotator, CreateAnnotation,
    CreateAnnotationLabel, CreateAnnotationSet, CreateAnnotator, CreateLabel, Label,
    UpdateAnnotation, UpdateAnnotationLabel, UpdateAnnotationSet, UpdateAnnotator, UpdateLabel,
};

use super::crud::{crud_router, CrudOps};
use crate::handlers::links;
use crate::state::AppState;

/// Annotation tables mounted at `/annotations`.
///
/// ```text
/// /annotations                                 full CRUD
/// /annotation_labels                           full CRUD
/// /annotators                                  full CRUD
/// /labels                                      full CRUD
/// /annotation_sets                             full CRUD
/// /annotation_sets/{id}/datasets/{dataset_id}  link (POST), unlink (DELETE)
/// ```
pub fn router() -> Router<AppState> {
    let annotation_sets = crud_router::<AnnotationSet, CreateAnnotationSet, UpdateAnnotationSet>(
        CrudOps::ALL,
    )
    .route(
        "/{id}/datasets/{dataset_id}",
        post(links::attach_annotation_set_dataset).delete(links::detach_annotation_set_dataset),
    );

    Router::new()
        .nest(
            "/annotations",
            crud_router::<Annotation, CreateAnnotation, UpdateAnnotation>(CrudOps::ALL),
        )
        .nest(
            "/annotation_labels",
            crud_router::<AnnotationLabel, CreateAnnotationLabel, UpdateAnnotationLabel>(
                CrudOps::ALL,
            ),
        )
        .nest(
            "/annotators",
            crud_router::<Annotator, CreateAnnotator, UpdateAnnotator>(CrudOps::ALL),
        )
        .nest(
            "/labels",
            crud_router::<Label, CreateLabel, UpdateLabel>(CrudOps::ALL),
        )
        .nest("/annotation_sets", annotation_sets)
}
