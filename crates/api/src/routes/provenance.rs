use axum::routing::post;
use axum::Router;
use ifdo_db::models::provenance::{
    CreateProvenanceActivity, CreateProvenanceAgent, CreateProvenanceEntity, ProvenanceActivity,
    ProvenanceAgent, ProvenanceEntity, UpdateProvenanceActivity, UpdateProvenanceAgent,
    UpdateProvenanceEntity,
};

use super::crud::{crud_router, CrudOps};
use crate::handlers::links;
use crate::state::AppState;

/// PROV records mounted at `/provenance`.
///
/// ```text
/// /agents                                    full CRUD
/// /entities                                  full CRUD
/// /entities/{id}/agents/{agent_id}           attributed to (POST link, DELETE unlink)
/// /entities/{id}/activities/{activity_id}    generated by
/// /activities                                full CRUD
/// /activities/{id}/agents/{agent_id}         associated with
/// /activities/{id}/entities/{entity_id}      used
/// ```
pub fn router() -> Router<AppState> {
    let agents =
        crud_router::<ProvenanceAgent, CreateProvenanceAgent, UpdateProvenanceAgent>(CrudOps::ALL);

    let entities =
        crud_router::<ProvenanceEntity, CreateProvenanceEntity, UpdateProvenanceEntity>(
            CrudOps::ALL,
        )
        .route(
            "/{id}/agents/{agent_id}",
            post(links::attach_entity_agent).delete(links::detach_entity_agent),
        )
        .route(
            "/{id}/activities/{activity_id}",
            post(links::attach_entity_activity).delete(links::detach_entity_activity),
        );

    let activities =
        crud_router::<ProvenanceActivity, CreateProvenanceActivity, UpdateProvenanceActivity>(
            CrudOps::ALL,
        )
        .route(
            "/{id}/agents/{agent_id}",
            post(links::attach_activity_agent).delete(links::detach_activity_agent),
        )
        .route(
            "/{id}/entities/{entity_id}",
            post(links::attach_activity_entity).delete(links::detach_activity_entity),
        );

    Router::new()
        .nest("/agents", agents)
        .nest("/entities", entities)
        .nest("/activities", activities)
}
