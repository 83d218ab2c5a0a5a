//! Attach and detach handlers for many-to-many links addressed by two path keys.
//!
//! Attaching returns every row now linked to the owner; detaching returns 204.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ifdo_db::models::dataset::Dataset;
use ifdo_db::models::fields::ImageSetRelatedMaterial;
use ifdo_db::models::provenance::{ProvenanceActivity, ProvenanceAgent, ProvenanceEntity};
use ifdo_db::repositories::{LinkRepo, LinkTable};
use ifdo_db::resource::Resource;

use crate::error::AppResult;
use crate::extract::key;
use crate::state::AppState;

async fn attach_and_list<T: Resource + Sync>(
    state: &AppState,
    link: LinkTable,
    owner: &str,
    target: &str,
) -> AppResult<Vec<T>> {
    let (owner, target) = (key(owner)?, key(target)?);
    let mut tx = state.pool.begin().await?;
    let (owner_id, _) = LinkRepo::attach(&mut tx, link, owner, target).await?;
    let linked = LinkRepo::targets::<T, _>(&mut *tx, link, owner_id).await?;
    tx.commit().await?;
    Ok(linked)
}

async fn detach(state: &AppState, link: LinkTable, owner: &str, target: &str) -> AppResult<StatusCode> {
    LinkRepo::detach(&state.pool, link, key(owner)?, key(target)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Declares the POST and DELETE handler for one link table.
macro_rules! link_handlers {
    ($(#[$meta:meta])* $attach:ident, $detach:ident, $link:expr, $target:ty) => {
        $(#[$meta])*
        pub async fn $attach(
            State(state): State<AppState>,
            Path((id, target_id)): Path<(String, String)>,
        ) -> AppResult<Json<Vec<$target>>> {
            Ok(Json(attach_and_list::<$target>(&state, $link, &id, &target_id).await?))
        }

        pub async fn $detach(
            State(state): State<AppState>,
            Path((id, target_id)): Path<(String, String)>,
        ) -> AppResult<StatusCode> {
            detach(&state, $link, &id, &target_id).await
        }
    };
}

// ---------------------------------------------------------------------------
// Dataset links
// ---------------------------------------------------------------------------

link_handlers!(
    /// POST /v1/datasets/{id}/related_materials/{related_material_id}
    attach_dataset_related_material,
    detach_dataset_related_material,
    LinkTable::DatasetRelatedMaterials,
    ImageSetRelatedMaterial
);
link_handlers!(
    /// POST /v1/datasets/{id}/provenance/agents/{agent_id}
    attach_dataset_agent,
    detach_dataset_agent,
    LinkTable::DatasetProvenanceAgents,
    ProvenanceAgent
);
link_handlers!(
    /// POST /v1/datasets/{id}/provenance/entities/{entity_id}
    attach_dataset_entity,
    detach_dataset_entity,
    LinkTable::DatasetProvenanceEntities,
    ProvenanceEntity
);
link_handlers!(
    /// POST /v1/datasets/{id}/provenance/activities/{activity_id}
    attach_dataset_activity,
    detach_dataset_activity,
    LinkTable::DatasetProvenanceActivities,
    ProvenanceActivity
);

// ---------------------------------------------------------------------------
// Provenance graph edges
// ---------------------------------------------------------------------------

link_handlers!(
    /// POST /v1/provenance/entities/{id}/agents/{agent_id} (attributed to)
    attach_entity_agent,
    detach_entity_agent,
    LinkTable::EntityAgents,
    ProvenanceAgent
);
link_handlers!(
    /// POST /v1/provenance/entities/{id}/activities/{activity_id} (generated by)
    attach_entity_activity,
    detach_entity_activity,
    LinkTable::EntityActivities,
    ProvenanceActivity
);
link_handlers!(
    /// POST /v1/provenance/activities/{id}/agents/{agent_id} (associated with)
    attach_activity_agent,
    detach_activity_agent,
    LinkTable::ActivityAgents,
    ProvenanceAgent
);
link_handlers!(
    /// POST /v1/provenance/activities/{id}/entities/{entity_id} (used)
    attach_activity_entity,
    detach_activity_entity,
    LinkTable::ActivityEntities,
    ProvenanceEntity
);

// ---------------------------------------------------------------------------
// Annotation sets
// ---------------------------------------------------------------------------

link_handlers!(
    /// POST /v1/annotations/annotation_sets/{id}/datasets/{dataset_id}
    attach_annotation_set_dataset,
    detach_annotation_set_dataset,
    LinkTable::AnnotationSetDatasets,
    Dataset
);
