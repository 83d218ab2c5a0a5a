//! Many-to-many join tables: creators, related materials, provenance graph
//! edges and annotation-set membership.

use sqlx::{PgConnection, PgExecutor, PgPool};
use ifdo_core::types::{DbId, ResourceKey};

use super::crud_repo::{column_list, CrudRepo};
use crate::error::DbError;
use crate::resource::Resource;

/// Every join table, with the owning side first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTable {
    DatasetCreators,
    ImageCreators,
    DatasetRelatedMaterials,
    DatasetProvenanceAgents,
    DatasetProvenanceEntities,
    DatasetProvenanceActivities,
    /// Entity was attributed to agent.
    EntityAgents,
    /// Entity was generated by activity.
    EntityActivities,
    /// Activity was associated with agent.
    ActivityAgents,
    /// Activity used entity.
    ActivityEntities,
    AnnotationSetDatasets,
}

struct Side {
    table: &'static str,
    entity: &'static str,
    column: &'static str,
}

const DATASET: Side = Side {
    table: "datasets",
    entity: "Dataset",
    column: "dataset_id",
};
const IMAGE: Side = Side {
    table: "images",
    entity: "Image",
    column: "image_id",
};
const CREATOR: Side = Side {
    table: "image_creators",
    entity: "Image creator",
    column: "creator_id",
};
const RELATED_MATERIAL: Side = Side {
    table: "image_set_related_materials",
    entity: "Related material",
    column: "related_material_id",
};
const AGENT: Side = Side {
    table: "provenance_agents",
    entity: "Provenance agent",
    column: "agent_id",
};
const ENTITY: Side = Side {
    table: "provenance_entities",
    entity: "Provenance entity",
    column: "entity_id",
};
const ACTIVITY: Side = Side {
    table: "provenance_activities",
    entity: "Provenance activity",
    column: "activity_id",
};
const ANNOTATION_SET: Side = Side {
    table: "annotation_sets",
    entity: "Annotation set",
    column: "annotation_set_id",
};

impl LinkTable {
    pub fn table(&self) -> &'static str {
        match self {
            Self::DatasetCreators => "datasets_creators",
            Self::ImageCreators => "images_creators",
            Self::DatasetRelatedMaterials => "datasets_related_materials",
            Self::DatasetProvenanceAgents => "datasets_provenance_agents",
            Self::DatasetProvenanceEntities => "datasets_provenance_entities",
            Self::DatasetProvenanceActivities => "datasets_provenance_activities",
            Self::EntityAgents => "provenance_entity_agents",
            Self::EntityActivities => "provenance_entity_activities",
            Self::ActivityAgents => "provenance_activity_agents",
            Self::ActivityEntities => "provenance_activity_entities",
            Self::AnnotationSetDatasets => "annotation_sets_datasets",
        }
    }

    fn owner(&self) -> Side {
        match self {
            Self::DatasetCreators
            | Self::DatasetRelatedMaterials
            | Self::DatasetProvenanceAgents
            | Self::DatasetProvenanceEntities
            | Self::DatasetProvenanceActivities => DATASET,
            Self::ImageCreators => IMAGE,
            Self::EntityAgents | Self::EntityActivities => ENTITY,
            Self::ActivityAgents | Self::ActivityEntities => ACTIVITY,
            Self::AnnotationSetDatasets => ANNOTATION_SET,
        }
    }

    fn target(&self) -> Side {
        match self {
            Self::DatasetCreators | Self::ImageCreators => CREATOR,
            Self::DatasetRelatedMaterials => RELATED_MATERIAL,
            Self::DatasetProvenanceAgents | Self::EntityAgents | Self::ActivityAgents => AGENT,
            Self::DatasetProvenanceEntities | Self::ActivityEntities => ENTITY,
            Self::DatasetProvenanceActivities | Self::EntityActivities => ACTIVITY,
            Self::AnnotationSetDatasets => DATASET,
        }
    }

    pub fn owner_column(&self) -> &'static str {
        self.owner().column
    }

    pub fn target_column(&self) -> &'static str {
        self.target().column
    }

    pub fn target_table(&self) -> &'static str {
        self.target().table
    }
}

pub struct LinkRepo;

impl LinkRepo {
    /// Insert a link. Returns `false` when it already existed.
    pub async fn link<'e, E: PgExecutor<'e>>(
        executor: E,
        link: LinkTable,
        owner_id: DbId,
        target_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            link.table(),
            link.owner_column(),
            link.target_column()
        );
        let result = sqlx::query(&query)
            .bind(owner_id)
            .bind(target_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a link. Returns `false` when there was none.
    pub async fn unlink(
        pool: &PgPool,
        link: LinkTable,
        owner_id: DbId,
        target_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            link.table(),
            link.owner_column(),
            link.target_column()
        );
        let result = sqlx::query(&query)
            .bind(owner_id)
            .bind(target_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows linked to `owner_id`, oldest link target first.
    pub async fn targets<'e, R, E>(
        executor: E,
        link: LinkTable,
        owner_id: DbId,
    ) -> Result<Vec<R>, sqlx::Error>
    where
        R: Resource,
        E: PgExecutor<'e>,
    {
        debug_assert_eq!(R::TABLE, link.target_table());
        let query = format!(
            "SELECT {columns} FROM {target} AS t \
             JOIN {join} AS j ON j.{target_column} = t.id \
             WHERE j.{owner_column} = $1 \
             ORDER BY t.id",
            columns = column_list(R::COLUMNS.iter().copied(), Some("t")),
            target = link.target_table(),
            join = link.table(),
            target_column = link.target_column(),
            owner_column = link.owner_column(),
        );
        sqlx::query_as::<_, R>(&query)
            .bind(owner_id)
            .fetch_all(executor)
            .await
    }

    /// Link two existing rows addressed by id or UUID.
    ///
    /// Either side missing is `NotFound`; a link that already exists is a
    /// validation error.
    pub async fn attach(
        conn: &mut PgConnection,
        link: LinkTable,
        owner: ResourceKey,
        target: ResourceKey,
    ) -> Result<(DbId, DbId), DbError> {
        let owner_side = link.owner();
        let target_side = link.target();
        let owner_id =
            CrudRepo::find_id(&mut *conn, owner_side.table, owner_side.entity, owner).await?;
        let target_id =
            CrudRepo::find_id(&mut *conn, target_side.table, target_side.entity, target).await?;

        if !Self::link(&mut *conn, link, owner_id, target_id).await? {
            return Err(DbError::validation(format!(
                "{} {target_id} is already linked to {} {owner_id}",
                target_side.entity, owner_side.entity
            )));
        }
        tracing::debug!(link = link.table(), owner_id, target_id, "Rows linked");
        Ok((owner_id, target_id))
    }

    /// Remove a link between rows addressed by id or UUID.
    pub async fn detach(
        pool: &PgPool,
        link: LinkTable,
        owner: ResourceKey,
        target: ResourceKey,
    ) -> Result<(), DbError> {
        let owner_side = link.owner();
        let target_side = link.target();
        let owner_id = CrudRepo::find_id(pool, owner_side.table, owner_side.entity, owner).await?;
        let target_id =
            CrudRepo::find_id(pool, target_side.table, target_side.entity, target).await?;
        if !Self::unlink(pool, link, owner_id, target_id).await? {
            return Err(DbError::validation(format!(
                "{} {target_id} is not linked to {} {owner_id}",
                target_side.entity, owner_side.entity
            )));
        }
        Ok(())
    }
}
