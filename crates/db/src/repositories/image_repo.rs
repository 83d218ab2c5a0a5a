//! Image operations beyond plain CRUD.

use serde_json::Value;
use sqlx::{PgConnection, PgExecutor, PgPool};
use ifdo_core::relation::AttachSource;
use ifdo_core::types::ResourceKey;

use super::crud_repo::{column_list, CrudRepo};
use super::link_repo::{LinkRepo, LinkTable};
use super::relation_repo::{LinkOwner, RelationRepo};
use crate::error::DbError;
use crate::models::annotation::Annotation;
use crate::models::dataset::Dataset;
use crate::models::fields::ImageCreator;
use crate::models::image::{CreateImage, Image};
use crate::resource::{payload_from, Resource, WriteMode};

pub struct ImageRepo;

impl ImageRepo {
    pub async fn create(pool: &PgPool, input: &CreateImage) -> Result<Image, DbError> {
        let mut tx = pool.begin().await?;
        let image = Self::create_in(&mut tx, input).await?;
        tx.commit().await?;
        Ok(image)
    }

    /// Create an image with inline lookups and creators.
    ///
    /// A given `dataset_id` must exist; the error names the dataset rather
    /// than surfacing the foreign-key violation.
    pub async fn create_in(conn: &mut PgConnection, input: &CreateImage) -> Result<Image, DbError> {
        if let Some(dataset_id) = input.dataset_id {
            CrudRepo::find_id(
                &mut *conn,
                Dataset::TABLE,
                Dataset::ENTITY,
                ResourceKey::Id(dataset_id),
            )
            .await?;
        }

        let mut data = payload_from::<Image, _>(input, WriteMode::Create)?;
        RelationRepo::resolve_relations_in(&mut *conn, &input.nested.pending_relations()?, &mut data)
            .await?;
        let image = CrudRepo::create_map_in::<Image>(&mut *conn, data).await?;

        if let Some(creators) = input.nested.pending_creators()? {
            RelationRepo::link_lists_in(conn, LinkOwner::Image, image.id, &[creators]).await?;
        }
        Ok(image)
    }

    /// Image names are unique across the catalog.
    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM images WHERE name = $1",
            column_list(Image::COLUMNS.iter().copied(), None)
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    /// The image with unset fields filled from its dataset.
    pub async fn merged(pool: &PgPool, key: ResourceKey) -> Result<Image, DbError> {
        let image = CrudRepo::show::<Image>(pool, key).await?;
        let Some(dataset_id) = image.dataset_id else {
            return Ok(image);
        };
        match CrudRepo::find::<Dataset, _>(pool, ResourceKey::Id(dataset_id)).await? {
            Some(dataset) => Ok(image.merged_with(&dataset)),
            None => Ok(image),
        }
    }

    pub async fn creators(pool: &PgPool, key: ResourceKey) -> Result<Vec<ImageCreator>, DbError> {
        let image_id = CrudRepo::find_id(pool, Image::TABLE, Image::ENTITY, key).await?;
        Ok(LinkRepo::targets::<ImageCreator, _>(pool, LinkTable::ImageCreators, image_id).await?)
    }

    /// Link a creator and return all of the image's creators.
    pub async fn attach_creator(
        pool: &PgPool,
        key: ResourceKey,
        source: AttachSource<Value>,
    ) -> Result<Vec<ImageCreator>, DbError> {
        let mut tx = pool.begin().await?;
        let image_id = CrudRepo::find_id(&mut *tx, Image::TABLE, Image::ENTITY, key).await?;
        RelationRepo::attach_creator_in(&mut tx, LinkOwner::Image, image_id, source).await?;
        let creators =
            LinkRepo::targets::<ImageCreator, _>(&mut *tx, LinkTable::ImageCreators, image_id)
                .await?;
        tx.commit().await?;
        Ok(creators)
    }

    pub async fn annotations(pool: &PgPool, key: ResourceKey) -> Result<Vec<Annotation>, DbError> {
        let image_id = CrudRepo::find_id(pool, Image::TABLE, Image::ENTITY, key).await?;
        let query = format!(
            "SELECT {} FROM annotations WHERE image_id = $1 ORDER BY id",
            column_list(Annotation::COLUMNS.iter().copied(), None)
        );
        Ok(sqlx::query_as::<_, Annotation>(&query)
            .bind(image_id)
            .fetch_all(pool)
            .await?)
    }
}
