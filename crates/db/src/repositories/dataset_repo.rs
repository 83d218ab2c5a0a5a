//! Dataset operations beyond plain CRUD: nested creation, detail views,
//! attachments and the annotation/label roll-ups.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::{PgConnection, PgExecutor, PgPool};
use ifdo_core::ifdo::mapping::RelationKind;
use ifdo_core::ifdo::parse::PendingRelationList;
use ifdo_core::query::IndexQuery;
use ifdo_core::relation::AttachSource;
use ifdo_core::types::{DbId, ResourceKey};

use super::crud_repo::{column_list, CrudRepo};
use super::image_repo::ImageRepo;
use super::link_repo::{LinkRepo, LinkTable};
use super::relation_repo::{LinkOwner, RelationRepo};
use crate::error::DbError;
use crate::models::annotation::{Annotation, Label};
use crate::models::dataset::{CreateDataset, Dataset, DatasetDetail, DatasetWithImages};
use crate::models::fields::{ImageCreator, ImageSetRelatedMaterial};
use crate::models::image::{CreateImage, Image, UpdateImage};
use crate::resource::{payload_from, Resource, WriteMode};

pub struct DatasetRepo;

impl DatasetRepo {
    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a dataset, resolving inline lookups, creators and related
    /// materials in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateDataset) -> Result<DatasetDetail, DbError> {
        let mut tx = pool.begin().await?;
        let dataset = Self::create_in(&mut tx, input).await?;
        let detail = Self::detail_in(&mut tx, dataset, false).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn create_in(conn: &mut PgConnection, input: &CreateDataset) -> Result<Dataset, DbError> {
        let mut data = payload_from::<Dataset, _>(input, WriteMode::Create)?;
        RelationRepo::resolve_relations_in(&mut *conn, &input.nested.pending_relations()?, &mut data)
            .await?;
        let dataset = CrudRepo::create_map_in::<Dataset>(&mut *conn, data).await?;

        let mut lists = Vec::new();
        if let Some(creators) = input.nested.pending_creators()? {
            lists.push(creators);
        }
        if !input.related_materials.is_empty() {
            let items = input
                .related_materials
                .iter()
                .map(|material| RelationKind::RelatedMaterial.translate(material))
                .collect::<Result<Vec<_>, _>>()?;
            lists.push(PendingRelationList {
                kind: RelationKind::RelatedMaterial,
                items,
            });
        }
        RelationRepo::link_lists_in(conn, LinkOwner::Dataset, dataset.id, &lists).await?;

        tracing::info!(dataset_id = dataset.id, name = %dataset.name, "Dataset created");
        Ok(dataset)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A dataset with its creators, related materials and optionally images.
    pub async fn show_detail(
        pool: &PgPool,
        key: ResourceKey,
        include_images: bool,
    ) -> Result<DatasetDetail, DbError> {
        let mut conn = pool.acquire().await?;
        let dataset = CrudRepo::find::<Dataset, _>(&mut *conn, key)
            .await?
            .ok_or_else(|| DbError::not_found(Dataset::ENTITY, key))?;
        Self::detail_in(&mut conn, dataset, include_images).await
    }

    pub async fn detail_in(
        conn: &mut PgConnection,
        dataset: Dataset,
        include_images: bool,
    ) -> Result<DatasetDetail, DbError> {
        let creators =
            LinkRepo::targets::<ImageCreator, _>(&mut *conn, LinkTable::DatasetCreators, dataset.id)
                .await?;
        let related_materials = LinkRepo::targets::<ImageSetRelatedMaterial, _>(
            &mut *conn,
            LinkTable::DatasetRelatedMaterials,
            dataset.id,
        )
        .await?;
        let images = if include_images {
            Some(Self::images(&mut *conn, dataset.id).await?)
        } else {
            None
        };
        Ok(DatasetDetail {
            dataset,
            creators,
            related_materials,
            images,
        })
    }

    /// Images of one dataset, oldest first.
    pub async fn images<'e, E: PgExecutor<'e>>(
        executor: E,
        dataset_id: DbId,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM images WHERE dataset_id = $1 ORDER BY id",
            column_list(Image::COLUMNS.iter().copied(), None)
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(dataset_id)
            .fetch_all(executor)
            .await
    }

    /// Listing with each dataset's images, loaded in one extra query.
    pub async fn index_with_images(
        pool: &PgPool,
        query: &IndexQuery,
    ) -> Result<Vec<DatasetWithImages>, DbError> {
        let datasets = CrudRepo::index::<Dataset>(pool, query).await?;
        if datasets.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DbId> = datasets.iter().map(|d| d.id).collect();
        let sql = format!(
            "SELECT {} FROM images WHERE dataset_id = ANY($1) ORDER BY id",
            column_list(Image::COLUMNS.iter().copied(), None)
        );
        let images = sqlx::query_as::<_, Image>(&sql)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        let mut by_dataset: HashMap<DbId, Vec<Image>> = HashMap::new();
        for image in images {
            if let Some(dataset_id) = image.dataset_id {
                by_dataset.entry(dataset_id).or_default().push(image);
            }
        }
        Ok(datasets
            .into_iter()
            .map(|dataset| DatasetWithImages {
                images: by_dataset.remove(&dataset.id).unwrap_or_default(),
                dataset,
            })
            .collect())
    }

    /// Every annotation on any image of the dataset.
    pub async fn annotations(pool: &PgPool, key: ResourceKey) -> Result<Vec<Annotation>, DbError> {
        let dataset_id = CrudRepo::find_id(pool, Dataset::TABLE, Dataset::ENTITY, key).await?;
        let query = format!(
            "SELECT {} FROM annotations AS a \
             JOIN images AS i ON i.id = a.image_id \
             WHERE i.dataset_id = $1 \
             ORDER BY a.id",
            column_list(Annotation::COLUMNS.iter().copied(), Some("a"))
        );
        Ok(sqlx::query_as::<_, Annotation>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await?)
    }

    /// Distinct labels used by annotations on the dataset's images.
    pub async fn labels(pool: &PgPool, key: ResourceKey) -> Result<Vec<Label>, DbError> {
        let dataset_id = CrudRepo::find_id(pool, Dataset::TABLE, Dataset::ENTITY, key).await?;
        let query = format!(
            "SELECT {} FROM labels AS l \
             WHERE l.id IN ( \
                 SELECT al.label_id FROM annotation_labels AS al \
                 JOIN annotations AS a ON a.id = al.annotation_id \
                 JOIN images AS i ON i.id = a.image_id \
                 WHERE i.dataset_id = $1) \
             ORDER BY l.name",
            column_list(Label::COLUMNS.iter().copied(), Some("l"))
        );
        Ok(sqlx::query_as::<_, Label>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await?)
    }

    // -----------------------------------------------------------------------
    // Attachments
    // -----------------------------------------------------------------------

    /// Link a creator and return the dataset detail.
    pub async fn attach_creator(
        pool: &PgPool,
        key: ResourceKey,
        source: AttachSource<Value>,
    ) -> Result<DatasetDetail, DbError> {
        let mut tx = pool.begin().await?;
        let dataset = CrudRepo::find::<Dataset, _>(&mut *tx, key)
            .await?
            .ok_or_else(|| DbError::not_found(Dataset::ENTITY, key))?;
        RelationRepo::attach_creator_in(&mut tx, LinkOwner::Dataset, dataset.id, source).await?;
        let detail = Self::detail_in(&mut tx, dataset, false).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Move an image into the dataset.
    ///
    /// An inline image is matched by name and only created when no image has
    /// that name. An image already in the dataset is a validation error.
    pub async fn attach_image(
        pool: &PgPool,
        key: ResourceKey,
        source: AttachSource<CreateImage>,
    ) -> Result<Image, DbError> {
        let mut tx = pool.begin().await?;
        let dataset_id = CrudRepo::find_id(&mut *tx, Dataset::TABLE, Dataset::ENTITY, key).await?;
        let image = match source {
            AttachSource::Existing(image_key) => {
                let image = CrudRepo::find::<Image, _>(&mut *tx, image_key)
                    .await?
                    .ok_or_else(|| DbError::not_found(Image::ENTITY, image_key))?;
                Self::move_image_in(&mut tx, image, dataset_id).await?
            }
            AttachSource::Inline(mut input) => {
                match ImageRepo::find_by_name(&mut *tx, &input.name).await? {
                    Some(image) => Self::move_image_in(&mut tx, image, dataset_id).await?,
                    None => {
                        input.dataset_id = Some(dataset_id);
                        ImageRepo::create_in(&mut tx, &input).await?
                    }
                }
            }
        };
        tx.commit().await?;
        tracing::info!(dataset_id, image_id = image.id, "Image attached to dataset");
        Ok(image)
    }

    async fn move_image_in(
        conn: &mut PgConnection,
        image: Image,
        dataset_id: DbId,
    ) -> Result<Image, DbError> {
        if image.dataset_id == Some(dataset_id) {
            return Err(DbError::validation("Image already exists in the dataset."));
        }
        let update = UpdateImage {
            dataset_id: Some(dataset_id),
            ..Default::default()
        };
        CrudRepo::update_in::<Image, _>(conn, ResourceKey::Id(image.id), &update).await
    }
}
