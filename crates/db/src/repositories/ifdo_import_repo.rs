//! Materializes a parsed iFDO document as one dataset and its images.

use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use ifdo_core::ifdo::parse::{ParsedDocument, ParsedSection};
use ifdo_core::types::DbId;

use super::crud_repo::CrudRepo;
use super::dataset_repo::DatasetRepo;
use super::relation_repo::{LinkOwner, RelationRepo};
use crate::error::DbError;
use crate::models::dataset::{Dataset, DatasetDetail};
use crate::models::image::Image;
use crate::resource::Resource;

pub struct IfdoImportRepo;

impl IfdoImportRepo {
    /// Import the whole document in one transaction.
    ///
    /// Any failure rolls back every row created so far and is reported as a
    /// validation error carrying the underlying cause.
    pub async fn import(pool: &PgPool, document: &ParsedDocument) -> Result<DatasetDetail, DbError> {
        let mut tx = pool.begin().await?;
        match Self::import_in(&mut tx, document).await {
            Ok(detail) => {
                tx.commit().await?;
                tracing::info!(
                    dataset_id = detail.dataset.id,
                    images = document.items.len(),
                    "iFDO document imported"
                );
                Ok(detail)
            }
            Err(err) => {
                tracing::warn!(error = %err, "iFDO import rolled back");
                Err(DbError::validation(format!(
                    "Failed to create the dataset from ifdo data. Error: {err}"
                )))
            }
        }
    }

    async fn import_in(
        conn: &mut PgConnection,
        document: &ParsedDocument,
    ) -> Result<DatasetDetail, DbError> {
        if !document.header.fields.contains_key("name") {
            return Err(DbError::validation("image-set-name is required in the header"));
        }

        let dataset = Self::create_section::<Dataset>(&mut *conn, &document.header, None).await?;
        RelationRepo::link_lists_in(&mut *conn, LinkOwner::Dataset, dataset.id, &document.header.lists)
            .await?;

        for item in &document.items {
            let image = Self::create_section::<Image>(&mut *conn, &item.section, Some(dataset.id))
                .await
                .map_err(|err| DbError::validation(format!("Item '{}': {err}", item.key)))?;
            RelationRepo::link_lists_in(&mut *conn, LinkOwner::Image, image.id, &item.section.lists)
                .await?;
        }

        DatasetRepo::detail_in(conn, dataset, true).await
    }

    async fn create_section<R: Resource>(
        conn: &mut PgConnection,
        section: &ParsedSection,
        dataset_id: Option<DbId>,
    ) -> Result<R, DbError> {
        let mut fields = section.fields.clone();
        RelationRepo::resolve_relations_in(&mut *conn, &section.relations, &mut fields).await?;
        if let Some(dataset_id) = dataset_id {
            fields.insert("dataset_id".to_string(), Value::from(dataset_id));
        }
        CrudRepo::create_map_in::<R>(conn, fields).await
    }
}
