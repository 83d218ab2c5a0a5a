//! Resolves nested lookups to foreign keys and join-table links.
//!
//! Used by dataset/image creation with inline lookups and by the iFDO
//! import. Everything runs on the caller's connection so a failure rolls
//! back with the surrounding transaction.

use serde_json::{Map, Value};
use sqlx::PgConnection;
use ifdo_core::ifdo::mapping::RelationKind;
use ifdo_core::ifdo::parse::{PendingRelation, PendingRelationList};
use ifdo_core::relation::AttachSource;
use ifdo_core::types::DbId;

use super::crud_repo::CrudRepo;
use super::link_repo::{LinkRepo, LinkTable};
use crate::error::DbError;
use crate::models::fields::{
    ImageCameraCalibrationModel, ImageCameraHousingViewport, ImageCameraPose, ImageContext,
    ImageCreator, ImageDomeportParameter, ImageEvent, ImageFlatportParameter, ImageLicense,
    ImagePhotometricCalibration, ImagePi, ImagePlatform, ImageProject, ImageSensor,
    ImageSetRelatedMaterial,
};
use crate::resource::Resource;

/// The aggregate a relation list is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOwner {
    Dataset,
    Image,
}

impl LinkOwner {
    fn link_for(&self, kind: RelationKind) -> Result<LinkTable, DbError> {
        match (self, kind) {
            (Self::Dataset, RelationKind::Creator) => Ok(LinkTable::DatasetCreators),
            (Self::Image, RelationKind::Creator) => Ok(LinkTable::ImageCreators),
            (Self::Dataset, RelationKind::RelatedMaterial) => Ok(LinkTable::DatasetRelatedMaterials),
            (owner, kind) => Err(DbError::validation(format!(
                "{owner:?} rows cannot hold a list of {}",
                kind.table()
            ))),
        }
    }
}

async fn resolve_as<R: Resource>(
    conn: &mut PgConnection,
    kind: RelationKind,
    data: Map<String, Value>,
) -> Result<DbId, DbError> {
    let row = CrudRepo::get_or_create_in::<R>(conn, kind.unique_key(), data).await?;
    Ok(row.id())
}

pub struct RelationRepo;

impl RelationRepo {
    /// Get-or-create one related row and return its id.
    pub async fn resolve_in(
        conn: &mut PgConnection,
        kind: RelationKind,
        data: Map<String, Value>,
    ) -> Result<DbId, DbError> {
        match kind {
            RelationKind::Context => resolve_as::<ImageContext>(conn, kind, data).await,
            RelationKind::Project => resolve_as::<ImageProject>(conn, kind, data).await,
            RelationKind::Event => resolve_as::<ImageEvent>(conn, kind, data).await,
            RelationKind::Platform => resolve_as::<ImagePlatform>(conn, kind, data).await,
            RelationKind::Sensor => resolve_as::<ImageSensor>(conn, kind, data).await,
            RelationKind::Pi => resolve_as::<ImagePi>(conn, kind, data).await,
            RelationKind::License => resolve_as::<ImageLicense>(conn, kind, data).await,
            RelationKind::Creator => resolve_as::<ImageCreator>(conn, kind, data).await,
            RelationKind::CameraPose => resolve_as::<ImageCameraPose>(conn, kind, data).await,
            RelationKind::CameraHousingViewport => {
                resolve_as::<ImageCameraHousingViewport>(conn, kind, data).await
            }
            RelationKind::FlatportParameters => {
                resolve_as::<ImageFlatportParameter>(conn, kind, data).await
            }
            RelationKind::DomeportParameters => {
                resolve_as::<ImageDomeportParameter>(conn, kind, data).await
            }
            RelationKind::CameraCalibrationModel => {
                resolve_as::<ImageCameraCalibrationModel>(conn, kind, data).await
            }
            RelationKind::PhotometricCalibration => {
                resolve_as::<ImagePhotometricCalibration>(conn, kind, data).await
            }
            RelationKind::RelatedMaterial => {
                resolve_as::<ImageSetRelatedMaterial>(conn, kind, data).await
            }
        }
    }

    /// Resolve every pending relation and write its id into `fields`.
    pub async fn resolve_relations_in(
        conn: &mut PgConnection,
        relations: &[PendingRelation],
        fields: &mut Map<String, Value>,
    ) -> Result<(), DbError> {
        for relation in relations {
            let id = Self::resolve_in(&mut *conn, relation.kind, relation.data.clone()).await?;
            fields.insert(relation.column.to_string(), Value::from(id));
        }
        Ok(())
    }

    /// Link a creator, existing or inline, to a dataset or image.
    ///
    /// Inline creators are get-or-created by name. Linking a creator twice
    /// is a validation error.
    pub async fn attach_creator_in(
        conn: &mut PgConnection,
        owner: LinkOwner,
        owner_id: DbId,
        source: AttachSource<Value>,
    ) -> Result<ImageCreator, DbError> {
        let creator = match source {
            AttachSource::Existing(key) => CrudRepo::find::<ImageCreator, _>(&mut *conn, key)
                .await?
                .ok_or_else(|| DbError::not_found(ImageCreator::ENTITY, key))?,
            AttachSource::Inline(body) => {
                let data = RelationKind::Creator.translate(&body)?;
                CrudRepo::get_or_create_in::<ImageCreator>(
                    &mut *conn,
                    RelationKind::Creator.unique_key(),
                    data,
                )
                .await?
            }
        };

        let link = owner.link_for(RelationKind::Creator)?;
        if !LinkRepo::link(&mut *conn, link, owner_id, creator.id).await? {
            return Err(DbError::validation(format!(
                "Creator '{}' is already linked to {owner:?} {owner_id}",
                creator.name
            )));
        }
        Ok(creator)
    }

    /// Resolve every row of every list and link it to `owner_id`.
    ///
    /// Duplicate entries in one list resolve to the same row and link once.
    pub async fn link_lists_in(
        conn: &mut PgConnection,
        owner: LinkOwner,
        owner_id: DbId,
        lists: &[PendingRelationList],
    ) -> Result<(), DbError> {
        for list in lists {
            let link = owner.link_for(list.kind)?;
            for item in &list.items {
                let target_id = Self::resolve_in(&mut *conn, list.kind, item.clone()).await?;
                LinkRepo::link(&mut *conn, link, owner_id, target_id).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn list_links_by_owner() {
        assert_eq!(
            LinkOwner::Image.link_for(RelationKind::Creator).unwrap(),
            LinkTable::ImageCreators
        );
        assert_eq!(
            LinkOwner::Dataset.link_for(RelationKind::RelatedMaterial).unwrap(),
            LinkTable::DatasetRelatedMaterials
        );
        assert_matches!(
            LinkOwner::Image.link_for(RelationKind::RelatedMaterial),
            Err(DbError::Core(_))
        );
    }
}
