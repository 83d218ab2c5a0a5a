//! Integration tests for the generic CRUD repository and the dataset/image
//! repositories built on it.

use assert_matches::assert_matches;
use sqlx::PgPool;
use ifdo_core::error::CoreError;
use ifdo_core::query::IndexQuery;
use ifdo_core::relation::AttachSource;
use ifdo_core::types::ResourceKey;
use ifdo_db::models::annotation::{Annotation, CreateAnnotation};
use ifdo_db::models::common::CommonFields;
use ifdo_db::models::dataset::{CreateDataset, Dataset, UpdateDataset};
use ifdo_db::models::fields::{CreateNamedLookup, ImageLicense};
use ifdo_db::models::image::{CreateImage, Image, UpdateImage};
use ifdo_db::repositories::{CrudRepo, DatasetRepo, ImageRepo};
use ifdo_db::DbError;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_dataset(name: &str) -> CreateDataset {
    CreateDataset {
        name: name.to_string(),
        ..Default::default()
    }
}

fn new_image(dataset_id: i64, name: &str) -> CreateImage {
    CreateImage {
        dataset_id: Some(dataset_id),
        name: name.to_string(),
        ..Default::default()
    }
}

fn params(pairs: &[(&str, &str)]) -> std::collections::BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Show / index
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_show_by_id_and_uuid(pool: PgPool) {
    let created = DatasetRepo::create(&pool, &new_dataset("Dive 1")).await.unwrap();

    let by_id = CrudRepo::show::<Dataset>(&pool, ResourceKey::Id(created.dataset.id))
        .await
        .unwrap();
    let by_uuid = CrudRepo::show::<Dataset>(&pool, ResourceKey::Uuid(created.dataset.uuid))
        .await
        .unwrap();
    assert_eq!(by_id.id, by_uuid.id);
    assert_eq!(by_id.local_path.as_deref(), Some("../raw"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_show_missing_is_not_found(pool: PgPool) {
    let result = CrudRepo::show::<Dataset>(&pool, ResourceKey::Id(999_999)).await;
    assert_matches!(
        result,
        Err(DbError::Core(CoreError::NotFound { entity: "Dataset", .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_index_rejects_unknown_order_by(pool: PgPool) {
    let query = IndexQuery {
        order_by: "no_such_column".to_string(),
        ..Default::default()
    };
    let result = CrudRepo::index::<Dataset>(&pool, &query).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(msg))) if msg.contains("order_by"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_index_filters_and_orders(pool: PgPool) {
    for name in ["Alpha", "Beta", "Gamma"] {
        DatasetRepo::create(&pool, &new_dataset(name)).await.unwrap();
    }

    let query = IndexQuery::from_params(
        &params(&[("order_by", "name"), ("desc", "false")]),
        <Dataset as ifdo_db::resource::Resource>::COLUMNS,
    )
    .unwrap();
    let names: Vec<String> = CrudRepo::index::<Dataset>(&pool, &query)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, ["Alpha", "Beta", "Gamma"]);

    let query = IndexQuery::from_params(
        &params(&[("name__like", "ET"), ("name__ne", "Gamma")]),
        <Dataset as ifdo_db::resource::Resource>::COLUMNS,
    )
    .unwrap();
    let found = CrudRepo::index::<Dataset>(&pool, &query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Beta");

    let query = IndexQuery::from_params(
        &params(&[("name__in", "Alpha,Gamma")]),
        <Dataset as ifdo_db::resource::Resource>::COLUMNS,
    )
    .unwrap();
    assert_eq!(CrudRepo::index::<Dataset>(&pool, &query).await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Geometry derivation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_four_bounds_build_polygon_three_do_not(pool: PgPool) {
    let mut three = new_dataset("Three bounds");
    three.min_latitude_degrees = Some(50.0);
    three.max_latitude_degrees = Some(51.0);
    three.min_longitude_degrees = Some(-5.0);
    let three = DatasetRepo::create(&pool, &three).await.unwrap().dataset;
    assert!(three.limits.is_none());

    let update = UpdateDataset {
        max_longitude_degrees: Some(-4.0),
        ..Default::default()
    };
    let four = CrudRepo::update::<Dataset, _>(&pool, ResourceKey::Id(three.id), &update)
        .await
        .unwrap();
    let limits = four.limits.expect("polygon once all four bounds are set");
    assert_eq!(limits["type"], "Polygon");
    assert_eq!(limits["coordinates"][0].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_location_rederived_on_update(pool: PgPool) {
    let mut input = new_dataset("Located");
    input.common = CommonFields {
        latitude: Some(10.0),
        longitude: Some(20.0),
        ..Default::default()
    };
    let created = DatasetRepo::create(&pool, &input).await.unwrap().dataset;
    assert_eq!(created.location.as_ref().unwrap()["coordinates"], json!([20.0, 10.0]));

    let update = UpdateDataset {
        common: CommonFields {
            latitude: Some(-30.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let updated = CrudRepo::update::<Dataset, _>(&pool, ResourceKey::Id(created.id), &update)
        .await
        .unwrap();
    assert_eq!(updated.location.unwrap()["coordinates"], json!([20.0, -30.0]));
    assert_eq!(updated.name, "Located");
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_rejects_bad_vocabulary(pool: PgPool) {
    let created = DatasetRepo::create(&pool, &new_dataset("Vocab")).await.unwrap().dataset;
    let update = UpdateDataset {
        common: CommonFields {
            quality: Some("excellent".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = CrudRepo::update::<Dataset, _>(&pool, ResourceKey::Id(created.id), &update).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rename_onto_existing_name_is_conflict(pool: PgPool) {
    DatasetRepo::create(&pool, &new_dataset("Taken")).await.unwrap();
    let other = DatasetRepo::create(&pool, &new_dataset("Free")).await.unwrap().dataset;
    let update = UpdateDataset {
        name: Some("Taken".to_string()),
        ..Default::default()
    };
    let result = CrudRepo::update::<Dataset, _>(&pool, ResourceKey::Id(other.id), &update).await;
    assert_matches!(
        result,
        Err(DbError::Core(CoreError::Conflict(msg))) if msg == "Dataset with this name already exists"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_dataset_cascades_to_images_and_annotations(pool: PgPool) {
    let license = CrudRepo::create::<ImageLicense, _>(
        &pool,
        &CreateNamedLookup {
            name: "CC-BY".to_string(),
            uri: None,
        },
    )
    .await
    .unwrap();

    let mut input = new_dataset("Cascade");
    input.refs.license_id = Some(license.id);
    let dataset = DatasetRepo::create(&pool, &input).await.unwrap().dataset;
    let image = ImageRepo::create(&pool, &new_image(dataset.id, "IMG_1.jpg"))
        .await
        .unwrap();
    let annotation = CrudRepo::create::<Annotation, _>(
        &pool,
        &CreateAnnotation {
            uuid: None,
            image_id: image.id,
            annotation_set_id: None,
            annotation_platform: None,
            shape: "single-pixel".to_string(),
            coordinates: vec![vec![1.0, 2.0]],
        },
    )
    .await
    .unwrap();

    let deleted = CrudRepo::delete::<Dataset>(&pool, ResourceKey::Id(dataset.id))
        .await
        .unwrap();
    assert_eq!(deleted.id, dataset.id);

    assert!(CrudRepo::find::<Image, _>(&pool, ResourceKey::Id(image.id))
        .await
        .unwrap()
        .is_none());
    assert!(CrudRepo::find::<Annotation, _>(&pool, ResourceKey::Id(annotation.id))
        .await
        .unwrap()
        .is_none());
    // Independent lookups survive.
    assert!(CrudRepo::find::<ImageLicense, _>(&pool, ResourceKey::Id(license.id))
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_lookup_sets_reference_null(pool: PgPool) {
    let license = CrudRepo::create::<ImageLicense, _>(
        &pool,
        &CreateNamedLookup {
            name: "CC0".to_string(),
            uri: None,
        },
    )
    .await
    .unwrap();
    let mut input = new_dataset("Detached");
    input.refs.license_id = Some(license.id);
    let dataset = DatasetRepo::create(&pool, &input).await.unwrap().dataset;

    CrudRepo::delete::<ImageLicense>(&pool, ResourceKey::Id(license.id))
        .await
        .unwrap();
    let reloaded = CrudRepo::show::<Dataset>(&pool, ResourceKey::Id(dataset.id))
        .await
        .unwrap();
    assert_eq!(reloaded.refs.license_id, None);
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_merged_image_falls_back_to_dataset_hash(pool: PgPool) {
    let mut input = new_dataset("Merged");
    input.common.sha256_hash = Some("dataset-hash".to_string());
    let dataset = DatasetRepo::create(&pool, &input).await.unwrap().dataset;
    let image = ImageRepo::create(&pool, &new_image(dataset.id, "IMG_2.jpg"))
        .await
        .unwrap();

    let merged = ImageRepo::merged(&pool, ResourceKey::Id(image.id)).await.unwrap();
    assert_eq!(merged.common.sha256_hash.as_deref(), Some("dataset-hash"));

    let update = UpdateImage {
        common: CommonFields {
            sha256_hash: Some("image-hash".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    CrudRepo::update::<Image, _>(&pool, ResourceKey::Id(image.id), &update)
        .await
        .unwrap();
    let merged = ImageRepo::merged(&pool, ResourceKey::Id(image.id)).await.unwrap();
    assert_eq!(merged.common.sha256_hash.as_deref(), Some("image-hash"));

    // The fallback is never written back.
    let stored = CrudRepo::show::<Dataset>(&pool, ResourceKey::Id(dataset.id))
        .await
        .unwrap();
    assert_eq!(stored.common.sha256_hash.as_deref(), Some("dataset-hash"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_image_with_missing_dataset_is_not_found(pool: PgPool) {
    let result = ImageRepo::create(&pool, &new_image(424_242, "orphan.jpg")).await;
    assert_matches!(
        result,
        Err(DbError::Core(CoreError::NotFound { entity: "Dataset", .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_creator_twice_is_rejected(pool: PgPool) {
    let dataset = DatasetRepo::create(&pool, &new_dataset("Creators")).await.unwrap().dataset;
    let key = ResourceKey::Id(dataset.id);

    let detail = DatasetRepo::attach_creator(&pool, key, AttachSource::Inline(json!("J. Diver")))
        .await
        .unwrap();
    assert_eq!(detail.creators.len(), 1);
    let creator_id = detail.creators[0].id;

    let again =
        DatasetRepo::attach_creator(&pool, key, AttachSource::Existing(ResourceKey::Id(creator_id)))
            .await;
    assert_matches!(again, Err(DbError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_existing_and_inline_images(pool: PgPool) {
    let first = DatasetRepo::create(&pool, &new_dataset("First")).await.unwrap().dataset;
    let second = DatasetRepo::create(&pool, &new_dataset("Second")).await.unwrap().dataset;
    let image = ImageRepo::create(&pool, &new_image(first.id, "moved.jpg"))
        .await
        .unwrap();

    let moved = DatasetRepo::attach_image(
        &pool,
        ResourceKey::Id(second.id),
        AttachSource::Existing(ResourceKey::Uuid(image.uuid)),
    )
    .await
    .unwrap();
    assert_eq!(moved.dataset_id, Some(second.id));

    let inline = CreateImage {
        name: "inline.jpg".to_string(),
        ..Default::default()
    };
    let created =
        DatasetRepo::attach_image(&pool, ResourceKey::Id(second.id), AttachSource::Inline(inline))
            .await
            .unwrap();
    assert_eq!(created.dataset_id, Some(second.id));

    let again = DatasetRepo::attach_image(
        &pool,
        ResourceKey::Id(second.id),
        AttachSource::Existing(ResourceKey::Id(image.id)),
    )
    .await;
    assert_matches!(
        again,
        Err(DbError::Core(CoreError::Validation(msg))) if msg == "Image already exists in the dataset."
    );

    let detail = DatasetRepo::show_detail(&pool, ResourceKey::Id(second.id), true)
        .await
        .unwrap();
    assert_eq!(detail.images.unwrap().len(), 2);
}
