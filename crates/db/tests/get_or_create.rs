//! Integration tests for get-or-create deduplication of lookup rows.

use serde_json::{json, Map, Value};
use sqlx::PgPool;
use ifdo_core::ifdo::mapping::RelationKind;
use ifdo_db::models::fields::{ImageCameraPose, ImagePlatform, ImageSensor};
use ifdo_db::repositories::{CrudRepo, RelationRepo};

fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_same_name_yields_one_row(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let first = CrudRepo::get_or_create_in::<ImagePlatform>(
        &mut conn,
        Some("name"),
        data(json!({ "name": "ROV Isis", "uri": "https://example.org/isis" })),
    )
    .await
    .unwrap();
    let second = CrudRepo::get_or_create_in::<ImagePlatform>(
        &mut conn,
        Some("name"),
        data(json!({ "name": "ROV Isis" })),
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    // The first writer's attributes are kept.
    assert_eq!(second.uri.as_deref(), Some("https://example.org/isis"));
    assert_eq!(count(&pool, "image_platforms").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_every_named_lookup_deduplicates(pool: PgPool) {
    let kinds = [
        RelationKind::Context,
        RelationKind::Project,
        RelationKind::Event,
        RelationKind::Platform,
        RelationKind::Sensor,
        RelationKind::Pi,
        RelationKind::License,
        RelationKind::Creator,
    ];
    let mut tx = pool.begin().await.unwrap();
    for kind in kinds {
        let a = RelationRepo::resolve_in(&mut tx, kind, data(json!({ "name": "shared" })))
            .await
            .unwrap();
        let b = RelationRepo::resolve_in(&mut tx, kind, data(json!({ "name": "shared" })))
            .await
            .unwrap();
        assert_eq!(a, b, "{} should deduplicate by name", kind.table());
    }
    tx.commit().await.unwrap();

    for kind in kinds {
        assert_eq!(count(&pool, kind.table()).await, 1, "{}", kind.table());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_parameter_sets_are_not_deduplicated(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let pose = json!({ "utm_zone": "30U" });
    let a = CrudRepo::get_or_create_in::<ImageCameraPose>(&mut conn, None, data(pose.clone()))
        .await
        .unwrap();
    let b = CrudRepo::get_or_create_in::<ImageCameraPose>(&mut conn, None, data(pose))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_get_or_create_converges(pool: PgPool) {
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let sensor = CrudRepo::get_or_create_in::<ImageSensor>(
                &mut tx,
                Some("name"),
                data(json!({ "name": "Canon EOS" })),
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
            sensor.id
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(count(&pool, "image_sensors").await, 1);
}
