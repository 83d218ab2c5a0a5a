//! Tests for `AppError` to HTTP response mapping.
//!
//! The first group calls `IntoResponse` directly; the last tests go through
//! the router to check the `path` field added by the error middleware.

mod common;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{body_json, get, post_raw};
use http_body_util::BodyExt;
use ifdo_api::error::AppError;
use ifdo_core::error::CoreError;
use ifdo_core::types::ResourceKey;
use ifdo_db::DbError;
use sqlx::PgPool;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Dataset",
        key: ResourceKey::Id(42),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["type"], "not_found");
    assert_eq!(json["error"], "Dataset with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400_value_error() {
    let err = AppError::Core(CoreError::Validation("Invalid order_by column: nope".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["type"], "value_error");
    assert_eq!(json["error"], "Invalid order_by column: nope");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate name".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "duplicate name");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Multipart field 'input_file' is required".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Multipart field 'input_file' is required");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    for err in [
        AppError::InternalError("secret connection string".into()),
        AppError::Core(CoreError::Internal("secret serializer state".into())),
        AppError::Database(sqlx::Error::PoolTimedOut),
    ] {
        let (status, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
        assert!(!json.to_string().contains("secret"));
    }
}

#[tokio::test]
async fn row_not_found_maps_to_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn db_error_conversion_keeps_domain_variant() {
    let err: AppError = DbError::validation("shape is required").into();
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "shape is required");
}

// ---------------------------------------------------------------------------
// Through the router
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn error_body_carries_request_path(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/v1/datasets/999999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["path"], "/v1/datasets/999999");
    assert_eq!(json["type"], "not_found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_json_body_is_a_json_error(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_raw(
        app,
        "/v1/fields/image_platforms",
        "application/json",
        b"{\"name\": ".to_vec(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["path"], "/v1/fields/image_platforms");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_identifier_is_a_value_error(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/v1/images/not-an-id").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["type"], "value_error");
}
