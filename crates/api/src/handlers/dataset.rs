//! Handlers for datasets beyond the generic update and delete.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ifdo_core::query::{parse_bool, IndexQuery};
use ifdo_core::relation::{resolve_attach, AttachSource};
use ifdo_db::models::annotation::{Annotation, Label};
use ifdo_db::models::dataset::{CreateDataset, Dataset, DatasetDetail};
use ifdo_db::models::image::{CreateImage, Image};
use ifdo_db::repositories::{CrudRepo, DatasetRepo};
use ifdo_db::resource::Resource;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::extract::{key, AppJson, BodyKey};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IncludeImagesParams {
    #[serde(default)]
    pub include_images: bool,
}

/// Body of `POST /v1/datasets/{id}/creators`: exactly one field must be set.
#[derive(Debug, Deserialize)]
pub struct CreatorAttachBody {
    pub creator_id: Option<BodyKey>,
    pub creator: Option<Value>,
}

/// Body of `POST /v1/datasets/{id}/images`: exactly one field must be set.
#[derive(Debug, Deserialize)]
pub struct ImageAttachBody {
    pub image_id: Option<BodyKey>,
    pub image: Option<CreateImage>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /v1/datasets
///
/// Generic filters and ordering, plus `include_images=true` to embed each
/// dataset's images.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Response> {
    let include_images = params
        .get("include_images")
        .map(|raw| parse_bool("include_images", raw))
        .transpose()?
        .unwrap_or(false);
    let query = IndexQuery::from_params(&params, Dataset::COLUMNS)?;

    if include_images {
        let datasets = DatasetRepo::index_with_images(&state.pool, &query).await?;
        Ok(Json(datasets).into_response())
    } else {
        let datasets = CrudRepo::index::<Dataset>(&state.pool, &query).await?;
        Ok(Json(datasets).into_response())
    }
}

/// GET /v1/datasets/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<IncludeImagesParams>,
) -> AppResult<Json<DatasetDetail>> {
    let detail = DatasetRepo::show_detail(&state.pool, key(&id)?, params.include_images).await?;
    Ok(Json(detail))
}

/// GET /v1/datasets/{id}/annotations
pub async fn annotations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Annotation>>> {
    Ok(Json(DatasetRepo::annotations(&state.pool, key(&id)?).await?))
}

/// GET /v1/datasets/{id}/labels
///
/// Distinct labels used by any annotation on the dataset's images.
pub async fn labels(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Label>>> {
    Ok(Json(DatasetRepo::labels(&state.pool, key(&id)?).await?))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /v1/datasets
///
/// Inline lookups are get-or-created; creators and related materials are
/// linked in the same transaction.
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateDataset>,
) -> AppResult<(StatusCode, Json<DatasetDetail>)> {
    let detail = DatasetRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// POST /v1/datasets/{id}/creators/{creator_id}
pub async fn attach_creator_by_id(
    State(state): State<AppState>,
    Path((id, creator_id)): Path<(String, String)>,
) -> AppResult<Json<DatasetDetail>> {
    let source = AttachSource::Existing(key(&creator_id)?);
    let detail = DatasetRepo::attach_creator(&state.pool, key(&id)?, source).await?;
    Ok(Json(detail))
}

/// POST /v1/datasets/{id}/creators
pub async fn attach_creator(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<CreatorAttachBody>,
) -> AppResult<Json<DatasetDetail>> {
    let raw = body.creator_id.as_ref().map(BodyKey::to_raw);
    let source = resolve_attach("creator", raw.as_deref(), body.creator)?;
    let detail = DatasetRepo::attach_creator(&state.pool, key(&id)?, source).await?;
    Ok(Json(detail))
}

/// POST /v1/datasets/{id}/images/{image_id}
///
/// Moves an existing image into the dataset.
pub async fn attach_image_by_id(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> AppResult<Json<Image>> {
    let source = AttachSource::Existing(key(&image_id)?);
    let image = DatasetRepo::attach_image(&state.pool, key(&id)?, source).await?;
    Ok(Json(image))
}

/// POST /v1/datasets/{id}/images
pub async fn attach_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ImageAttachBody>,
) -> AppResult<Json<Image>> {
    let raw = body.image_id.as_ref().map(BodyKey::to_raw);
    let source = resolve_attach("image", raw.as_deref(), body.image)?;
    let image = DatasetRepo::attach_image(&state.pool, key(&id)?, source).await?;
    Ok(Json(image))
}
