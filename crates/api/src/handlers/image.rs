//! Handlers for images beyond the generic CRUD operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ifdo_core::relation::{resolve_attach, AttachSource};
use ifdo_db::models::annotation::Annotation;
use ifdo_db::models::fields::ImageCreator;
use ifdo_db::models::image::{CreateImage, Image};
use ifdo_db::repositories::ImageRepo;

use super::dataset::CreatorAttachBody;
use crate::error::AppResult;
use crate::extract::{key, AppJson, BodyKey};
use crate::state::AppState;

/// POST /v1/images
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateImage>,
) -> AppResult<(StatusCode, Json<Image>)> {
    let image = ImageRepo::create(&state.pool, &input).await?;
    tracing::info!(image_id = image.id, dataset_id = ?image.dataset_id, "Image created");
    Ok((StatusCode::CREATED, Json(image)))
}

/// GET /v1/images/{id}/merged
///
/// The image with unset fields inherited from its dataset.
pub async fn merged(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Image>> {
    Ok(Json(ImageRepo::merged(&state.pool, key(&id)?).await?))
}

/// GET /v1/images/{id}/annotations
pub async fn annotations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Annotation>>> {
    Ok(Json(ImageRepo::annotations(&state.pool, key(&id)?).await?))
}

/// GET /v1/images/{id}/creators
pub async fn creators(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ImageCreator>>> {
    Ok(Json(ImageRepo::creators(&state.pool, key(&id)?).await?))
}

/// POST /v1/images/{id}/creators/{creator_id}
pub async fn attach_creator_by_id(
    State(state): State<AppState>,
    Path((id, creator_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<ImageCreator>>> {
    let source = AttachSource::Existing(key(&creator_id)?);
    let creators = ImageRepo::attach_creator(&state.pool, key(&id)?, source).await?;
    Ok(Json(creators))
}

/// POST /v1/images/{id}/creators
pub async fn attach_creator(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<CreatorAttachBody>,
) -> AppResult<Json<Vec<ImageCreator>>> {
    let raw = body.creator_id.as_ref().map(BodyKey::to_raw);
    let source = resolve_attach("creator", raw.as_deref(), body.creator)?;
    let creators = ImageRepo::attach_creator(&state.pool, key(&id)?, source).await?;
    Ok(Json(creators))
}
