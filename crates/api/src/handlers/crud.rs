//! Generic handlers shared by every table served through [`crate::routes::crud`].
//!
//! Each handler is generic over the row type `R` and, for writes, the DTO it
//! decodes. The router factory instantiates them per resource.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ifdo_core::query::IndexQuery;
use ifdo_db::repositories::CrudRepo;
use ifdo_db::resource::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::{key, AppJson};
use crate::state::AppState;

/// GET /v1/.../{table}
///
/// Query parameters are filters (`col`, `col__ne`, `col__like`, `col__in`)
/// plus `order_by`, `desc` and `limit`.
pub async fn index<R: Resource + Sync>(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<Vec<R>>> {
    let query = IndexQuery::from_params(&params, R::COLUMNS)?;
    let rows = CrudRepo::index::<R>(&state.pool, &query).await?;
    Ok(Json(rows))
}

/// GET /v1/.../{table}/{id}
pub async fn show<R: Resource + Sync>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<R>> {
    let row = CrudRepo::show::<R>(&state.pool, key(&id)?).await?;
    Ok(Json(row))
}

/// POST /v1/.../{table}
pub async fn create<R, C>(
    State(state): State<AppState>,
    AppJson(input): AppJson<C>,
) -> AppResult<(StatusCode, Json<R>)>
where
    R: Resource + Sync,
    C: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    let row = CrudRepo::create::<R, C>(&state.pool, &input).await?;
    tracing::info!(table = R::TABLE, id = row.id(), "Row created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /v1/.../{table}/{id}
///
/// Only the fields present in the body are written.
pub async fn update<R, U>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<U>,
) -> AppResult<Json<R>>
where
    R: Resource + Sync,
    U: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    let row = CrudRepo::update::<R, U>(&state.pool, key(&id)?, &input).await?;
    tracing::info!(table = R::TABLE, id = row.id(), "Row updated");
    Ok(Json(row))
}

/// DELETE /v1/.../{table}/{id}
///
/// Returns the deleted row.
pub async fn delete<R: Resource + Sync>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<R>> {
    let row = CrudRepo::delete::<R>(&state.pool, key(&id)?).await?;
    Ok(Json(row))
}
