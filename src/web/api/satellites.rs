use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::{satellite_by_id, satellite_by_norad_id, search_satellites, Satellite};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SatelliteListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteListResponse {
    pub satellites: Vec<Satellite>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    tag = "satellites",
    params(
        ("search" = Option<String>, Query, description = "Match on name, id or catalog number")
    ),
    responses(
        (status = 200, description = "Catalog, featured satellites first", body = SatelliteListResponse)
    )
)]
pub async fn list_satellites(
    State(state): State<AppState>,
    Query(query): Query<SatelliteListQuery>,
) -> ApiResult<Json<SatelliteListResponse>> {
    let build = state.catalog().await;
    let satellites: Vec<Satellite> = match query.search.as_deref() {
        Some(q) => search_satellites(&build.satellites, q)
            .into_iter()
            .cloned()
            .collect(),
        None => build.satellites,
    };

    Ok(Json(SatelliteListResponse {
        count: satellites.len(),
        satellites,
        error: build.error,
    }))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{id}",
    tag = "satellites",
    params(
        ("id" = String, Path, description = "Slug (e.g. iss) or catalog number")
    ),
    responses(
        (status = 200, description = "Catalog entry", body = Satellite),
        (status = 404, description = "Unknown satellite", body = ErrorResponse)
    )
)]
pub async fn get_satellite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Satellite>> {
    let build = state.catalog().await;
    let found = match id.parse::<u32>() {
        Ok(norad_id) => satellite_by_norad_id(&build.satellites, norad_id),
        Err(_) => satellite_by_id(&build.satellites, &id),
    };
    found
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound("satellite_not_found"))
}
