use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::{Pass, PassFilter};
use crate::services::{OverheadStatus, PassReport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::resolve_observer;
use crate::web::state::AppState;

const MAX_DAYS: f64 = 30.0;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PassesQuery {
    pub norad_id: u32,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// RFC3339, defaults to now.
    pub start: Option<DateTime<Utc>>,
    pub days: Option<f64>,
    pub min_elevation: Option<f64>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SatelliteAtQuery {
    pub norad_id: u32,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub min_elevation: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NextPassResponse {
    pub norad_id: u32,
    pub pass: Option<Pass>,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(
        ("norad_id" = u32, Query, description = "Catalog number"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees), defaults to the station"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees), defaults to the station"),
        ("start" = Option<String>, Query, description = "Window start (RFC3339), defaults to now"),
        ("days" = Option<f64>, Query, description = "Window length in days"),
        ("min_elevation" = Option<f64>, Query, description = "Minimum peak elevation (degrees)"),
        ("max_results" = Option<usize>, Query, description = "Keep only the first N passes")
    ),
    responses(
        (status = 200, description = "Predicted passes", body = PassReport),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "No orbital elements available", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassReport>> {
    let observer = resolve_observer(&state, query.lat, query.lon)?;
    let prediction = &state.services.config.prediction;

    let days = query.days.unwrap_or(prediction.default_days);
    if !(days > 0.0 && days <= MAX_DAYS) {
        return Err(ApiError::Validation(format!(
            "days must be in (0, {}], got {}",
            MAX_DAYS, days
        )));
    }

    let filter = PassFilter {
        min_elevation_deg: Some(query.min_elevation.unwrap_or(prediction.min_elevation)),
        max_results: query.max_results,
    };
    let start = query.start.unwrap_or_else(Utc::now);

    let report = state
        .services
        .passes(query.norad_id, observer, start, days, filter)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/passes/next",
    tag = "passes",
    params(
        ("norad_id" = u32, Query, description = "Catalog number"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("min_elevation" = Option<f64>, Query, description = "Minimum peak elevation (degrees)")
    ),
    responses(
        (status = 200, description = "Next pass within two days, if any", body = NextPassResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "No orbital elements available", body = ErrorResponse)
    )
)]
pub async fn next_pass(
    State(state): State<AppState>,
    Query(query): Query<SatelliteAtQuery>,
) -> ApiResult<Json<NextPassResponse>> {
    let observer = resolve_observer(&state, query.lat, query.lon)?;
    let pass = state
        .services
        .next_pass(query.norad_id, observer, Utc::now(), query.min_elevation)
        .await?;
    Ok(Json(NextPassResponse {
        norad_id: query.norad_id,
        pass,
    }))
}

#[utoipa::path(
    get,
    path = "/api/overhead",
    tag = "passes",
    params(
        ("norad_id" = u32, Query, description = "Catalog number"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)")
    ),
    responses(
        (status = 200, description = "Current look angles and time to the next pass", body = OverheadStatus),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "No orbital elements available", body = ErrorResponse)
    )
)]
pub async fn overhead(
    State(state): State<AppState>,
    Query(query): Query<SatelliteAtQuery>,
) -> ApiResult<Json<OverheadStatus>> {
    let observer = resolve_observer(&state, query.lat, query.lon)?;
    let status = state
        .services
        .overhead(query.norad_id, observer, Utc::now())
        .await?;
    Ok(Json(status))
}
