// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Soil data routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::soil::{
    MapUnitDetails, ProviderQuery, SoilPolygonRequest, SoilSummary, WmsConfig,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use geojson::FeatureCollection;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Provider metadata routes, no authentication.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/soil/providers", get(list_providers))
        .route("/soil/wms-config", get(get_wms_config))
}

/// Soil query routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/soil/summary", post(get_summary))
        .route("/soil/map-unit/{mukey}", get(get_map_unit))
        .route("/soil/geometries", post(get_geometries))
        .route("/soil/clear-cache", post(clear_cache))
}

/// Malformed JSON is a 400 with our error body, not axum's plain-text 422.
fn polygon_body(
    payload: std::result::Result<Json<SoilPolygonRequest>, JsonRejection>,
) -> Result<SoilPolygonRequest> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

// ─── Provider Metadata ───────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProviderInfo {
    pub name: String,
    pub wms: WmsConfig,
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderInfo>> {
    let providers = state
        .soil_service
        .providers()
        .iter()
        .map(|p| ProviderInfo {
            name: p.name().to_string(),
            wms: p.wms_config(),
        })
        .collect();
    Json(providers)
}

async fn get_wms_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<WmsConfig>> {
    Ok(Json(
        state.soil_service.get_wms_config(query.provider.as_deref())?,
    ))
}

// ─── Soil Queries ────────────────────────────────────────────

async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<SoilPolygonRequest>, JsonRejection>,
) -> Result<Json<SoilSummary>> {
    let request = polygon_body(payload)?;
    tracing::debug!(user_id = %user.user_id, "Soil summary requested");

    Ok(Json(state.soil_service.get_soil_summary(&request).await?))
}

async fn get_map_unit(
    State(state): State<Arc<AppState>>,
    Path(mukey): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<MapUnitDetails>> {
    Ok(Json(
        state
            .soil_service
            .get_map_unit_details(&mukey, query.provider.as_deref())
            .await?,
    ))
}

async fn get_geometries(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SoilPolygonRequest>, JsonRejection>,
) -> Result<Json<FeatureCollection>> {
    let request = polygon_body(payload)?;
    Ok(Json(state.soil_service.get_soil_geometries(&request).await?))
}

/// Response for a manual cache clear.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}

async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<SoilPolygonRequest>, JsonRejection>,
) -> Result<Json<ClearCacheResponse>> {
    let request = polygon_body(payload)?;
    state.soil_service.clear_cache(&request).await?;

    tracing::info!(user_id = %user.user_id, "Soil cache cleared by user");

    Ok(Json(ClearCacheResponse {
        success: true,
        message: "Soil cache cleared for polygon".to_string(),
    }))
}
