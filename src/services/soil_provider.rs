// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Soil data providers.
//!
//! A provider covers a fixed geographic envelope and answers summary,
//! detail and geometry queries for polygons inside it. SSURGO via Soil
//! Data Access is the only provider today.

use crate::error::{AppError, Result};
use crate::models::soil::{
    BoundingBox, GeoJsonPolygon, MapUnitDetails, SoilComponent, SoilHorizon, SoilSummary,
    WmsConfig,
};
use crate::services::sda::{self, SdaClient};
use crate::services::sda_parse::{
    parse_components, parse_geometries, parse_horizons, parse_map_units, MapUnitGeometry,
};
use crate::services::soil_analytics::{build_summary, empty_summary};
use crate::services::wkt::{polygon_bounds, polygon_to_wkt};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use std::collections::BTreeMap;

/// A source of soil survey data.
#[async_trait]
pub trait SoilProvider: Send + Sync {
    /// Registry name, also part of the cache key.
    fn name(&self) -> &str;

    /// Whether the provider's coverage envelope overlaps `bounds`.
    fn supports_bounds(&self, bounds: &BoundingBox) -> bool;

    /// Static map overlay descriptor.
    fn wms_config(&self) -> WmsConfig;

    /// Summarize the soils inside a polygon. Upstream failures degrade to an
    /// emptier summary rather than an error.
    async fn get_soil_summary(&self, polygon: &GeoJsonPolygon) -> Result<SoilSummary>;

    /// A map unit with its components and their horizons.
    async fn get_map_unit_details(&self, mukey: &str) -> Result<MapUnitDetails>;

    /// Map unit polygons clipped to `polygon`. Empty on any failure.
    async fn get_soil_geometries(&self, polygon: &GeoJsonPolygon) -> FeatureCollection;
}

/// SSURGO covers the US, including Alaska, Hawaii and Puerto Rico.
pub const SSURGO_COVERAGE: BoundingBox = BoundingBox {
    min_lng: -180.0,
    min_lat: 17.0,
    max_lng: -64.0,
    max_lat: 72.0,
};

// SDA rejects very large request bodies
const MAX_KEYS_PER_QUERY: usize = 200;
const MAX_CONCURRENT_QUERIES: usize = 4;

const SSURGO_WMS_URL: &str = "https://SDMDataAccess.sc.egov.usda.gov/Spatial/SDM.wms";

/// USDA-NRCS SSURGO via Soil Data Access.
#[derive(Clone)]
pub struct SsurgoProvider {
    client: SdaClient,
}

impl SsurgoProvider {
    pub const NAME: &'static str = "ssurgo";

    pub fn new(client: SdaClient) -> Self {
        Self { client }
    }

    /// Components for many map units, queried in batches. A failed batch
    /// is logged and contributes nothing.
    fn fetch_components<'a>(
        &'a self,
        mukeys: &'a [String],
    ) -> futures_util::future::BoxFuture<'a, Vec<SoilComponent>> {
        futures_util::FutureExt::boxed(stream::iter(mukeys.chunks(MAX_KEYS_PER_QUERY))
            .map(move |batch| async move {
                match self
                    .client
                    .query(&sda::components_for_map_units(batch))
                    .await
                {
                    Ok(result) => parse_components(&result),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            map_units = batch.len(),
                            "Failed to fetch components, summarizing map units only"
                        );
                        Vec::new()
                    }
                }
            })
            .buffered(MAX_CONCURRENT_QUERIES)
            .concat())
    }
}

#[async_trait]
impl SoilProvider for SsurgoProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supports_bounds(&self, bounds: &BoundingBox) -> bool {
        SSURGO_COVERAGE.intersects(bounds)
    }

    fn wms_config(&self) -> WmsConfig {
        WmsConfig {
            url: SSURGO_WMS_URL.to_string(),
            layers: "mapunitpoly".to_string(),
            format: "image/png".to_string(),
            transparent: true,
            version: "1.1.1".to_string(),
            attribution: "Soil Survey Staff, NRCS, USDA. Soil Survey Geographic (SSURGO) Database"
                .to_string(),
            min_zoom: 12,
        }
    }

    async fn get_soil_summary(&self, polygon: &GeoJsonPolygon) -> Result<SoilSummary> {
        let bounds = polygon_bounds(polygon).unwrap_or_else(BoundingBox::empty);
        let wkt = polygon_to_wkt(polygon);

        let map_units = match self.client.query(&sda::map_units_in_polygon(&wkt)).await {
            Ok(result) => parse_map_units(&result),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch map units, returning empty summary");
                Vec::new()
            }
        };

        if map_units.is_empty() {
            tracing::info!(provider = Self::NAME, "No map units intersect polygon");
            return Ok(empty_summary(Self::NAME, bounds));
        }

        let mukeys: Vec<String> = map_units.iter().map(|u| u.mukey.clone()).collect();
        let components = self.fetch_components(&mukeys).await;

        tracing::info!(
            provider = Self::NAME,
            map_units = map_units.len(),
            components = components.len(),
            "Soil summary computed"
        );

        Ok(build_summary(Self::NAME, bounds, map_units, &components))
    }

    async fn get_map_unit_details(&self, mukey: &str) -> Result<MapUnitDetails> {
        let mukey = sda::validate_mukey(mukey)?;

        let result = self.client.query(&sda::map_unit_by_key(mukey)).await?;
        let map_unit = parse_map_units(&result)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::MapUnitNotFound(mukey.to_string()))?;

        let result = self
            .client
            .query(&sda::components_for_map_units(&[mukey.to_string()]))
            .await?;
        let components = parse_components(&result);

        let mut horizons: BTreeMap<String, Vec<SoilHorizon>> = components
            .iter()
            .map(|c| (c.cokey.clone(), Vec::new()))
            .collect();

        if !components.is_empty() {
            let cokeys: Vec<String> = horizons.keys().cloned().collect();
            let result = self
                .client
                .query(&sda::horizons_for_components(&cokeys))
                .await?;
            for horizon in parse_horizons(&result) {
                horizons
                    .entry(horizon.cokey.clone())
                    .or_default()
                    .push(horizon);
            }
            for layers in horizons.values_mut() {
                layers.sort_by(|a, b| {
                    a.top_depth
                        .unwrap_or(f64::MAX)
                        .total_cmp(&b.top_depth.unwrap_or(f64::MAX))
                });
            }
        }

        Ok(MapUnitDetails {
            map_unit,
            components,
            horizons,
        })
    }

    async fn get_soil_geometries(&self, polygon: &GeoJsonPolygon) -> FeatureCollection {
        let wkt = polygon_to_wkt(polygon);
        let geometries = match self.client.query(&sda::geometries_in_polygon(&wkt)).await {
            Ok(result) => parse_geometries(&result),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch soil geometries");
                Vec::new()
            }
        };

        feature_collection(geometries)
    }
}

/// Wrap clipped map unit polygons as GeoJSON features.
pub fn feature_collection(geometries: Vec<MapUnitGeometry>) -> FeatureCollection {
    let features = geometries
        .into_iter()
        .map(|g| {
            let mut properties = JsonObject::new();
            properties.insert("mukey".to_string(), g.mukey.into());
            properties.insert("musym".to_string(), g.musym.into());
            properties.insert("muname".to_string(), g.muname.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Polygon(
                    g.polygon.coordinates,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
