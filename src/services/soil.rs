// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Soil service: provider registry, provider selection and the
//! cache-aside summary path.

use crate::error::{AppError, Result};
use crate::models::soil::{
    GeoJsonPolygon, MapUnitDetails, SoilPolygonRequest, SoilSummary, WmsConfig,
};
use crate::services::soil_cache::SoilCache;
use crate::services::soil_provider::SoilProvider;
use crate::services::wkt::polygon_bounds;
use geojson::FeatureCollection;
use std::sync::Arc;

/// Orchestrates soil providers and the summary cache.
#[derive(Clone)]
pub struct SoilService {
    // Registration order is the scan order for provider selection
    providers: Vec<Arc<dyn SoilProvider>>,
    cache: SoilCache,
}

impl SoilService {
    pub fn new(cache: SoilCache) -> Self {
        Self {
            providers: Vec::new(),
            cache,
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, provider: Arc<dyn SoilProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Add a provider. A provider with the same name is replaced in place.
    pub fn register(&mut self, provider: Arc<dyn SoilProvider>) {
        match self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn providers(&self) -> &[Arc<dyn SoilProvider>] {
        &self.providers
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn SoilProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Pick the provider for a polygon.
    ///
    /// The preferred provider wins if it exists and covers the polygon;
    /// otherwise the first registered provider that covers it.
    pub fn select_provider(
        &self,
        polygon: &GeoJsonPolygon,
        preferred: Option<&str>,
    ) -> Result<&Arc<dyn SoilProvider>> {
        let Some(bounds) = polygon_bounds(polygon) else {
            return Err(AppError::ProviderNotFound(
                "Polygon has no usable extent".to_string(),
            ));
        };

        if let Some(name) = preferred {
            match self.provider(name) {
                Some(p) if p.supports_bounds(&bounds) => return Ok(p),
                Some(_) => {
                    tracing::debug!(provider = name, "Preferred provider does not cover polygon")
                }
                None => tracing::debug!(provider = name, "Preferred provider is not registered"),
            }
        }

        self.providers
            .iter()
            .find(|p| p.supports_bounds(&bounds))
            .ok_or_else(|| {
                AppError::ProviderNotFound(format!(
                    "No soil provider covers [{:.4}, {:.4}, {:.4}, {:.4}]",
                    bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat
                ))
            })
    }

    /// Summary for a polygon, served from cache when fresh.
    pub async fn get_soil_summary(&self, request: &SoilPolygonRequest) -> Result<SoilSummary> {
        request.polygon.validate().map_err(AppError::BadRequest)?;
        let provider = self.select_provider(&request.polygon, request.provider.as_deref())?;
        let key = SoilCache::cache_key(provider.name(), &request.polygon);

        match self.cache.get(&key).await {
            Ok(Some(summary)) => {
                tracing::debug!(provider = provider.name(), key = %key, "Soil cache hit");
                return Ok(summary);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Soil cache read failed, treating as miss"),
        }

        let summary = provider.get_soil_summary(&request.polygon).await?;

        if let Err(e) = self
            .cache
            .set(
                &key,
                provider.name(),
                &request.polygon,
                &summary,
                self.cache.ttl(),
            )
            .await
        {
            tracing::warn!(error = %e, "Soil cache write failed");
        }

        Ok(summary)
    }

    /// Details for one map unit. Without a named provider the first
    /// registered provider is used.
    pub async fn get_map_unit_details(
        &self,
        mukey: &str,
        provider: Option<&str>,
    ) -> Result<MapUnitDetails> {
        self.named_or_default(provider)?
            .get_map_unit_details(mukey)
            .await
    }

    /// Map unit polygons inside the request polygon.
    pub async fn get_soil_geometries(
        &self,
        request: &SoilPolygonRequest,
    ) -> Result<FeatureCollection> {
        request.polygon.validate().map_err(AppError::BadRequest)?;
        let provider = self.select_provider(&request.polygon, request.provider.as_deref())?;
        Ok(provider.get_soil_geometries(&request.polygon).await)
    }

    pub fn get_wms_config(&self, provider: Option<&str>) -> Result<WmsConfig> {
        Ok(self.named_or_default(provider)?.wms_config())
    }

    /// Drop the cached summary for a polygon so the next request recomputes it.
    pub async fn clear_cache(&self, request: &SoilPolygonRequest) -> Result<()> {
        request.polygon.validate().map_err(AppError::BadRequest)?;
        let provider = self.select_provider(&request.polygon, request.provider.as_deref())?;
        let key = SoilCache::cache_key(provider.name(), &request.polygon);

        self.cache.invalidate(&key).await?;
        tracing::info!(provider = provider.name(), key = %key, "Soil cache entry cleared");
        Ok(())
    }

    fn named_or_default(&self, name: Option<&str>) -> Result<&Arc<dyn SoilProvider>> {
        match name {
            Some(name) => self
                .provider(name)
                .ok_or_else(|| AppError::ProviderNotFound(name.to_string())),
            None => self
                .providers
                .first()
                .ok_or_else(|| AppError::ProviderNotFound("No providers registered".to_string())),
        }
    }
}
