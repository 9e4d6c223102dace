// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Content-addressed, TTL-expiring cache of soil summaries.
//!
//! Entries are keyed by a SHA-256 of the provider name and the polygon's
//! coordinates. Expiry is checked on read; expired entries stay in storage
//! until [`SoilCache::purge_expired`] sweeps them.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::soil::{GeoJsonPolygon, SoilCacheEntry, SoilSummary};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Storage behind the cache.
#[derive(Clone)]
pub enum CacheBackend {
    /// Process-local map, shared across requests.
    Memory(Arc<DashMap<String, SoilCacheEntry>>),
    /// Firestore collection, shared across instances.
    Firestore(FirestoreDb),
}

/// Soil summary cache.
#[derive(Clone)]
pub struct SoilCache {
    backend: CacheBackend,
    ttl: Duration,
}

impl SoilCache {
    pub fn new(backend: CacheBackend, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Cache backed by an in-process map.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(CacheBackend::Memory(Arc::new(DashMap::new())), ttl)
    }

    /// Default lifetime for new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Deterministic key for a provider and polygon.
    pub fn cache_key(provider: &str, polygon: &GeoJsonPolygon) -> String {
        // Vec<Vec<Vec<f64>>> always serializes
        let coordinates = serde_json::to_string(&polygon.coordinates).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(provider.as_bytes());
        hasher.update(b"\0");
        hasher.update(coordinates.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Cached summary if present and not yet expired.
    pub async fn get(&self, key: &str) -> Result<Option<SoilSummary>, AppError> {
        self.get_at(key, Utc::now()).await
    }

    /// Like [`get`](Self::get), evaluating expiry at `now`.
    pub async fn get_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SoilSummary>, AppError> {
        let entry = match &self.backend {
            CacheBackend::Memory(map) => map.get(key).map(|e| e.value().clone()),
            CacheBackend::Firestore(db) => db.get_soil_cache_entry(key).await?,
        };

        Ok(entry.filter(|e| e.is_fresh(now)).map(|e| e.summary))
    }

    /// Insert or overwrite the entry for `key`, expiring `ttl` from now.
    pub async fn set(
        &self,
        key: &str,
        provider: &str,
        polygon: &GeoJsonPolygon,
        summary: &SoilSummary,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let polygon_json = serde_json::to_string(polygon)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode polygon: {}", e)))?;

        let entry = SoilCacheEntry {
            cache_key: key.to_string(),
            provider: provider.to_string(),
            polygon_json,
            summary: summary.clone(),
            expires_at: format_utc_rfc3339(now + ttl),
            created_at: format_utc_rfc3339(now),
        };

        match &self.backend {
            CacheBackend::Memory(map) => {
                map.insert(key.to_string(), entry);
            }
            CacheBackend::Firestore(db) => db.set_soil_cache_entry(&entry).await?,
        }
        Ok(())
    }

    /// Remove the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) -> Result<(), AppError> {
        match &self.backend {
            CacheBackend::Memory(map) => {
                map.remove(key);
            }
            CacheBackend::Firestore(db) => db.delete_soil_cache_entry(key).await?,
        }
        Ok(())
    }

    /// Physically delete expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        let now = Utc::now();
        match &self.backend {
            CacheBackend::Memory(map) => {
                let before = map.len();
                map.retain(|_, entry| entry.is_fresh(now));
                Ok(before.saturating_sub(map.len()))
            }
            CacheBackend::Firestore(db) => {
                db.delete_expired_soil_cache_entries(&format_utc_rfc3339(now))
                    .await
            }
        }
    }
}
