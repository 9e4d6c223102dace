// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Soil survey records, derived analytics, and the cached summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A user-drawn GeoJSON polygon. Only the first ring is used for queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    pub kind: String,
    /// Rings of `[lng, lat]` positions, exterior ring first.
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl GeoJsonPolygon {
    pub const TYPE: &'static str = "Polygon";

    /// Build a polygon from a single exterior ring.
    pub fn from_ring(ring: Vec<[f64; 2]>) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            coordinates: vec![ring.into_iter().map(|p| p.to_vec()).collect()],
        }
    }

    /// The exterior ring, if any.
    pub fn exterior(&self) -> Option<&[Vec<f64>]> {
        self.coordinates.first().map(Vec::as_slice)
    }

    /// Check the shape is usable for a soil query.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind != Self::TYPE {
            return Err(format!("Expected geometry type Polygon, got {}", self.kind));
        }
        let ring = self
            .exterior()
            .ok_or_else(|| "Polygon has no rings".to_string())?;
        if ring.len() < 4 {
            return Err("Polygon ring needs at least 4 positions".to_string());
        }
        let valid_positions = ring
            .iter()
            .all(|p| p.len() >= 2 && p[0].is_finite() && p[1].is_finite());
        if !valid_positions {
            return Err("Polygon positions must be [lng, lat] numbers".to_string());
        }
        Ok(())
    }
}

/// Request body for the polygon-scoped soil endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilPolygonRequest {
    pub polygon: GeoJsonPolygon,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Optional `?provider=` query parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderQuery {
    pub provider: Option<String>,
}

/// Axis-aligned bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Rectangle overlap test (edges touching count as overlap).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// An all-zero box, used for empty summaries with no usable geometry.
    pub fn empty() -> Self {
        Self {
            min_lng: 0.0,
            min_lat: 0.0,
            max_lng: 0.0,
            max_lat: 0.0,
        }
    }
}

// ─── Survey Records ──────────────────────────────────────────────

/// A delineated map unit from the soil survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilMapUnit {
    pub mukey: String,
    pub musym: String,
    pub muname: String,
    pub mukind: Option<String>,
    /// Acres of this unit that fall inside the queried polygon
    pub acres: Option<f64>,
    pub farmland_class: Option<String>,
}

impl SoilMapUnit {
    /// Prime farmland or farmland of statewide importance.
    pub fn is_important_farmland(&self) -> bool {
        self.farmland_class.as_deref().is_some_and(|class| {
            let class = class.trim().to_ascii_lowercase();
            !class.starts_with("not ")
                && (class.contains("prime") || class.contains("statewide importance"))
        })
    }
}

/// A soil series occurring within a map unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilComponent {
    pub cokey: String,
    pub mukey: String,
    pub compname: String,
    /// Representative percentage of the map unit
    pub comppct: Option<f64>,
    pub drainage_class: Option<String>,
    pub hydrologic_group: Option<String>,
    /// Representative slope, percent
    pub slope: Option<f64>,
    pub tax_class: Option<String>,
    pub tax_order: Option<String>,
    pub tax_suborder: Option<String>,
    /// Non-irrigated capability class with subclass, e.g. "2e"
    pub capability_class: Option<String>,
    pub major_component: bool,
}

impl SoilComponent {
    /// Numeric capability class (1-8), if the class starts with a valid digit.
    pub fn capability_number(&self) -> Option<u8> {
        self.capability_class
            .as_deref()
            .and_then(|c| c.trim().chars().next())
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8)
            .filter(|d| (1..=8).contains(d))
    }
}

/// A depth-bounded layer within a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilHorizon {
    pub chkey: String,
    pub cokey: String,
    pub name: Option<String>,
    /// Top depth, cm
    pub top_depth: Option<f64>,
    /// Bottom depth, cm
    pub bottom_depth: Option<f64>,
    pub sand: Option<f64>,
    pub silt: Option<f64>,
    pub clay: Option<f64>,
    pub organic_matter: Option<f64>,
    pub ph: Option<f64>,
    /// Electrical conductivity, dS/m
    pub ec: Option<f64>,
    /// Available water capacity, cm/cm
    pub awc: Option<f64>,
    /// Cation exchange capacity at pH 7
    pub cec: Option<f64>,
}

// ─── Derived Analytics ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum InsightKind {
    Strength,
    Limitation,
    Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A generated statement about the soils in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilInsight {
    pub kind: InsightKind,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// One of the top-ranked soils in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DominantSoil {
    pub name: String,
    /// Share of all component percentages in the area, 0-100
    pub percentage: f64,
    pub description: String,
    pub drainage_class: Option<String>,
    pub hydrologic_group: Option<String>,
    pub capability_class: Option<String>,
    pub prime_farmland: bool,
}

/// Ordered worst-to-best so `Ord` follows suitability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SuitabilityRating {
    NotSuited,
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LandUseSuitability {
    pub cropland: SuitabilityRating,
    pub pasture: SuitabilityRating,
    pub woodland: SuitabilityRating,
    pub garden: SuitabilityRating,
}

impl LandUseSuitability {
    pub fn not_suited() -> Self {
        Self {
            cropland: SuitabilityRating::NotSuited,
            pasture: SuitabilityRating::NotSuited,
            woodland: SuitabilityRating::NotSuited,
            garden: SuitabilityRating::NotSuited,
        }
    }
}

/// A suggested area of the property for a particular use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecommendedZone {
    pub name: String,
    pub purpose: String,
    pub soils: Vec<String>,
    pub percentage: f64,
}

/// Everything known about the soils inside a polygon. This is the cached unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SoilSummary {
    pub provider: String,
    pub bounds: BoundingBox,
    pub total_acres: f64,
    pub map_units: Vec<SoilMapUnit>,
    pub dominant_soils: Vec<DominantSoil>,
    pub insights: Vec<SoilInsight>,
    pub suitability: LandUseSuitability,
    pub recommended_zones: Vec<RecommendedZone>,
}

/// Detail view of a single map unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapUnitDetails {
    pub map_unit: SoilMapUnit,
    pub components: Vec<SoilComponent>,
    /// Horizons per component key, ordered by top depth
    pub horizons: BTreeMap<String, Vec<SoilHorizon>>,
}

/// Map overlay descriptor for the frontend map client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WmsConfig {
    pub url: String,
    pub layers: String,
    pub format: String,
    pub transparent: bool,
    pub version: String,
    pub attribution: String,
    /// Below this zoom the overlay is too dense to be useful
    pub min_zoom: u8,
}

// ─── Cache Storage ───────────────────────────────────────────────

/// Stored cache document (keyed by `cache_key`).
///
/// The polygon is kept as JSON text because Firestore cannot store nested arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilCacheEntry {
    pub cache_key: String,
    pub provider: String,
    pub polygon_json: String,
    pub summary: SoilSummary,
    /// RFC3339 UTC with `Z` suffix, so lexical order is time order
    pub expires_at: String,
    pub created_at: String,
}

impl SoilCacheEntry {
    /// Whether the entry is still live at `now`. Unparsable expiry counts as expired.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|expires| expires.with_timezone(&Utc) > now)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeoJsonPolygon {
        GeoJsonPolygon::from_ring(vec![
            [-93.0, 42.0],
            [-92.9, 42.0],
            [-92.9, 42.1],
            [-93.0, 42.1],
            [-93.0, 42.0],
        ])
    }

    #[test]
    fn test_polygon_validate() {
        assert!(square().validate().is_ok());

        let mut wrong_type = square();
        wrong_type.kind = "LineString".to_string();
        assert!(wrong_type.validate().is_err());

        let short = GeoJsonPolygon::from_ring(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert!(short.validate().is_err());

        let mut bad_position = square();
        bad_position.coordinates[0][1] = vec![f64::NAN, 1.0];
        assert!(bad_position.validate().is_err());
    }

    #[test]
    fn test_polygon_deserializes_geojson() {
        let polygon: GeoJsonPolygon = serde_json::from_str(
            r#"{"type":"Polygon","coordinates":[[[-93,42],[-92.9,42],[-92.9,42.1],[-93,42]]]}"#,
        )
        .unwrap();
        assert_eq!(polygon.kind, "Polygon");
        assert_eq!(polygon.exterior().unwrap().len(), 4);
    }

    #[test]
    fn test_capability_number() {
        let mut component = SoilComponent {
            cokey: "1".to_string(),
            mukey: "2".to_string(),
            compname: "Clarion".to_string(),
            comppct: Some(80.0),
            drainage_class: None,
            hydrologic_group: None,
            slope: None,
            tax_class: None,
            tax_order: None,
            tax_suborder: None,
            capability_class: Some("2e".to_string()),
            major_component: true,
        };
        assert_eq!(component.capability_number(), Some(2));

        component.capability_class = Some("x".to_string());
        assert_eq!(component.capability_number(), None);

        component.capability_class = None;
        assert_eq!(component.capability_number(), None);
    }

    #[test]
    fn test_important_farmland() {
        let mut unit = SoilMapUnit {
            mukey: "1".to_string(),
            musym: "L1".to_string(),
            muname: "Loam".to_string(),
            mukind: None,
            acres: None,
            farmland_class: Some("All areas are prime farmland".to_string()),
        };
        assert!(unit.is_important_farmland());

        unit.farmland_class = Some("Farmland of statewide importance".to_string());
        assert!(unit.is_important_farmland());

        unit.farmland_class = Some("Not prime farmland".to_string());
        assert!(!unit.is_important_farmland());

        unit.farmland_class = None;
        assert!(!unit.is_important_farmland());
    }

    #[test]
    fn test_suitability_ordering() {
        assert!(SuitabilityRating::Excellent > SuitabilityRating::Good);
        assert!(SuitabilityRating::Poor > SuitabilityRating::NotSuited);
    }

    #[test]
    fn test_cache_entry_freshness() {
        let now = Utc::now();
        let summary = SoilSummary {
            provider: "ssurgo".to_string(),
            bounds: BoundingBox::empty(),
            total_acres: 0.0,
            map_units: vec![],
            dominant_soils: vec![],
            insights: vec![],
            suitability: LandUseSuitability::not_suited(),
            recommended_zones: vec![],
        };
        let mut entry = SoilCacheEntry {
            cache_key: "k".to_string(),
            provider: "ssurgo".to_string(),
            polygon_json: "[]".to_string(),
            summary,
            expires_at: (now + chrono::Duration::minutes(1)).to_rfc3339(),
            created_at: now.to_rfc3339(),
        };
        assert!(entry.is_fresh(now));

        entry.expires_at = (now - chrono::Duration::seconds(1)).to_rfc3339();
        assert!(!entry.is_fresh(now));

        entry.expires_at = "garbage".to_string();
        assert!(!entry.is_fresh(now));
    }
}
