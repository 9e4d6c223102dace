// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod soil;

pub use soil::{
    BoundingBox, GeoJsonPolygon, MapUnitDetails, ProviderQuery, SoilCacheEntry, SoilComponent,
    SoilHorizon, SoilMapUnit, SoilPolygonRequest, SoilSummary, WmsConfig,
};
