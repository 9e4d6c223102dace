// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion between GeoJSON polygons and well-known text.
//!
//! Soil Data Access takes and returns geometry as WKT. Only polygons are
//! supported. A MULTIPOLYGON is reduced to its first part, since the map
//! highlighting on the frontend works with single polygons.

use crate::models::soil::{BoundingBox, GeoJsonPolygon};
use geo::{BoundingRect, Geometry, Polygon};
use wkt::{ToWkt, TryFromWkt};

/// Render the exterior ring of a polygon as `POLYGON((lng lat,...))`.
///
/// Ring closure is not checked; callers pass validated polygons.
pub fn polygon_to_wkt(polygon: &GeoJsonPolygon) -> String {
    to_geo_polygon(polygon)
        .map(|p| Polygon::new(p.exterior().clone(), vec![]).wkt_string())
        .unwrap_or_else(|| "POLYGON EMPTY".to_string())
}

/// Parse a POLYGON or MULTIPOLYGON WKT string. Returns `None` if malformed.
pub fn wkt_to_polygon(wkt: &str) -> Option<GeoJsonPolygon> {
    let wkt = wkt.trim().to_ascii_uppercase();
    let polygon = match Geometry::<f64>::try_from_wkt_str(&wkt).ok()? {
        Geometry::Polygon(p) => p,
        Geometry::MultiPolygon(mp) => mp.0.into_iter().next()?,
        _ => return None,
    };
    if polygon.exterior().0.is_empty() {
        return None;
    }

    match geojson::Value::from(&polygon) {
        geojson::Value::Polygon(coordinates) => Some(GeoJsonPolygon {
            kind: GeoJsonPolygon::TYPE.to_string(),
            coordinates,
        }),
        _ => None,
    }
}

/// Bounding box of the exterior ring.
pub fn polygon_bounds(polygon: &GeoJsonPolygon) -> Option<BoundingBox> {
    let poly = to_geo_polygon(polygon)?;
    poly.bounding_rect().map(|rect| BoundingBox {
        min_lng: rect.min().x,
        min_lat: rect.min().y,
        max_lng: rect.max().x,
        max_lat: rect.max().y,
    })
}

/// Convert to a `geo` polygon via the geojson conversion.
pub fn to_geo_polygon(polygon: &GeoJsonPolygon) -> Option<Polygon<f64>> {
    let value = geojson::Value::Polygon(polygon.coordinates.clone());
    value.try_into().ok()
}
