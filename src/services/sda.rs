// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! USDA Soil Data Access (SDA) tabular query client.
//!
//! SDA accepts T-SQL text and returns `{ "Table": [...] }`. There is no
//! parameter binding, so every literal is escaped inline by the query
//! builders below. With `JSON+COLUMNNAME` the first row of the table holds
//! the column names.

use crate::error::AppError;
use serde_json::Value;
use std::time::Duration;

/// Response format requested from SDA.
const SDA_FORMAT: &str = "JSON+COLUMNNAME";

/// Square meters per acre.
const SQ_METERS_PER_ACRE: f64 = 4046.8564224;

/// SDA tabular query client.
#[derive(Clone)]
pub struct SdaClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SdaClient {
    /// Create a client for the given tabular endpoint.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run a query and return the decoded JSON payload without interpreting it.
    ///
    /// The whole exchange (connect, send, read body) is bounded by the
    /// configured timeout.
    pub async fn query(&self, sql: &str) -> Result<Value, AppError> {
        let started = std::time::Instant::now();

        let result = tokio::time::timeout(self.timeout, self.execute(sql)).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(value)) => {
                tracing::debug!(elapsed_ms, "SDA query completed");
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::warn!(elapsed_ms, error = %e, "SDA query failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(elapsed_ms, "SDA query timed out");
                Err(AppError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn execute(&self, sql: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .post(&self.url)
            .form(&[("query", sql), ("format", SDA_FORMAT)])
            .send()
            .await
            .map_err(|e| AppError::RemoteService {
                status: AppError::NO_RESPONSE_STATUS,
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AppError::RemoteService {
            status: status.as_u16(),
            body: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(AppError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        // SDA answers a query with no rows with an empty body
        if body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&body).map_err(|e| AppError::RemoteService {
            status: status.as_u16(),
            body: format!("JSON parse error: {}", e),
        })
    }
}

// ─── Query Builders ──────────────────────────────────────────────

/// Escape a value for use inside a single-quoted T-SQL literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Map unit keys are positive integers; anything else is rejected before it reaches SQL.
pub fn validate_mukey(mukey: &str) -> Result<&str, AppError> {
    let trimmed = mukey.trim();
    if trimmed.is_empty() || trimmed.len() > 12 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "Invalid map unit key: {}",
            mukey
        )));
    }
    Ok(trimmed)
}

fn quoted_list(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("'{}'", escape_literal(k)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn declare_aoi(wkt: &str) -> String {
    format!(
        "~DeclareGeometry(@aoi)~\nSELECT @aoi = geometry::STPolyFromText('{}', 4326);\n",
        escape_literal(wkt)
    )
}

/// Map units intersecting the polygon, with the acreage inside it.
///
/// Columns: mukey, musym, muname, mukind, area_ac, farmlndcl
pub fn map_units_in_polygon(wkt: &str) -> String {
    format!(
        "{}SELECT mu.mukey, mu.musym, mu.muname, mu.mukind, \
         ROUND(SUM(geography::STGeomFromWKB(\
         P.mupolygongeo.STIntersection(@aoi).STAsBinary(), 4326).STArea()) / {}, 2) AS area_ac, \
         mu.farmlndcl \
         FROM mupolygon P \
         INNER JOIN mapunit mu ON mu.mukey = P.mukey \
         WHERE P.mupolygongeo.STIntersects(@aoi) = 1 \
         GROUP BY mu.mukey, mu.musym, mu.muname, mu.mukind, mu.farmlndcl \
         ORDER BY area_ac DESC",
        declare_aoi(wkt),
        SQ_METERS_PER_ACRE
    )
}

/// A single map unit by key. Acreage is not meaningful here and is returned as NULL.
///
/// Columns match [`map_units_in_polygon`].
pub fn map_unit_by_key(mukey: &str) -> String {
    format!(
        "SELECT mukey, musym, muname, mukind, NULL AS area_ac, farmlndcl \
         FROM mapunit WHERE mukey = '{}'",
        escape_literal(mukey)
    )
}

/// Components of the given map units, largest first within each unit.
///
/// Columns: cokey, mukey, compname, comppct_r, drainagecl, hydgrp, slope_r,
/// taxclname, taxorder, taxsuborder, nirrcapcl, nirrcapscl, majcompflag
pub fn components_for_map_units(mukeys: &[String]) -> String {
    format!(
        "SELECT c.cokey, c.mukey, c.compname, c.comppct_r, c.drainagecl, c.hydgrp, c.slope_r, \
         c.taxclname, c.taxorder, c.taxsuborder, c.nirrcapcl, c.nirrcapscl, c.majcompflag \
         FROM component c \
         WHERE c.mukey IN ({}) \
         ORDER BY c.mukey, c.comppct_r DESC",
        quoted_list(mukeys)
    )
}

/// Horizons of the given components, shallowest first.
///
/// Columns: chkey, cokey, hzname, hzdept_r, hzdepb_r, sandtotal_r, silttotal_r,
/// claytotal_r, om_r, ph1to1h2o_r, ec_r, awc_r, cec7_r
pub fn horizons_for_components(cokeys: &[String]) -> String {
    format!(
        "SELECT ch.chkey, ch.cokey, ch.hzname, ch.hzdept_r, ch.hzdepb_r, ch.sandtotal_r, \
         ch.silttotal_r, ch.claytotal_r, ch.om_r, ch.ph1to1h2o_r, ch.ec_r, ch.awc_r, ch.cec7_r \
         FROM chorizon ch \
         WHERE ch.cokey IN ({}) \
         ORDER BY ch.cokey, ch.hzdept_r",
        quoted_list(cokeys)
    )
}

/// Map unit polygons clipped to the query polygon, as WKT.
///
/// Columns: mukey, musym, muname, wkt
pub fn geometries_in_polygon(wkt: &str) -> String {
    format!(
        "{}SELECT P.mukey, mu.musym, mu.muname, \
         P.mupolygongeo.STIntersection(@aoi).STAsText() AS wkt \
         FROM mupolygon P \
         INNER JOIN mapunit mu ON mu.mukey = P.mukey \
         WHERE P.mupolygongeo.STIntersects(@aoi) = 1",
        declare_aoi(wkt)
    )
}
