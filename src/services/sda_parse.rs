// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsers turning raw SDA tables into typed soil records.
//!
//! SDA returns every cell as a string (or null). A row may be an array,
//! in which case the header row maps names to positions, or an object.
//! Columns are looked up by name first and fall back to their position
//! in the query's SELECT list, so the builders in `sda.rs` and the column
//! lists here must stay in the same order.

use crate::models::soil::{GeoJsonPolygon, SoilComponent, SoilHorizon, SoilMapUnit};
use crate::services::wkt::wkt_to_polygon;
use serde_json::Value;
use std::collections::HashMap;

const MAP_UNIT_COLUMNS: [&str; 6] = ["mukey", "musym", "muname", "mukind", "area_ac", "farmlndcl"];

const COMPONENT_COLUMNS: [&str; 13] = [
    "cokey",
    "mukey",
    "compname",
    "comppct_r",
    "drainagecl",
    "hydgrp",
    "slope_r",
    "taxclname",
    "taxorder",
    "taxsuborder",
    "nirrcapcl",
    "nirrcapscl",
    "majcompflag",
];

const HORIZON_COLUMNS: [&str; 13] = [
    "chkey",
    "cokey",
    "hzname",
    "hzdept_r",
    "hzdepb_r",
    "sandtotal_r",
    "silttotal_r",
    "claytotal_r",
    "om_r",
    "ph1to1h2o_r",
    "ec_r",
    "awc_r",
    "cec7_r",
];

const GEOMETRY_COLUMNS: [&str; 4] = ["mukey", "musym", "muname", "wkt"];

/// A clipped map unit polygon for overlay highlighting.
#[derive(Debug, Clone, PartialEq)]
pub struct MapUnitGeometry {
    pub mukey: String,
    pub musym: String,
    pub muname: String,
    pub polygon: GeoJsonPolygon,
}

/// Parse map unit rows.
pub fn parse_map_units(result: &Value) -> Vec<SoilMapUnit> {
    let table = Table::new(result, &MAP_UNIT_COLUMNS);
    table
        .rows()
        .filter_map(|row| {
            Some(SoilMapUnit {
                mukey: row.text(0)?,
                musym: row.text(1).unwrap_or_default(),
                muname: row.text(2).unwrap_or_default(),
                mukind: row.text(3),
                acres: row.number(4),
                farmland_class: row.text(5),
            })
        })
        .collect()
}

/// Parse component rows.
pub fn parse_components(result: &Value) -> Vec<SoilComponent> {
    let table = Table::new(result, &COMPONENT_COLUMNS);
    table
        .rows()
        .filter_map(|row| {
            let capability_class = row
                .text(10)
                .map(|class| format!("{}{}", class, row.text(11).unwrap_or_default()));

            Some(SoilComponent {
                cokey: row.text(0)?,
                mukey: row.text(1).unwrap_or_default(),
                compname: row.text(2).unwrap_or_else(|| "Unnamed".to_string()),
                comppct: row.number(3),
                drainage_class: row.text(4),
                hydrologic_group: row.text(5),
                slope: row.number(6),
                tax_class: row.text(7),
                tax_order: row.text(8),
                tax_suborder: row.text(9),
                capability_class,
                major_component: row
                    .text(12)
                    .is_some_and(|flag| flag.eq_ignore_ascii_case("yes")),
            })
        })
        .collect()
}

/// Parse horizon rows.
pub fn parse_horizons(result: &Value) -> Vec<SoilHorizon> {
    let table = Table::new(result, &HORIZON_COLUMNS);
    table
        .rows()
        .filter_map(|row| {
            Some(SoilHorizon {
                chkey: row.text(0)?,
                cokey: row.text(1).unwrap_or_default(),
                name: row.text(2),
                top_depth: row.number(3),
                bottom_depth: row.number(4),
                sand: row.number(5),
                silt: row.number(6),
                clay: row.number(7),
                organic_matter: row.number(8),
                ph: row.number(9),
                ec: row.number(10),
                awc: row.number(11),
                cec: row.number(12),
            })
        })
        .collect()
}

/// Parse geometry rows, dropping rows whose WKT does not parse.
pub fn parse_geometries(result: &Value) -> Vec<MapUnitGeometry> {
    let table = Table::new(result, &GEOMETRY_COLUMNS);
    let mut dropped = 0usize;
    let geometries: Vec<MapUnitGeometry> = table
        .rows()
        .filter_map(|row| {
            let mukey = row.text(0)?;
            let polygon = match row.text(3).as_deref().and_then(wkt_to_polygon) {
                Some(polygon) => polygon,
                None => {
                    dropped += 1;
                    return None;
                }
            };
            Some(MapUnitGeometry {
                mukey,
                musym: row.text(1).unwrap_or_default(),
                muname: row.text(2).unwrap_or_default(),
                polygon,
            })
        })
        .collect();

    if dropped > 0 {
        tracing::debug!(dropped, "Skipped map unit geometries with unparsable WKT");
    }
    geometries
}

// ─── Table Access ────────────────────────────────────────────────

/// Rows of an SDA result plus the header mapping, if one was sent.
struct Table<'a> {
    rows: &'a [Value],
    columns: &'a [&'a str],
    header: Option<HashMap<String, usize>>,
}

impl<'a> Table<'a> {
    fn new(result: &'a Value, columns: &'a [&'a str]) -> Self {
        let rows = result
            .get("Table")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let header = rows
            .first()
            .and_then(Value::as_array)
            .filter(|first| {
                first.iter().all(Value::is_string)
                    && first.iter().any(|cell| {
                        cell.as_str()
                            .is_some_and(|name| name.eq_ignore_ascii_case(columns[0]))
                    })
            })
            .map(|first| {
                first
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| Some((name.as_str()?.to_ascii_lowercase(), i)))
                    .collect::<HashMap<_, _>>()
            });

        if let Some(header) = &header {
            let missing: Vec<&str> = columns
                .iter()
                .copied()
                .filter(|c| !header.contains_key(*c))
                .collect();
            if !missing.is_empty() {
                tracing::warn!(
                    ?missing,
                    "SDA response lacks expected columns, falling back to positions"
                );
            }
        }

        let rows = if header.is_some() { &rows[1..] } else { rows };
        Self {
            rows,
            columns,
            header,
        }
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |value| Row {
            value,
            columns: self.columns,
            header: self.header.as_ref(),
        })
    }
}

struct Row<'a> {
    value: &'a Value,
    columns: &'a [&'a str],
    header: Option<&'a HashMap<String, usize>>,
}

impl Row<'_> {
    /// Cell for the column at `index` in the column list, by name then position.
    fn cell(&self, index: usize) -> Option<&Value> {
        let name = self.columns.get(index)?;
        match self.value {
            Value::Object(map) => map
                .get(*name)
                .or_else(|| map.get(&index.to_string())),
            Value::Array(cells) => self
                .header
                .and_then(|h| h.get(*name))
                .and_then(|&i| cells.get(i))
                .or_else(|| cells.get(index)),
            _ => None,
        }
    }

    /// Non-empty text value. Numbers are rendered as text.
    fn text(&self, index: usize) -> Option<String> {
        match self.cell(index)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Finite numeric value; anything unparsable is `None`.
    fn number(&self, index: usize) -> Option<f64> {
        let n = match self.cell(index)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_map_units_with_header() {
        let result = json!({
            "Table": [
                ["mukey", "musym", "muname", "mukind", "area_ac", "farmlndcl"],
                [
                    "411278",
                    "L55",
                    "Nicollet clay loam",
                    "Consociation",
                    "12.5",
                    "All areas are prime farmland"
                ],
                ["411279", "138B", "Clarion loam", null, "not-a-number", null]
            ]
        });

        let units = parse_map_units(&result);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].mukey, "411278");
        assert_eq!(units[0].acres, Some(12.5));
        assert!(units[0].is_important_farmland());
        assert_eq!(units[1].mukind, None);
        assert_eq!(units[1].acres, None);
    }

    #[test]
    fn test_header_order_wins_over_position() {
        let result = json!({
            "Table": [
                ["mukey", "muname", "musym", "mukind", "area_ac", "farmlndcl"],
                ["1", "Webster clay loam", "107", null, "3", null]
            ]
        });

        let units = parse_map_units(&result);
        assert_eq!(units[0].musym, "107");
        assert_eq!(units[0].muname, "Webster clay loam");
    }

    #[test]
    fn test_header_not_led_by_key_column() {
        let result = json!({
            "Table": [
                ["musym", "mukey", "muname", "mukind", "area_ac", "farmlndcl"],
                ["107", "1", "Webster clay loam", null, "3", null]
            ]
        });

        let units = parse_map_units(&result);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].mukey, "1");
        assert_eq!(units[0].musym, "107");
        assert_eq!(units[0].acres, Some(3.0));
    }

    #[test]
    fn test_positional_rows_without_header() {
        let result = json!({
            "Table": [["1", "107", "Webster clay loam", null, "3.25", null]]
        });

        let units = parse_map_units(&result);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].muname, "Webster clay loam");
        assert_eq!(units[0].acres, Some(3.25));
    }

    #[test]
    fn test_object_rows_named_then_positional() {
        let result = json!({
            "Table": [{
                "cokey": "100",
                "mukey": "1",
                "compname": "Clarion",
                "comppct_r": 85,
                "4": "Well drained",
                "hydgrp": "B",
                "slope_r": "4",
                "nirrcapcl": "2",
                "nirrcapscl": "e",
                "majcompflag": "Yes"
            }]
        });

        let components = parse_components(&result);
        assert_eq!(components.len(), 1);
        let c = &components[0];
        assert_eq!(c.comppct, Some(85.0));
        assert_eq!(c.drainage_class.as_deref(), Some("Well drained"));
        assert_eq!(c.capability_class.as_deref(), Some("2e"));
        assert_eq!(c.capability_number(), Some(2));
        assert!(c.major_component);
        assert_eq!(c.tax_order, None);
    }

    #[test]
    fn test_missing_or_invalid_table_is_empty() {
        assert!(parse_map_units(&json!({})).is_empty());
        assert!(parse_components(&json!({ "Table": "oops" })).is_empty());
        assert!(parse_horizons(&json!(null)).is_empty());
        assert!(parse_geometries(&json!({ "Table": [] })).is_empty());
    }

    #[test]
    fn test_rows_without_key_are_skipped() {
        let result = json!({
            "Table": [
                ["chkey", "cokey", "hzname", "hzdept_r", "hzdepb_r"],
                [null, "100", "Ap", "0", "20"],
                ["5", "100", "Bt", "20", "60"]
            ]
        });

        let horizons = parse_horizons(&result);
        assert_eq!(horizons.len(), 1);
        assert_eq!(horizons[0].name.as_deref(), Some("Bt"));
        assert_eq!(horizons[0].top_depth, Some(20.0));
        assert_eq!(horizons[0].ph, None);
    }

    #[test]
    fn test_parse_geometries_drops_bad_wkt() {
        let result = json!({
            "Table": [
                ["mukey", "musym", "muname", "wkt"],
                ["1", "L55", "Nicollet", "POLYGON ((-93 42, -92.9 42, -92.9 42.1, -93 42))"],
                ["2", "138B", "Clarion", "GEOMETRYCOLLECTION EMPTY"],
                [
                    "3",
                    "107",
                    "Webster",
                    concat!(
                        "MULTIPOLYGON (((-93 42, -92.95 42, -92.95 42.05, -93 42)), ",
                        "((0 0, 1 0, 1 1, 0 0)))"
                    )
                ]
            ]
        });

        let geometries = parse_geometries(&result);
        assert_eq!(geometries.len(), 2);
        assert_eq!(geometries[0].mukey, "1");
        assert_eq!(geometries[1].mukey, "3");
        assert_eq!(geometries[1].polygon.coordinates.len(), 1);
    }
}
