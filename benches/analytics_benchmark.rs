use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use soil_service::models::soil::BoundingBox;
use soil_service::services::sda_parse::{parse_components, parse_map_units};
use soil_service::services::soil_analytics::build_summary;
use soil_service::services::wkt::wkt_to_polygon;
use std::hint::black_box;

const DRAINAGE: [&str; 4] = [
    "Well drained",
    "Moderately well drained",
    "Somewhat poorly drained",
    "Poorly drained",
];
const HYDGRP: [&str; 4] = ["A", "B", "C/D", "D"];
const COMPPCT: [&str; 3] = ["70", "20", "10"];

/// A large farm: many small map units with three components each.
fn synthetic_tables(map_units: usize) -> (Value, Value) {
    let mut mu_rows = vec![json!(["mukey", "musym", "muname", "mukind", "area_ac", "farmlndcl"])];
    let mut co_rows = vec![json!([
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
        "majcompflag"
    ])];

    for i in 0..map_units {
        let mukey = (400000 + i).to_string();
        let farmland = if i % 3 == 0 {
            "All areas are prime farmland"
        } else {
            "Not prime farmland"
        };
        mu_rows.push(json!([
            mukey,
            format!("U{}", i),
            format!("Series {} loam", i % 17),
            "Consociation",
            format!("{:.1}", 1.0 + (i % 9) as f64),
            farmland
        ]));
        for j in 0..3 {
            let major = if j == 0 { "Yes" } else { "No" };
            co_rows.push(json!([
                format!("{}{}", mukey, j),
                mukey,
                format!("Series {}", (i + j) % 23),
                COMPPCT[j],
                DRAINAGE[(i + j) % DRAINAGE.len()],
                HYDGRP[(i * 7 + j) % HYDGRP.len()],
                format!("{}", (i + j) % 25),
                "Fine-loamy, mixed, mesic Typic Hapludolls",
                "Mollisols",
                "Udolls",
                ((i + j) % 8 + 1).to_string(),
                "e",
                major
            ]));
        }
    }

    (json!({ "Table": mu_rows }), json!({ "Table": co_rows }))
}

fn benchmark_summary(c: &mut Criterion) {
    let (map_unit_table, component_table) = synthetic_tables(500);
    let bounds = BoundingBox {
        min_lng: -93.1,
        min_lat: 41.9,
        max_lng: -92.8,
        max_lat: 42.2,
    };

    let mut group = c.benchmark_group("soil_summary");

    group.bench_function("parse_tables", |b| {
        b.iter(|| {
            let units = parse_map_units(black_box(&map_unit_table));
            let components = parse_components(black_box(&component_table));
            (units, components)
        })
    });

    let units = parse_map_units(&map_unit_table);
    let components = parse_components(&component_table);
    group.bench_function("build_summary_500_units", |b| {
        b.iter(|| {
            build_summary(
                "ssurgo",
                bounds,
                black_box(units.clone()),
                black_box(&components),
            )
        })
    });

    group.finish();
}

fn benchmark_wkt(c: &mut Criterion) {
    // A clipped map unit boundary with a few hundred vertices
    let ring: Vec<String> = (0..400)
        .map(|i| {
            let t = i as f64 / 400.0 * std::f64::consts::TAU;
            format!("{:.6} {:.6}", -93.0 + 0.01 * t.cos(), 42.0 + 0.01 * t.sin())
        })
        .chain(std::iter::once("-92.990000 42.000000".to_string()))
        .collect();
    let wkt = format!("MULTIPOLYGON ((({})))", ring.join(", "));

    c.bench_function("wkt_to_polygon_400_vertices", |b| {
        b.iter(|| wkt_to_polygon(black_box(&wkt)))
    });
}

criterion_group!(benches, benchmark_summary, benchmark_wkt);
criterion_main!(benches);
