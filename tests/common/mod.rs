// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{routing::post, Form, Router};
use serde_json::{json, Value};
use soil_service::config::Config;
use soil_service::db::FirestoreDb;
use soil_service::middleware::auth::create_jwt;
use soil_service::routes::create_router;
use soil_service::services::{SdaClient, SoilCache, SoilService, SsurgoProvider};
use soil_service::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// How the mock Soil Data Access server answers.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdaBehavior {
    /// Canned tables for two Iowa map units.
    Normal,
    /// Empty body, as SDA sends for a query with no rows.
    Empty,
    /// HTTP 500 for every query.
    Failing,
    /// Answers normally, but only after `SLOW_SDA_DELAY`.
    Slow,
}

/// How long the `Slow` mock waits before answering.
#[allow(dead_code)]
pub const SLOW_SDA_DELAY: Duration = Duration::from_secs(3);

/// A local stand-in for the SDA tabular endpoint.
#[allow(dead_code)]
pub struct MockSda {
    pub url: String,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockSda {
    /// Number of queries received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a mock SDA server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_mock_sda(behavior: SdaBehavior) -> MockSda {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let app = Router::new().route(
        "/Tabular/post.rest",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let query = form.get("query").cloned().unwrap_or_default();
                match behavior {
                    SdaBehavior::Normal => (
                        axum::http::StatusCode::OK,
                        answer(&query).map(|v| v.to_string()).unwrap_or_default(),
                    ),
                    SdaBehavior::Empty => (axum::http::StatusCode::OK, String::new()),
                    SdaBehavior::Failing => (
                        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        "Invalid query".to_string(),
                    ),
                    SdaBehavior::Slow => {
                        tokio::time::sleep(SLOW_SDA_DELAY).await;
                        (
                            axum::http::StatusCode::OK,
                            answer(&query).map(|v| v.to_string()).unwrap_or_default(),
                        )
                    }
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock SDA");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockSda {
        url: format!("http://{}/Tabular/post.rest", addr),
        calls,
    }
}

/// Canned SDA table for a query, filtered by the keys it names.
fn answer(query: &str) -> Option<Value> {
    let (header, rows) = if query.contains("FROM chorizon") {
        (horizon_header(), horizon_rows())
    } else if query.contains("FROM component") {
        (component_header(), component_rows())
    } else if query.contains("STAsText") {
        (
            vec!["mukey", "musym", "muname", "wkt"],
            vec![vec![
                "411278",
                "L55",
                "Nicollet clay loam, 1 to 3 percent slopes",
                "POLYGON ((-93.0 42.0, -92.95 42.0, -92.95 42.05, -93.0 42.0))",
            ]],
        )
    } else if query.contains("FROM mapunit WHERE mukey") {
        let rows = map_unit_rows()
            .into_iter()
            .filter(|row| query.contains(&format!("'{}'", row[0])))
            .collect();
        (map_unit_header(), rows)
    } else if query.contains("FROM mupolygon") {
        (map_unit_header(), map_unit_rows())
    } else {
        return None;
    };

    // Child tables are filtered by the parent key in the IN (...) list
    let is_child_table = query.contains("FROM component") || query.contains("FROM chorizon");
    let rows: Vec<Vec<&str>> = if is_child_table {
        rows.into_iter()
            .filter(|row| query.contains(&format!("'{}'", row[1])))
            .collect()
    } else {
        rows
    };

    let mut table = vec![json!(header)];
    table.extend(rows.into_iter().map(|row| json!(row)));
    Some(json!({ "Table": table }))
}

fn map_unit_header() -> Vec<&'static str> {
    vec!["mukey", "musym", "muname", "mukind", "area_ac", "farmlndcl"]
}

fn map_unit_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec![
            "411278",
            "L55",
            "Nicollet clay loam, 1 to 3 percent slopes",
            "Consociation",
            "25.4",
            "All areas are prime farmland",
        ],
        vec![
            "411305",
            "L83A",
            "Webster clay loam, 0 to 2 percent slopes",
            "Consociation",
            "14.6",
            "Prime farmland if drained",
        ],
    ]
}

fn component_header() -> Vec<&'static str> {
    vec![
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
    ]
}

fn component_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec![
            "22001",
            "411278",
            "Nicollet",
            "85",
            "Somewhat poorly drained",
            "C/D",
            "2",
            "Fine-loamy, mixed, superactive, mesic Aquic Hapludolls",
            "Mollisols",
            "Udolls",
            "1",
            "",
            "Yes",
        ],
        vec![
            "22002",
            "411305",
            "Webster",
            "90",
            "Poorly drained",
            "C/D",
            "1",
            "Fine-loamy, mixed, superactive, mesic Typic Endoaquolls",
            "Mollisols",
            "Aquolls",
            "2",
            "w",
            "Yes",
        ],
    ]
}

fn horizon_header() -> Vec<&'static str> {
    vec![
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
    ]
}

fn horizon_rows() -> Vec<Vec<&'static str>> {
    // Deliberately deepest first
    vec![
        vec![
            "330002", "22001", "Bw", "46", "152", "32", "40", "28", "1", "6.8", "0", "0.17",
            "22",
        ],
        vec![
            "330001", "22001", "Ap", "0", "46", "30", "42", "28", "4.5", "6.4", "0", "0.2", "28",
        ],
    ]
}

/// Create a test app whose SSURGO provider talks to `sda_url`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(sda_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_timeout(sda_url, 5)
}

/// Like `create_test_app`, with an explicit SDA timeout in seconds.
#[allow(dead_code)]
pub fn create_test_app_with_timeout(
    sda_url: &str,
    timeout_secs: u64,
) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.sda_url = sda_url.to_string();
    config.sda_timeout_secs = timeout_secs;

    let cache = SoilCache::in_memory(config.soil_cache_ttl());
    let sda = SdaClient::new(&config.sda_url, config.sda_timeout_secs);
    let soil_service = SoilService::new(cache).with_provider(Arc::new(SsurgoProvider::new(sda)));

    let state = Arc::new(AppState {
        config,
        soil_service,
    });

    (create_router(state.clone()), state)
}

/// Bearer header value for a test user.
#[allow(dead_code)]
pub fn bearer(state: &AppState) -> String {
    let token = create_jwt("farmer-1", &state.config.jwt_signing_key).expect("Failed to sign JWT");
    format!("Bearer {}", token)
}

/// A small field in central Iowa.
#[allow(dead_code)]
pub fn iowa_polygon() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [-93.0, 42.0],
            [-92.9, 42.0],
            [-92.9, 42.1],
            [-93.0, 42.1],
            [-93.0, 42.0]
        ]]
    })
}

/// A paddock in Tasmania, outside every provider's coverage.
#[allow(dead_code)]
pub fn tasmania_polygon() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [146.0, -42.0],
            [146.1, -42.0],
            [146.1, -41.9],
            [146.0, -42.0]
        ]]
    })
}
