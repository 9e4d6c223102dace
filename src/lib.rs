// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Soil-Service: soil survey summaries for hobby farm properties
//!
//! This crate provides the backend API that turns a drawn property
//! boundary into a soil summary (dominant soils, land-use suitability,
//! insights and suggested zones) using public soil survey data.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::SoilService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub soil_service: SoilService,
}
