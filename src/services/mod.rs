// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod sda;
pub mod sda_parse;
pub mod soil;
pub mod soil_analytics;
pub mod soil_cache;
pub mod soil_provider;
pub mod wkt;

pub use sda::SdaClient;
pub use soil::SoilService;
pub use soil_cache::{CacheBackend, SoilCache};
pub use soil_provider::{SoilProvider, SsurgoProvider};
