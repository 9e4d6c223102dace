// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Agronomic analytics derived from parsed soil survey records.
//!
//! Everything here is a pure function of the map units and components
//! returned for a polygon, so identical survey data always yields an
//! identical summary.

use crate::models::soil::{
    BoundingBox, DominantSoil, InsightKind, LandUseSuitability, RecommendedZone, Severity,
    SoilComponent, SoilInsight, SoilMapUnit, SoilSummary, SuitabilityRating,
};
use std::collections::{HashMap, HashSet};

/// Number of soils reported as dominant.
const MAX_DOMINANT_SOILS: usize = 5;

/// Capability class assumed when a component has none.
const WORST_CAPABILITY_CLASS: f64 = 8.0;

/// Classes counted as highly productive.
const PRODUCTIVE_CLASSES: [&str; 5] = ["1", "2", "2e", "2s", "2w"];

const POOR_DRAINAGE_THRESHOLD: f64 = 0.3;
const PRODUCTIVE_THRESHOLD: f64 = 0.5;
const GROUP_D_THRESHOLD: f64 = 0.3;
const EROSION_SLOPE: f64 = 8.0;
const SEVERE_EROSION_SLOPE: f64 = 15.0;

/// Land uses rated in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandUse {
    Cropland,
    Pasture,
    Woodland,
    Garden,
}

impl LandUse {
    pub const ALL: [LandUse; 4] = [
        LandUse::Cropland,
        LandUse::Pasture,
        LandUse::Woodland,
        LandUse::Garden,
    ];

    /// Highest average capability class for excellent, good, fair and poor.
    /// Anything above the last bound is not suited.
    fn thresholds(self) -> [f64; 4] {
        match self {
            LandUse::Cropland | LandUse::Garden => [2.0, 3.0, 4.0, 5.0],
            LandUse::Pasture => [3.0, 4.0, 5.0, 6.0],
            LandUse::Woodland => [4.0, 5.0, 6.0, 7.0],
        }
    }
}

/// Assemble a summary from fetched records.
pub fn build_summary(
    provider: &str,
    bounds: BoundingBox,
    map_units: Vec<SoilMapUnit>,
    components: &[SoilComponent],
) -> SoilSummary {
    if map_units.is_empty() {
        return empty_summary(provider, bounds);
    }

    let total_acres = round_to(map_units.iter().filter_map(|u| u.acres).sum(), 2);
    let dominant = dominant_soils(components, &map_units);
    let insights = generate_insights(components, &map_units);
    let suitability = land_use_suitability(components);
    let recommended_zones = recommended_zones(&dominant);

    SoilSummary {
        provider: provider.to_string(),
        bounds,
        total_acres,
        map_units,
        dominant_soils: dominant,
        insights,
        suitability,
        recommended_zones,
    }
}

/// Summary for a polygon with no surveyed map units.
pub fn empty_summary(provider: &str, bounds: BoundingBox) -> SoilSummary {
    SoilSummary {
        provider: provider.to_string(),
        bounds,
        total_acres: 0.0,
        map_units: vec![],
        dominant_soils: vec![],
        insights: vec![SoilInsight {
            kind: InsightKind::Limitation,
            category: "data".to_string(),
            title: "No soil survey data".to_string(),
            description: "No soil map units were found for this area. It may lie outside \
                          surveyed land or be covered by water."
                .to_string(),
            severity: None,
        }],
        suitability: LandUseSuitability::not_suited(),
        recommended_zones: vec![],
    }
}

// ─── Dominant Soils ──────────────────────────────────────────────

struct SoilGroup<'a> {
    name: &'a str,
    total: f64,
    occurrences: Vec<&'a SoilComponent>,
}

/// Rank soils by summed component percentage and keep the top five.
///
/// Percentages are normalized against the sum over every soil, not 100, so
/// an untruncated result sums to ~100. If no component has a percentage,
/// each occurrence counts equally.
pub fn dominant_soils(
    components: &[SoilComponent],
    map_units: &[SoilMapUnit],
) -> Vec<DominantSoil> {
    let use_counts = components.iter().all(|c| c.comppct.unwrap_or(0.0) <= 0.0);
    let weight = |c: &SoilComponent| {
        if use_counts {
            1.0
        } else {
            c.comppct.unwrap_or(0.0).max(0.0)
        }
    };

    let mut groups: Vec<SoilGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for component in components {
        let name = component.compname.as_str();
        let i = *index.entry(name).or_insert_with(|| {
            groups.push(SoilGroup {
                name,
                total: 0.0,
                occurrences: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].total += weight(component);
        groups[i].occurrences.push(component);
    }

    let grand_total: f64 = groups.iter().map(|g| g.total).sum();
    if grand_total <= 0.0 {
        return vec![];
    }

    // Stable sort keeps first-seen order for ties
    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups.truncate(MAX_DOMINANT_SOILS);

    let important: HashSet<&str> = map_units
        .iter()
        .filter(|u| u.is_important_farmland())
        .map(|u| u.mukey.as_str())
        .collect();

    groups
        .into_iter()
        .map(|group| {
            let occurrences = &group.occurrences;
            let drainage = most_common(occurrences.iter().map(|c| c.drainage_class.as_deref()));
            let hydrologic =
                most_common(occurrences.iter().map(|c| c.hydrologic_group.as_deref()));
            let capability =
                most_common(occurrences.iter().map(|c| c.capability_class.as_deref()));
            let slope = mean(group.occurrences.iter().filter_map(|c| c.slope));

            DominantSoil {
                name: group.name.to_string(),
                percentage: round_to(group.total / grand_total * 100.0, 1),
                description: describe(drainage, slope, hydrologic),
                drainage_class: drainage.map(str::to_string),
                hydrologic_group: hydrologic.map(str::to_string),
                capability_class: capability.map(str::to_string),
                prime_farmland: group
                    .occurrences
                    .iter()
                    .any(|c| important.contains(c.mukey.as_str())),
            }
        })
        .collect()
}

fn describe(drainage: Option<&str>, slope: Option<f64>, hydrologic: Option<&str>) -> String {
    let parts: Vec<String> = [
        drainage.map(str::to_string),
        slope.map(|s| slope_description(s).to_string()),
        hydrologic
            .and_then(infiltration_description)
            .map(|d| format!("{} infiltration", d)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "No descriptive data available".to_string()
    } else {
        parts.join(", ")
    }
}

/// Qualitative slope bucket for a slope in percent.
pub fn slope_description(slope: f64) -> &'static str {
    if slope < 3.0 {
        "nearly level"
    } else if slope < 8.0 {
        "gently sloping"
    } else if slope < 15.0 {
        "moderately sloping"
    } else {
        "steep"
    }
}

/// Infiltration description for a hydrologic group (dual groups use the drained class).
pub fn infiltration_description(group: &str) -> Option<&'static str> {
    match group.trim().chars().next()?.to_ascii_uppercase() {
        'A' => Some("high"),
        'B' => Some("moderate"),
        'C' => Some("slow"),
        'D' => Some("very slow"),
        _ => None,
    }
}

// ─── Suitability ─────────────────────────────────────────────────

/// Mean numeric capability class; a missing class counts as 8. `None` without components.
pub fn average_capability_class(components: &[SoilComponent]) -> Option<f64> {
    mean(components.iter().map(|c| {
        c.capability_number()
            .map(f64::from)
            .unwrap_or(WORST_CAPABILITY_CLASS)
    }))
}

/// Bucket an average capability class for one land use.
pub fn rate_suitability(land_use: LandUse, average_class: f64) -> SuitabilityRating {
    let [excellent, good, fair, poor] = land_use.thresholds();
    if average_class <= excellent {
        SuitabilityRating::Excellent
    } else if average_class <= good {
        SuitabilityRating::Good
    } else if average_class <= fair {
        SuitabilityRating::Fair
    } else if average_class <= poor {
        SuitabilityRating::Poor
    } else {
        SuitabilityRating::NotSuited
    }
}

pub fn land_use_suitability(components: &[SoilComponent]) -> LandUseSuitability {
    let Some(average) = average_capability_class(components) else {
        return LandUseSuitability::not_suited();
    };
    LandUseSuitability {
        cropland: rate_suitability(LandUse::Cropland, average),
        pasture: rate_suitability(LandUse::Pasture, average),
        woodland: rate_suitability(LandUse::Woodland, average),
        garden: rate_suitability(LandUse::Garden, average),
    }
}

// ─── Insights ────────────────────────────────────────────────────

fn is_poorly_drained(drainage: &str) -> bool {
    drainage.to_ascii_lowercase().contains("poorly")
}

fn is_well_drained(drainage: &str) -> bool {
    let drainage = drainage.to_ascii_lowercase();
    !drainage.contains("poorly")
        && (drainage.contains("well drained") || drainage.contains("excessively drained"))
}

/// Dual groups such as "B/D" behave as D when undrained.
fn is_group_d(group: &str) -> bool {
    group.trim().to_ascii_uppercase().ends_with('D')
}

/// Rule-based strengths, limitations and recommendations. Never empty.
pub fn generate_insights(
    components: &[SoilComponent],
    map_units: &[SoilMapUnit],
) -> Vec<SoilInsight> {
    let mut insights = Vec::new();
    let count = components.len() as f64;

    if !components.is_empty() {
        let poor = components
            .iter()
            .filter(|c| c.drainage_class.as_deref().is_some_and(is_poorly_drained))
            .count() as f64
            / count;
        if poor > POOR_DRAINAGE_THRESHOLD {
            insights.push(SoilInsight {
                kind: InsightKind::Limitation,
                category: "drainage".to_string(),
                title: "Drainage limitations".to_string(),
                description: format!(
                    "{:.0}% of soil components are poorly drained. Expect wet spring \
                     conditions; consider tile drainage or water-tolerant plantings.",
                    poor * 100.0
                ),
                severity: Some(if poor > 0.5 {
                    Severity::High
                } else {
                    Severity::Medium
                }),
            });
        }
    }

    let classes: Vec<String> = components
        .iter()
        .filter_map(|c| c.capability_class.as_deref())
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    if !classes.is_empty() {
        let productive = classes
            .iter()
            .filter(|c| PRODUCTIVE_CLASSES.contains(&c.as_str()))
            .count() as f64
            / classes.len() as f64;
        if productive > PRODUCTIVE_THRESHOLD {
            insights.push(SoilInsight {
                kind: InsightKind::Strength,
                category: "productivity".to_string(),
                title: "Highly productive soils".to_string(),
                description: format!(
                    "{:.0}% of rated soils are capability class 1 or 2, with few \
                     limitations for cultivation.",
                    productive * 100.0
                ),
                severity: None,
            });
        }
    }

    let farmland = map_units
        .iter()
        .filter(|u| u.is_important_farmland())
        .count();
    if farmland > 0 {
        insights.push(SoilInsight {
            kind: InsightKind::Strength,
            category: "farmland".to_string(),
            title: "Important farmland".to_string(),
            description: format!(
                "{} of {} map units are classified as prime farmland or farmland of \
                 statewide importance.",
                farmland,
                map_units.len()
            ),
            severity: None,
        });
    }

    if let Some(slope) = mean(components.iter().filter_map(|c| c.slope)) {
        if slope > EROSION_SLOPE {
            insights.push(SoilInsight {
                kind: InsightKind::Limitation,
                category: "erosion".to_string(),
                title: "Erosion risk".to_string(),
                description: format!(
                    "Average slope is {:.1}%. Use contour planting, cover crops, or \
                     permanent vegetation on the steepest ground.",
                    slope
                ),
                severity: Some(if slope > SEVERE_EROSION_SLOPE {
                    Severity::High
                } else {
                    Severity::Medium
                }),
            });
        }
    }

    if !components.is_empty() {
        let group_d = components
            .iter()
            .filter(|c| c.hydrologic_group.as_deref().is_some_and(is_group_d))
            .count() as f64
            / count;
        if group_d > GROUP_D_THRESHOLD {
            insights.push(SoilInsight {
                kind: InsightKind::Recommendation,
                category: "water_management".to_string(),
                title: "Plan for runoff".to_string(),
                description: format!(
                    "{:.0}% of soil components have very slow infiltration (hydrologic \
                     group D). Swales, rain gardens, or grassed waterways will help \
                     manage runoff.",
                    group_d * 100.0
                ),
                severity: None,
            });
        }
    }

    if insights.is_empty() {
        insights.push(SoilInsight {
            kind: InsightKind::Recommendation,
            category: "general".to_string(),
            title: "Soil testing recommended".to_string(),
            description: "No major strengths or limitations stand out in the survey data. \
                          A soil test will give pH and nutrient levels for your specific site."
                .to_string(),
            severity: None,
        });
    }

    insights
}

// ─── Zones ───────────────────────────────────────────────────────

/// Partition dominant soils into a crop zone and a wetland buffer zone.
pub fn recommended_zones(dominant: &[DominantSoil]) -> Vec<RecommendedZone> {
    let zone = |name: &str, purpose: &str, soils: Vec<&DominantSoil>| RecommendedZone {
        name: name.to_string(),
        purpose: purpose.to_string(),
        percentage: round_to(soils.iter().map(|s| s.percentage).sum(), 1),
        soils: soils.into_iter().map(|s| s.name.clone()).collect(),
    };

    let drainage = |s: &&DominantSoil| s.drainage_class.clone().unwrap_or_default();
    let well: Vec<&DominantSoil> = dominant
        .iter()
        .filter(|s| is_well_drained(&drainage(s)))
        .collect();
    let poor: Vec<&DominantSoil> = dominant
        .iter()
        .filter(|s| is_poorly_drained(&drainage(s)))
        .collect();

    let mut zones = Vec::new();
    if !well.is_empty() {
        zones.push(zone(
            "Crop production zone",
            "Well-drained soils suited to row crops, vegetable gardens, and orchards.",
            well,
        ));
    }
    if !poor.is_empty() {
        zones.push(zone(
            "Wetland buffer zone",
            "Poorly drained soils best kept in pasture, water-tolerant plantings, or \
             conservation buffers.",
            poor,
        ));
    }
    if zones.is_empty() {
        let prime: Vec<&DominantSoil> = dominant.iter().filter(|s| s.prime_farmland).collect();
        if !prime.is_empty() {
            zones.push(zone(
                "Agricultural zone",
                "Prime farmland soils suited to general agricultural use.",
                prime,
            ));
        }
    }
    zones
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Most frequent present value; ties go to the value seen first.
fn most_common<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values.flatten() {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (v, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((v, n)),
        })
        .map(|(v, _)| v)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
