// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Joining crop records onto boundaries.
//!
//! [`render`] is a pure function: given the loaded records, a freshly fetched
//! boundary document and the current UI selection it produces the complete
//! [`Overlay`] to draw. Nothing here touches the window or the network.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, FeatureCollection, Geometry, PolygonMesh};
use crate::records::{CropRecord, Metric};
use crate::scale::{Legend, Rgb, ValueRange};

/// Feature removed from every boundary document before joining.
pub const EXCLUDED_FEATURE: &str = "Antarctica";

/// Popup placeholder for features without a joined value.
pub const NO_DATA_TEXT: &str = "No data";

/// How multiple qualifying records for one region are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// The record appearing last in the CSV wins.
    #[default]
    LastWins,
    /// Arithmetic mean of all qualifying records.
    Mean,
}

/// The UI selection a redraw is rendered for.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub year: i32,
    pub metric: Metric,
    /// Restrict to one crop; `None` uses every record.
    pub crop: Option<String>,
    pub join: JoinMode,
}

impl RenderState {
    #[must_use]
    pub fn new(year: i32, metric: Metric) -> Self {
        Self {
            year,
            metric,
            crop: None,
            join: JoinMode::default(),
        }
    }

    fn matches_crop(&self, record: &CropRecord) -> bool {
        self.crop
            .as_deref()
            .is_none_or(|crop| record.crop.as_deref() == Some(crop))
    }
}

/// Region name to joined metric value, for one year.
pub type RegionMetricMap = HashMap<String, f64>;

#[derive(Debug, Default, Clone, Copy)]
struct JoinAccumulator {
    last: f64,
    sum: f64,
    count: u32,
}

impl JoinAccumulator {
    fn push(&mut self, value: f64) {
        self.last = value;
        self.sum += value;
        self.count += 1;
    }

    fn finish(self, mode: JoinMode) -> f64 {
        match mode {
            JoinMode::LastWins => self.last,
            JoinMode::Mean => self.sum / f64::from(self.count),
        }
    }
}

/// Build the region to value map for the selected year, metric and crop.
///
/// Records whose metric value is `NaN` never enter the map.
#[must_use]
pub fn region_metric_map(records: &[CropRecord], state: &RenderState) -> RegionMetricMap {
    let mut accumulators: HashMap<&str, JoinAccumulator> = HashMap::new();

    for record in records
        .iter()
        .filter(|r| r.year == state.year && state.matches_crop(r))
    {
        let value = record.value(state.metric);
        if !value.is_nan() {
            accumulators.entry(&record.region).or_default().push(value);
        }
    }

    accumulators
        .into_iter()
        .map(|(region, acc)| (region.to_string(), acc.finish(state.join)))
        .collect()
}

/// Per-year values of one region, oldest first, joined the same way as the map.
#[must_use]
pub fn region_series(
    records: &[CropRecord],
    region: &str,
    state: &RenderState,
) -> Vec<(i32, f64)> {
    let mut by_year: BTreeMap<i32, JoinAccumulator> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| r.region == region && state.matches_crop(r))
    {
        let value = record.value(state.metric);
        if !value.is_nan() {
            by_year.entry(record.year).or_default().push(value);
        }
    }

    by_year
        .into_iter()
        .map(|(year, acc)| (year, acc.finish(state.join)))
        .collect()
}

/// Line and fill style of a drawn feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub fill: Rgb,
    pub fill_opacity: f32,
    pub stroke: Rgb,
    pub weight: f32,
}

impl FeatureStyle {
    pub const STROKE: Rgb = Rgb::new(0, 0, 0);
    pub const WEIGHT: f32 = 1.0;
    pub const FILL_OPACITY: f32 = 0.8;

    #[must_use]
    pub fn with_fill(fill: Rgb) -> Self {
        Self {
            fill,
            fill_opacity: Self::FILL_OPACITY,
            stroke: Self::STROKE,
            weight: Self::WEIGHT,
        }
    }
}

/// Popup content of a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    /// The region name, shown in bold.
    pub title: String,
    /// `"{metric label}: {value}"`, or `"{metric label}: No data"`.
    pub body: String,
}

impl Popup {
    #[must_use]
    pub fn new(region: &str, metric: Metric, value: Option<f64>) -> Self {
        let body = match value {
            Some(value) => format!("{}: {}", metric.label(), value),
            None => format!("{}: {}", metric.label(), NO_DATA_TEXT),
        };
        Self {
            title: region.to_string(),
            body,
        }
    }
}

/// A boundary feature ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledFeature {
    pub name: String,
    pub value: Option<f64>,
    pub style: FeatureStyle,
    pub popup: Popup,
    pub mesh: PolygonMesh,
    pub bounds: Option<BoundingBox>,
}

/// Headline numbers for the current map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSummary {
    /// Regions in the joined data for this year.
    pub regions_with_data: usize,
    /// Boundary features that found a value.
    pub features_matched: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Everything drawn for one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub year: i32,
    pub metric: Metric,
    pub range: ValueRange,
    pub features: Vec<StyledFeature>,
    /// Combined extent of every drawable feature.
    pub bounds: Option<BoundingBox>,
    pub legend: Legend,
    pub summary: MapSummary,
}

impl Overlay {
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&StyledFeature> {
        self.features.iter().find(|f| f.name == name)
    }
}

/// Render the overlay for `state`.
///
/// Removes Antarctica, joins the records by exact, case-sensitive region name,
/// shades each feature and attaches a popup to every one of them, matched or
/// not.
#[must_use]
pub fn render(
    records: &[CropRecord],
    mut boundaries: FeatureCollection,
    state: &RenderState,
) -> Overlay {
    boundaries.remove_named(EXCLUDED_FEATURE);

    let values = region_metric_map(records, state);
    let range = ValueRange::from_values(values.values().copied());

    let features: Vec<StyledFeature> = boundaries
        .features
        .into_iter()
        .map(|feature| {
            let name = feature.name().to_string();
            let value = values.get(&name).copied();
            let (mesh, bounds) = feature
                .geometry
                .as_ref()
                .map_or((PolygonMesh::default(), None), |geometry: &Geometry| {
                    (PolygonMesh::from_geometry(geometry), geometry.bounding_box())
                });

            StyledFeature {
                popup: Popup::new(&name, state.metric, value),
                style: FeatureStyle::with_fill(range.color_for(value)),
                name,
                value,
                mesh,
                bounds,
            }
        })
        .collect();

    let bounds = features
        .iter()
        .filter_map(|f| f.bounds)
        .reduce(|a, b| a.union(&b));

    let features_matched = features.iter().filter(|f| f.value.is_some()).count();
    #[allow(clippy::cast_precision_loss, reason = "region counts are tiny")]
    let mean = values.values().sum::<f64>() / values.len() as f64;

    debug!(
        "Rendered {} features for {} {} ({} matched, {} regions with data)",
        features.len(),
        state.metric,
        state.year,
        features_matched,
        values.len()
    );

    Overlay {
        year: state.year,
        metric: state.metric,
        range,
        legend: Legend::for_range(&range),
        summary: MapSummary {
            regions_with_data: values.len(),
            features_matched,
            min: range.min,
            max: range.max,
            mean,
        },
        features,
        bounds,
    }
}
