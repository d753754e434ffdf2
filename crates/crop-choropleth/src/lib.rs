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

//! Choropleth core for crop yield and climate data.
//!
//! This library holds everything behind the Crop Atlas map that does not need
//! a window: loading crop records from CSV, parsing country boundaries from
//! GeoJSON, joining the two by region name for a selected year, and shading
//! each country with a fixed five-bucket color scale. It is split into layers
//! that can be used independently:
//!
//! - **Records**: header-driven CSV loading into [`CropRecord`]s
//! - **Geometry**: GeoJSON boundaries, bounding boxes, tessellation and hit testing
//! - **Render**: the pure [`render`] function that turns records + boundaries
//!   into a styled [`Overlay`]
//! - **Controller**: [`RedrawController`], the view-model that owns the records
//!   and the single live overlay across redraws
//! - **Viewport**: Web Mercator math for fitting and clamping the camera
//!
//! # Quick Start
//!
//! ```
//! use crop_choropleth::{render, FeatureCollection, Metric, RenderState, load_records};
//!
//! let csv = "region,year,yield_hg_ha,yield_t_ha,rainfall_mm,avg_temp_c,pesticide_t\n\
//!            Kenya,2005,18000,1.8,630,24.1,120\n";
//! let records = load_records(csv.as_bytes()).unwrap();
//!
//! let geojson = br#"{"type":"FeatureCollection","features":[
//!     {"type":"Feature","properties":{"name":"Kenya"},
//!      "geometry":{"type":"Polygon","coordinates":[[[34,-4],[41,-4],[41,4],[34,4],[34,-4]]]}}
//! ]}"#;
//! let boundaries = FeatureCollection::from_slice(geojson).unwrap();
//!
//! let overlay = render(&records, boundaries, &RenderState::new(2005, Metric::RainfallMm));
//! assert_eq!(overlay.features[0].popup.body, "Rainfall (mm): 630");
//! ```

pub mod controller;
pub mod geometry;
pub mod records;
pub mod render;
pub mod scale;
pub mod source;
pub mod timeline;
pub mod viewport;

pub use controller::{RedrawController, RedrawOutcome, RedrawTicket};
pub use geometry::{
    fetch_boundaries, BoundaryError, BoundingBox, Feature, FeatureCollection, Geometry, LonLat,
    PolygonMesh,
};
pub use records::{
    crops, fetch_records, load_records, load_records_from_bytes, load_records_from_path,
    year_range, years_for, CropRecord, LoadError, Metric,
};
pub use render::{
    region_metric_map, region_series, render, FeatureStyle, JoinMode, MapSummary, Overlay, Popup,
    RegionMetricMap, RenderState, StyledFeature, EXCLUDED_FEATURE,
};
pub use scale::{Legend, LegendEntry, Rgb, ValueRange, BUCKET_COLORS, NO_DATA_COLOR};
pub use source::{FetchError, ResourceLocation};
pub use timeline::Timeline;
pub use viewport::{fit_bounds, CameraFit, ViewportLimits, WebMercator};
