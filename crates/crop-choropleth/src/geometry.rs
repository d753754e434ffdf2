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

//! Country boundaries.
//!
//! Parses the GeoJSON `FeatureCollection` that supplies country polygons and
//! prepares each feature for drawing: bounding boxes for camera fitting,
//! earcut tessellation for filling concave outlines, and even-odd hit testing
//! for popups.

use std::ops::Range;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::source::{FetchError, ResourceLocation};
use crate::viewport::WebMercator;

/// Errors that can occur while loading the boundary document.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("failed to fetch boundaries: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A GeoJSON position. Any altitude element is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl TryFrom<Vec<f64>> for LonLat {
    type Error = String;

    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(format!("position needs at least 2 elements, got {}", position.len())),
        }
    }
}

/// A linear ring; the first and last positions are normally equal.
pub type Ring = Vec<LonLat>;

/// Supported GeoJSON geometries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    /// Points, lines and collections. Kept so the feature still gets a popup,
    /// but nothing is drawn.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Each polygon as a slice of rings, outer ring first.
    #[must_use]
    pub fn polygons(&self) -> Vec<&[Ring]> {
        match self {
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(Vec::as_slice).collect()
            }
            Geometry::Unsupported => Vec::new(),
        }
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.polygons()
            .into_iter()
            .flatten()
            .flatten()
            .fold(None, |bbox: Option<BoundingBox>, point| {
                Some(match bbox {
                    Some(mut bbox) => {
                        bbox.extend(*point);
                        bbox
                    }
                    None => BoundingBox::from_point(*point),
                })
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub name: Option<String>,
}

/// One named region of the boundary document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<FeatureProperties>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// The `properties.name` join key, or `""` when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("")
    }
}

/// The boundary document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Drop every feature whose name equals `name` exactly. Returns how many
    /// were removed.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.features.len();
        self.features.retain(|feature| feature.name() != name);
        before - self.features.len()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref()?.bounding_box())
            .reduce(|a, b| a.union(&b))
    }
}

/// Fetch and parse the boundary document. Never cached.
pub async fn fetch_boundaries(
    location: &ResourceLocation,
    client: &reqwest::Client,
) -> Result<FeatureCollection, BoundaryError> {
    let bytes = location.read(client).await?;
    let collection = FeatureCollection::from_slice(&bytes)?;
    info!(
        "Fetched {} boundary features from {location}",
        collection.features.len()
    );
    Ok(collection)
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn from_point(point: LonLat) -> Self {
        Self {
            west: point.lon,
            south: point.lat,
            east: point.lon,
            north: point.lat,
        }
    }

    pub fn extend(&mut self, point: LonLat) {
        self.west = self.west.min(point.lon);
        self.south = self.south.min(point.lat);
        self.east = self.east.max(point.lon);
        self.north = self.north.max(point.lat);
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }
}

/// Triangulated fill and outline rings for one feature.
///
/// `vertices` are geographic; `indices` form triangles (three per triangle)
/// computed in Web Mercator space so they stay valid after projection.
/// `rings` index into `vertices` and are used for outlines and hit testing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    pub vertices: Vec<LonLat>,
    pub indices: Vec<u32>,
    pub rings: Vec<Range<usize>>,
}

impl PolygonMesh {
    /// Tessellate every polygon of `geometry`.
    #[must_use]
    pub fn from_geometry(geometry: &Geometry) -> Self {
        let mut mesh = Self::default();
        for polygon in geometry.polygons() {
            mesh.push_polygon(polygon);
        }
        mesh
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn push_polygon(&mut self, rings: &[Ring]) {
        let base = self.vertices.len();
        let mut coords = Vec::new();
        let mut holes = Vec::new();

        for (ring_index, ring) in rings.iter().enumerate() {
            let points = open_ring(ring);
            if points.len() < 3 {
                if ring_index == 0 {
                    // Degenerate outer ring: the whole polygon is unusable.
                    return;
                }
                continue;
            }

            let start = self.vertices.len();
            if ring_index > 0 {
                holes.push(start - base);
            }

            for point in points {
                let (x, y) = WebMercator::unit(*point);
                coords.push(x);
                coords.push(y);
                self.vertices.push(*point);
            }
            self.rings.push(start..self.vertices.len());
        }

        match earcutr::earcut(&coords, &holes, 2) {
            Ok(indices) => {
                #[allow(clippy::cast_possible_truncation, reason = "country meshes stay far below u32::MAX vertices")]
                let to_mesh_index = |i: usize| (base + i) as u32;
                self.indices.extend(indices.into_iter().map(to_mesh_index));
            }
            Err(e) => warn!("Failed to tessellate polygon: {e:?}"),
        }
    }

    /// Even-odd containment test over all rings.
    ///
    /// `vertex` maps a vertex index to the coordinates the test runs in, so
    /// the same mesh can be hit-tested geographically or in screen space.
    pub fn contains(&self, target: (f64, f64), vertex: impl Fn(usize) -> (f64, f64)) -> bool {
        let (tx, ty) = target;
        let mut inside = false;

        for ring in &self.rings {
            let mut previous = ring.end - 1;
            for current in ring.clone() {
                let (xi, yi) = vertex(current);
                let (xj, yj) = vertex(previous);
                if (yi > ty) != (yj > ty) && tx < (xj - xi) * (ty - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                previous = current;
            }
        }

        inside
    }
}

/// The ring without its closing duplicate, if any.
fn open_ring(ring: &[LonLat]) -> &[LonLat] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}
