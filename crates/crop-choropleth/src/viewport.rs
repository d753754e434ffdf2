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

//! Web Mercator camera math.
//!
//! Fitting the camera to an overlay and keeping it inside the map's max
//! bounds are done here in tile-pixel space, independent of the map widget.

use crate::geometry::{BoundingBox, LonLat};

/// Edge length of one map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert longitude to Web Mercator X in tile units at `zoom`
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
        ((lon + 180.0) / 360.0) * zoom.exp2()
    }

    /// Convert latitude to Web Mercator Y in tile units at `zoom`
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * zoom.exp2()
    }

    /// Convert tile X back to longitude
    #[must_use]
    pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
        x / zoom.exp2() * 360.0 - 180.0
    }

    /// Convert tile Y back to latitude
    #[must_use]
    pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
        let n = zoom.exp2();
        (std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
    }

    /// Project to the unit square (zoom 0, one tile of size 1).
    #[must_use]
    pub fn unit(point: LonLat) -> (f64, f64) {
        (Self::lon_to_x(point.lon, 0.0), Self::lat_to_y(point.lat, 0.0))
    }

    /// Project to pixels at `zoom`.
    #[must_use]
    pub fn pixel(point: LonLat, zoom: f64) -> (f64, f64) {
        (
            Self::lon_to_x(point.lon, zoom) * TILE_SIZE,
            Self::lat_to_y(point.lat, zoom) * TILE_SIZE,
        )
    }

    /// Inverse of [`WebMercator::pixel`].
    #[must_use]
    pub fn unpixel(x: f64, y: f64, zoom: f64) -> LonLat {
        LonLat::new(
            Self::x_to_lon(x / TILE_SIZE, zoom),
            Self::y_to_lat(y / TILE_SIZE, zoom),
        )
    }
}

/// Camera position produced by [`fit_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub center: LonLat,
    pub zoom: f64,
}

/// Zoom range and rigid panning limits of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub max_bounds: BoundingBox,
}

impl ViewportLimits {
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Keep the viewport inside `max_bounds`.
    ///
    /// On each axis where the viewport is larger than the bounds the camera is
    /// centered on the bounds instead.
    #[must_use]
    pub fn clamp_center(&self, center: LonLat, zoom: f64, viewport: (f64, f64)) -> LonLat {
        let (west, north) = WebMercator::pixel(
            LonLat::new(self.max_bounds.west, self.max_bounds.north),
            zoom,
        );
        let (east, south) = WebMercator::pixel(
            LonLat::new(self.max_bounds.east, self.max_bounds.south),
            zoom,
        );
        let (x, y) = WebMercator::pixel(center, zoom);

        let x = clamp_axis(x, west, east, viewport.0 / 2.0);
        let y = clamp_axis(y, north, south, viewport.1 / 2.0);

        WebMercator::unpixel(x, y, zoom)
    }
}

fn clamp_axis(value: f64, low: f64, high: f64, half_extent: f64) -> f64 {
    if high - low <= half_extent * 2.0 {
        (low + high) / 2.0
    } else {
        value.clamp(low + half_extent, high - half_extent)
    }
}

/// Fit the camera to `bounds` inside a viewport of `viewport` pixels.
///
/// The zoom is the largest whole level at which the padded box still fits,
/// capped at `fit_max_zoom` and then clamped to `limits`. The center is the
/// midpoint of the box in projected space.
#[must_use]
pub fn fit_bounds(
    bounds: &BoundingBox,
    viewport: (f64, f64),
    padding: f64,
    fit_max_zoom: f64,
    limits: &ViewportLimits,
) -> CameraFit {
    let (x0, y0) = WebMercator::unit(LonLat::new(bounds.west, bounds.north));
    let (x1, y1) = WebMercator::unit(LonLat::new(bounds.east, bounds.south));

    let width = (x1 - x0).abs() * TILE_SIZE;
    let height = (y1 - y0).abs() * TILE_SIZE;

    let available_width = (viewport.0 - padding * 2.0).max(1.0);
    let available_height = (viewport.1 - padding * 2.0).max(1.0);

    let scale = (available_width / width).min(available_height / height);
    // Round away float noise before snapping down to a whole level.
    let zoom = ((scale.log2() * 100.0).round() / 100.0).floor();
    let zoom = limits.clamp_zoom(zoom).min(fit_max_zoom);

    let center_x = (x0 + x1) / 2.0;
    let center_y = (y0 + y1) / 2.0;
    let center = LonLat::new(
        WebMercator::x_to_lon(center_x, 0.0),
        WebMercator::y_to_lat(center_y, 0.0),
    );

    CameraFit { center, zoom }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_limits() -> ViewportLimits {
        ViewportLimits {
            min_zoom: 2.0,
            max_zoom: 5.0,
            max_bounds: BoundingBox {
                west: -180.0,
                south: -60.0,
                east: 180.0,
                north: 85.0,
            },
        }
    }

    #[test]
    fn test_projection_round_trip() {
        let point = LonLat::new(-118.4081, 33.9425);
        let (x, y) = WebMercator::pixel(point, 3.0);
        let back = WebMercator::unpixel(x, y, 3.0);
        assert!((back.lon - point.lon).abs() < 1e-9);
        assert!((back.lat - point.lat).abs() < 1e-9);
    }

    #[test]
    fn test_unit_square_corners() {
        let (x, y) = WebMercator::unit(LonLat::new(0.0, 0.0));
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);

        let (x, _) = WebMercator::unit(LonLat::new(-180.0, 0.0));
        assert!(x.abs() < 1e-12);
    }

    #[test]
    fn test_fit_world_bounds() {
        // Countries without Antarctica span roughly this box.
        let bounds = BoundingBox {
            west: -180.0,
            south: -55.6,
            east: 180.0,
            north: 83.6,
        };
        let fit = fit_bounds(&bounds, (1400.0, 800.0), 20.0, 4.0, &world_limits());

        // At zoom 3 the box is 2048 px wide, more than the padded 1360 px.
        assert_eq!(fit.zoom, 2.0);
        assert!(fit.center.lon.abs() < 1e-9);
    }

    #[test]
    fn test_fit_small_country_capped_at_max_zoom() {
        let bounds = BoundingBox {
            west: 5.9,
            south: 45.8,
            east: 10.5,
            north: 47.8,
        };
        let fit = fit_bounds(&bounds, (1400.0, 800.0), 20.0, 4.0, &world_limits());

        assert_eq!(fit.zoom, 4.0);
        assert!(fit.center.lon > 5.9 && fit.center.lon < 10.5);
        assert!(fit.center.lat > 45.8 && fit.center.lat < 47.8);
    }

    #[test]
    fn test_fit_single_point() {
        let bounds = BoundingBox::from_point(LonLat::new(10.0, 10.0));
        let fit = fit_bounds(&bounds, (800.0, 600.0), 20.0, 4.0, &world_limits());
        assert_eq!(fit.zoom, 4.0);
        assert!((fit.center.lon - 10.0).abs() < 1e-9);
        assert!((fit.center.lat - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_respects_min_zoom() {
        let bounds = BoundingBox {
            west: -180.0,
            south: -60.0,
            east: 180.0,
            north: 85.0,
        };
        let fit = fit_bounds(&bounds, (300.0, 200.0), 20.0, 4.0, &world_limits());
        assert_eq!(fit.zoom, 2.0);
    }

    #[test]
    fn test_clamp_center_keeps_viewport_inside() {
        let limits = world_limits();
        // At zoom 4 the world is 4096 px wide; a 1000 px viewport may not
        // center closer than 500 px to the western edge.
        let clamped = limits.clamp_center(LonLat::new(-179.0, 0.0), 4.0, (1000.0, 600.0));
        let (x, _) = WebMercator::pixel(clamped, 4.0);
        assert!((x - 500.0).abs() < 1e-6);

        let inside = LonLat::new(10.0, 20.0);
        let unchanged = limits.clamp_center(inside, 4.0, (1000.0, 600.0));
        assert!((unchanged.lon - inside.lon).abs() < 1e-9);
        assert!((unchanged.lat - inside.lat).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_center_centers_when_viewport_larger() {
        let limits = world_limits();
        // At zoom 2 the world is 1024 px wide, narrower than the viewport.
        let clamped = limits.clamp_center(LonLat::new(90.0, 0.0), 2.0, (1400.0, 800.0));
        assert!(clamped.lon.abs() < 1e-9);
    }

    #[test]
    fn test_clamp_zoom() {
        let limits = world_limits();
        assert_eq!(limits.clamp_zoom(1.0), 2.0);
        assert_eq!(limits.clamp_zoom(3.5), 3.5);
        assert_eq!(limits.clamp_zoom(9.0), 5.0);
    }
}
