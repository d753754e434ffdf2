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

//! Five-bucket color scale.

use std::fmt;

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Lightest to darkest (YlGnBu).
pub const BUCKET_COLORS: [Rgb; 5] = [
    Rgb::new(0xff, 0xff, 0xcc),
    Rgb::new(0xa1, 0xda, 0xb4),
    Rgb::new(0x41, 0xb6, 0xc4),
    Rgb::new(0x2c, 0x7f, 0xb8),
    Rgb::new(0x25, 0x34, 0x94),
];

/// Upper (exclusive) edge of every bucket but the last.
pub const BUCKET_THRESHOLDS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

/// Fill for features with no joined value.
pub const NO_DATA_COLOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

/// Bucket for a normalized value.
///
/// Comparisons are strict, so a value sitting on a threshold falls into the
/// next bucket up. Anything failing every comparison, including `NaN`, lands
/// in the darkest bucket.
#[must_use]
pub fn bucket_index(percent: f64) -> usize {
    BUCKET_THRESHOLDS
        .iter()
        .position(|&threshold| percent < threshold)
        .unwrap_or(BUCKET_COLORS.len() - 1)
}

/// Min and max of the joined values. Both are `NaN` when nothing joined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const EMPTY: ValueRange = ValueRange {
        min: f64::NAN,
        max: f64::NAN,
    };

    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        values.into_iter().fold(Self::EMPTY, |range, value| {
            if range.is_empty() {
                ValueRange { min: value, max: value }
            } else {
                ValueRange {
                    min: range.min.min(value),
                    max: range.max.max(value),
                }
            }
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.is_nan() || self.max.is_nan()
    }

    /// `(value - min) / (max - min)`. `NaN` when the range is a single value.
    #[must_use]
    pub fn percent(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    /// Fill color for a joined value, or the no-data color.
    #[must_use]
    pub fn color_for(&self, value: Option<f64>) -> Rgb {
        match value {
            Some(value) => BUCKET_COLORS[bucket_index(self.percent(value))],
            None => NO_DATA_COLOR,
        }
    }
}

/// One swatch of the map legend, in data units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub color: Rgb,
    pub lower: f64,
    pub upper: f64,
}

/// Legend for the current range: five buckets, lightest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub no_data: Rgb,
}

impl Legend {
    #[must_use]
    pub fn for_range(range: &ValueRange) -> Self {
        let span = range.max - range.min;
        let edge = |i: usize| match i {
            0 => range.min,
            i if i >= BUCKET_COLORS.len() => range.max,
            i => range.min + BUCKET_THRESHOLDS[i - 1] * span,
        };

        let entries = BUCKET_COLORS
            .iter()
            .enumerate()
            .map(|(i, &color)| LegendEntry {
                color,
                lower: edge(i),
                upper: edge(i + 1),
            })
            .collect();

        Self {
            entries,
            no_data: NO_DATA_COLOR,
        }
    }
}
