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

//! Crop record loading.
//!
//! Records come from a header-driven CSV with one row per region, year and
//! (optionally) crop. Numeric cells that do not parse become `NaN` and later
//! surface as "No data"; only rows without a region or with a non-integer
//! year are dropped.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::{FetchError, ResourceLocation};

/// Errors that can occur while loading crop records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open crop data: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable CSV header: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to fetch crop data: {0}")]
    Fetch(#[from] FetchError),
}

/// One row of crop data.
///
/// `region` is never empty. Numeric fields may be `NaN` when the source cell
/// was blank or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRecord {
    pub region: String,
    pub crop: Option<String>,
    pub year: i32,
    pub yield_hg_ha: f64,
    pub yield_t_ha: f64,
    pub rainfall_mm: f64,
    pub avg_temp_c: f64,
    pub pesticide_t: f64,
}

impl CropRecord {
    /// Value of the given metric for this record.
    #[must_use]
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::YieldHgHa => self.yield_hg_ha,
            Metric::YieldTHa => self.yield_t_ha,
            Metric::RainfallMm => self.rainfall_mm,
            Metric::AvgTempC => self.avg_temp_c,
            Metric::PesticideT => self.pesticide_t,
        }
    }
}

/// The numeric columns of a [`CropRecord`] that can drive the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    YieldHgHa,
    #[default]
    YieldTHa,
    RainfallMm,
    AvgTempC,
    PesticideT,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::YieldHgHa,
        Metric::YieldTHa,
        Metric::RainfallMm,
        Metric::AvgTempC,
        Metric::PesticideT,
    ];

    /// CSV column name, also used on the command line and in the config file.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Metric::YieldHgHa => "yield_hg_ha",
            Metric::YieldTHa => "yield_t_ha",
            Metric::RainfallMm => "rainfall_mm",
            Metric::AvgTempC => "avg_temp_c",
            Metric::PesticideT => "pesticide_t",
        }
    }

    /// Human-readable label shown in the selector and popups.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Metric::YieldHgHa => "Yield (hg/ha)",
            Metric::YieldTHa => "Yield (t/ha)",
            Metric::RainfallMm => "Rainfall (mm)",
            Metric::AvgTempC => "Avg Temperature (°C)",
            Metric::PesticideT => "Pesticides (t)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.key() == s.trim())
            .ok_or_else(|| {
                let keys: Vec<&str> = Metric::ALL.iter().map(|m| m.key()).collect();
                format!("unknown metric '{s}', expected one of: {}", keys.join(", "))
            })
    }
}

/// A CSV row before validation. Every column is optional so that missing
/// columns and short rows still deserialize.
#[derive(Debug, Default, Deserialize)]
struct RawRow {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    crop: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    yield_hg_ha: Option<String>,
    #[serde(default)]
    yield_t_ha: Option<String>,
    #[serde(default)]
    rainfall_mm: Option<String>,
    #[serde(default)]
    avg_temp_c: Option<String>,
    #[serde(default)]
    pesticide_t: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Option<CropRecord> {
        let region = self.region.filter(|r| !r.is_empty())?;
        let year = parse_year(self.year.as_deref()?)?;

        Some(CropRecord {
            region,
            crop: self.crop.filter(|c| !c.is_empty()),
            year,
            yield_hg_ha: parse_number(self.yield_hg_ha.as_deref()),
            yield_t_ha: parse_number(self.yield_t_ha.as_deref()),
            rainfall_mm: parse_number(self.rainfall_mm.as_deref()),
            avg_temp_c: parse_number(self.avg_temp_c.as_deref()),
            pesticide_t: parse_number(self.pesticide_t.as_deref()),
        })
    }
}

/// Length of the leading `[+-]digits` run of `s`, or 0 when there are no digits.
fn integer_prefix_len(s: &[u8]) -> usize {
    let sign = usize::from(matches!(s.first(), Some(b'+' | b'-')));
    let digits = s[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        0
    } else {
        sign + digits
    }
}

/// Longest leading decimal literal of `s`: sign, digits, optional fraction and
/// exponent. Trailing text such as units is ignored. Words like `inf` or `nan`
/// never form a prefix.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let count_digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let int_digits = count_digits(sign);
    let mut end = sign + int_digits;
    let mut mantissa_digits = int_digits;

    if bytes.get(end) == Some(&b'.') {
        let frac_digits = count_digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
            mantissa_digits += frac_digits;
        }
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exponent = integer_prefix_len(&bytes[end + 1..]);
        if exponent > 0 {
            end += 1 + exponent;
        }
    }
    &s[..end]
}

/// Leading numeric value of a cell, `NaN` when there is none or it overflows.
fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| numeric_prefix(s.trim()).parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(f64::NAN)
}

/// Leading integer of the cell, so `2005.0` and `2005.5` both read as 2005.
fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    trimmed[..integer_prefix_len(trimmed.as_bytes())].parse().ok()
}

/// Load crop records from any CSV reader.
///
/// The header row is required. Body rows the CSV reader cannot decode are
/// skipped with a warning; rows without a region or a valid year are dropped.
pub fn load_records<R: Read>(reader: R) -> Result<Vec<CropRecord>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Fail early on an unreadable header rather than dropping every row.
    csv_reader.headers()?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, result) in csv_reader.deserialize::<RawRow>().enumerate() {
        match result {
            Ok(raw) => match raw.into_record() {
                Some(record) => records.push(record),
                None => dropped += 1,
            },
            Err(e) => {
                // +2: one for the header, one for 1-based line numbers
                warn!("Skipping unreadable CSV row {}: {}", index + 2, e);
                dropped += 1;
            }
        }
    }

    info!("Loaded {} crop records ({} rows dropped)", records.len(), dropped);
    Ok(records)
}

/// Load crop records from an in-memory CSV document.
pub fn load_records_from_bytes(bytes: &[u8]) -> Result<Vec<CropRecord>, LoadError> {
    load_records(bytes)
}

/// Load crop records from a CSV file on disk.
pub fn load_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CropRecord>, LoadError> {
    let file = File::open(path)?;
    load_records(BufReader::new(file))
}

/// Fetch and parse crop records from a local or remote location.
pub async fn fetch_records(
    location: &ResourceLocation,
    client: &reqwest::Client,
) -> Result<Vec<CropRecord>, LoadError> {
    info!("Loading crop data from {location}");
    let bytes = location.read(client).await?;
    load_records_from_bytes(&bytes)
}

/// Earliest and latest year present, for the year slider bounds.
#[must_use]
pub fn year_range(records: &[CropRecord]) -> Option<(i32, i32)> {
    let min = records.iter().map(|r| r.year).min()?;
    let max = records.iter().map(|r| r.year).max()?;
    Some((min, max))
}

/// Sorted, distinct crop names. Empty when the data has no crop column.
#[must_use]
pub fn crops(records: &[CropRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.crop.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted, distinct years, optionally restricted to one crop.
#[must_use]
pub fn years_for(records: &[CropRecord], crop: Option<&str>) -> Vec<i32> {
    records
        .iter()
        .filter(|r| crop.is_none_or(|c| r.crop.as_deref() == Some(c)))
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "region,year,yield_hg_ha,yield_t_ha,rainfall_mm,avg_temp_c,pesticide_t";

    fn load(body: &str) -> Vec<CropRecord> {
        load_records(format!("{HEADER}\n{body}").as_bytes()).unwrap()
    }

    #[test]
    fn test_load_basic_row() {
        let records = load("Kenya,2005,18000,1.8,630,24.1,120\n");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.region, "Kenya");
        assert_eq!(record.year, 2005);
        assert_eq!(record.yield_hg_ha, 18000.0);
        assert_eq!(record.yield_t_ha, 1.8);
        assert_eq!(record.rainfall_mm, 630.0);
        assert_eq!(record.avg_temp_c, 24.1);
        assert_eq!(record.pesticide_t, 120.0);
        assert_eq!(record.crop, None);
    }

    #[test]
    fn test_rows_without_region_or_year_are_dropped() {
        let records = load(
            "Kenya,2005,1,1,1,1,1\n\
             ,2005,1,1,1,1,1\n\
             Chad,,1,1,1,1,1\n\
             Mali,circa 2005,1,1,1,1,1\n\
             Peru,2006,1,1,1,1,1\n",
        );

        let regions: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["Kenya", "Peru"]);
        assert!(records.iter().all(|r| !r.region.is_empty()));
    }

    #[test]
    fn test_bad_numbers_become_nan() {
        let records = load("Kenya,2005,..,,abc,24.1,n/a\n");

        let record = &records[0];
        assert!(record.yield_hg_ha.is_nan());
        assert!(record.yield_t_ha.is_nan());
        assert!(record.rainfall_mm.is_nan());
        assert_eq!(record.avg_temp_c, 24.1);
        assert!(record.pesticide_t.is_nan());
    }

    #[test]
    fn test_year_uses_leading_integer() {
        let records = load(
            "Kenya,2005.0,1,1,1,1,1\n\
             Chad,2006.5,1,1,1,1,1\n\
             Peru, +2007 ,1,1,1,1,1\n\
             Mali,-,1,1,1,1,1\n",
        );
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2005, 2006, 2007]);
    }

    #[test]
    fn test_numbers_keep_leading_value() {
        let records = load("Kenya,2005.5,1e3x,.5,630mm,-2.5e-1 C,7.\n");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.year, 2005);
        assert_eq!(record.yield_hg_ha, 1000.0);
        assert_eq!(record.yield_t_ha, 0.5);
        assert_eq!(record.rainfall_mm, 630.0);
        assert_eq!(record.avg_temp_c, -0.25);
        assert_eq!(record.pesticide_t, 7.0);
    }

    #[test]
    fn test_infinite_and_nan_words_become_nan() {
        let records = load("Kenya,2005,inf,-Infinity,NaN,1e999,12e\n");

        let record = &records[0];
        assert!(record.yield_hg_ha.is_nan());
        assert!(record.yield_t_ha.is_nan());
        assert!(record.rainfall_mm.is_nan());
        assert!(record.avg_temp_c.is_nan());
        // A dangling exponent marker is ignored, like any other trailing text.
        assert_eq!(record.pesticide_t, 12.0);
    }

    #[test]
    fn test_short_rows_and_trailing_blank_line() {
        let records = load("Kenya,2005,18000\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].yield_hg_ha, 18000.0);
        assert!(records[0].pesticide_t.is_nan());
    }

    #[test]
    fn test_columns_matched_by_name_with_extras() {
        let csv = "Unnamed: 0,crop,pesticide_t,region,year,rainfall_mm\n\
                   0,Maize,42,Brazil,2010,1761\n";
        let records = load_records(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region, "Brazil");
        assert_eq!(records[0].crop.as_deref(), Some("Maize"));
        assert_eq!(records[0].pesticide_t, 42.0);
        assert_eq!(records[0].rainfall_mm, 1761.0);
        assert!(records[0].yield_t_ha.is_nan());
    }

    #[test]
    fn test_year_range_and_crops() {
        let csv = "region,crop,year\nKenya,Maize,2001\nKenya,Wheat,1995\nChad,Maize,2010\n";
        let records = load_records(csv.as_bytes()).unwrap();

        assert_eq!(year_range(&records), Some((1995, 2010)));
        assert_eq!(crops(&records), vec!["Maize".to_string(), "Wheat".to_string()]);
        assert_eq!(years_for(&records, Some("Maize")), vec![2001, 2010]);
        assert_eq!(years_for(&records, None), vec![1995, 2001, 2010]);
        assert_eq!(year_range(&[]), None);
    }

    #[test]
    fn test_metric_keys_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.key().parse::<Metric>().unwrap(), metric);
        }
        assert!("yield".parse::<Metric>().is_err());
    }

    #[test]
    fn test_load_from_path() {
        let path = std::env::temp_dir().join("crop_choropleth_records_test.csv");
        std::fs::write(&path, format!("{HEADER}\nKenya,2005,1,2,3,4,5\n")).unwrap();

        let records = load_records_from_path(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value(Metric::PesticideT), 5.0);

        let _ = std::fs::remove_file(path);
    }
}
