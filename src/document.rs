//! The persisted JSON document
//!
//! `data` is modelled as ordered lists of keyed entries rather than nested
//! maps; it only becomes `{lon: {lat: [[salinity, temperature], ...]}}` when
//! serialized.
//!
//! Coordinates are bucketed to two decimals. Two coordinates that land in the
//! same bucket share one key: the later grid index replaces the earlier
//! entry's value, and the key keeps the position where it first appeared.

use crate::config::GridRequest;
use crate::dataset::GridDataset;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Tuple position → axis name, as documented in `meta.index`.
pub const INDEX_LEGEND: [&str; 3] = ["lon", "lat", "depth"];
/// Pair position → variable name, as documented in `meta.variables`.
pub const VARIABLE_LEGEND: [&str; 2] = ["salinity", "temperature"];

/// `(salinity, temperature)` for one depth level.
pub type Sample = (Option<f64>, Option<f64>);

/// Rounds a coordinate to two decimals and renders it as a map key.
///
/// Rounding goes through the exact decimal expansion of the float, so
/// `2.675` (stored as 2.67499…) becomes `"2.67"`. Whole numbers keep one
/// fractional digit: `-40.0`, not `-40`.
pub fn coordinate_key(value: f64) -> String {
    let rounded: f64 = format!("{:.2}", value).parse().unwrap_or(value);
    if rounded.is_finite() && rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// Depth profile of one grid column.
#[derive(Debug, Clone, PartialEq)]
pub struct LatitudeEntry {
    pub key: String,
    pub samples: Vec<Sample>,
}

/// All latitude profiles under one longitude key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LongitudeEntry {
    pub key: String,
    pub latitudes: Vec<LatitudeEntry>,
}

impl LongitudeEntry {
    fn new(key: String) -> Self {
        Self {
            key,
            latitudes: Vec::new(),
        }
    }

    pub fn latitude(&self, key: &str) -> Option<&LatitudeEntry> {
        self.latitudes.iter().find(|entry| entry.key == key)
    }
}

/// Keyed entries with replace-in-place semantics for repeated keys.
#[derive(Debug)]
struct KeyedEntries<T> {
    entries: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> KeyedEntries<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, key: String, entry: T) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

/// The `data` section: longitude → latitude → depth samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridData {
    pub longitudes: Vec<LongitudeEntry>,
}

impl GridData {
    /// Walks every `(lon, lat, depth)` cell of `dataset` in index order.
    pub fn from_dataset(dataset: &GridDataset) -> Self {
        let n_depth = dataset.depths().len();
        let mut longitudes = KeyedEntries::with_capacity(dataset.longitudes().len());

        for (i, &lon) in dataset.longitudes().iter().enumerate() {
            let lon_key = coordinate_key(lon);
            let mut column = LongitudeEntry::new(lon_key.clone());
            let mut latitudes = KeyedEntries::with_capacity(dataset.latitudes().len());

            for (j, &lat) in dataset.latitudes().iter().enumerate() {
                let lat_key = coordinate_key(lat);
                let samples = (0..n_depth).map(|k| dataset.sample(k, j, i)).collect();
                latitudes.insert(
                    lat_key.clone(),
                    LatitudeEntry {
                        key: lat_key,
                        samples,
                    },
                );
            }

            column.latitudes = latitudes.into_vec();
            longitudes.insert(lon_key, column);
        }

        Self {
            longitudes: longitudes.into_vec(),
        }
    }

    pub fn longitude(&self, key: &str) -> Option<&LongitudeEntry> {
        self.longitudes.iter().find(|entry| entry.key == key)
    }
}

impl Serialize for GridData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.longitudes.len()))?;
        for column in &self.longitudes {
            map.serialize_entry(&column.key, &LatitudeMap(&column.latitudes))?;
        }
        map.end()
    }
}

struct LatitudeMap<'a>(&'a [LatitudeEntry]);

impl Serialize for LatitudeMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.key, &SampleList(&entry.samples))?;
        }
        map.end()
    }
}

struct SampleList<'a>(&'a [Sample]);

impl Serialize for SampleList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for sample in self.0 {
            seq.serialize_element(sample)?;
        }
        seq.end()
    }
}

/// Position-indexed legend, serialized as `{"0": name, "1": name, ...}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Legend(pub &'static [&'static str]);

impl Serialize for Legend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (pos, name) in self.0.iter().enumerate() {
            map.serialize_entry(&pos.to_string(), name)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Limits {
    pub north: f64,
    pub west: f64,
    pub east: f64,
    pub south: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub index: Legend,
    pub variables: Legend,
    pub limits: Limits,
    pub date: String,
}

/// Everything written to `{timestamp}.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub meta: Meta,
    pub depths: Vec<f64>,
    pub data: GridData,
}

impl OutputDocument {
    pub fn build(dataset: &GridDataset, request: &GridRequest) -> Self {
        Self {
            meta: Meta {
                index: Legend(&INDEX_LEGEND),
                variables: Legend(&VARIABLE_LEGEND),
                limits: Limits {
                    north: request.bbox.north,
                    west: request.bbox.west,
                    east: request.bbox.east,
                    south: request.bbox.south,
                },
                date: request.instant(),
            },
            depths: dataset.depths().to_vec(),
            data: GridData::from_dataset(dataset),
        }
    }
}
