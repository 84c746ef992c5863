//! In-memory grid snapshot and the NetCDF reader that produces it
//!
//! A HYCOM subset response carries `salinity` and `water_temp` as
//! `(time, depth, lat, lon)` variables plus the `lat`, `lon` and `depth`
//! coordinate variables. Only the first time step is kept.

use crate::errors::{HycomError, Result};
use ndarray::Array3;
use netcdf::{AttributeValue, File, Variable};
use std::path::Path;
use tracing::{debug, info};

pub const SALINITY_VAR: &str = "salinity";
pub const TEMPERATURE_VAR: &str = "water_temp";
pub const LATITUDE_VAR: &str = "lat";
pub const LONGITUDE_VAR: &str = "lon";
pub const DEPTH_VAR: &str = "depth";
pub const DEPTH_DIM: &str = "depth";

/// Reads `$var` at `$extents` as `f64`, widening from the stored type when
/// the library refuses a direct conversion. Packed HYCOM variables are shorts.
macro_rules! read_widened {
    ($var:expr, $extents:expr) => {
        match $var.get_values::<f64, _>($extents) {
            Ok(values) => Ok(values),
            Err(first) => $var
                .get_values::<f32, _>($extents)
                .map(|v| v.into_iter().map(f64::from).collect::<Vec<f64>>())
                .or_else(|_| {
                    $var.get_values::<i32, _>($extents)
                        .map(|v| v.into_iter().map(f64::from).collect())
                })
                .or_else(|_| {
                    $var.get_values::<i16, _>($extents)
                        .map(|v| v.into_iter().map(f64::from).collect())
                })
                .map_err(|_| first),
        }
    };
}

/// One time slice of the grid, indexed `[depth][lat][lon]`.
///
/// `None` marks a masked cell (land, below the sea floor, or a fill value).
#[derive(Debug, Clone)]
pub struct GridDataset {
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
    depths: Vec<f64>,
    salinity: Array3<Option<f64>>,
    temperature: Array3<Option<f64>>,
}

impl GridDataset {
    /// Build a dataset, checking that both arrays are shaped
    /// `(depths.len(), latitudes.len(), longitudes.len())`.
    pub fn new(
        longitudes: Vec<f64>,
        latitudes: Vec<f64>,
        depths: Vec<f64>,
        salinity: Array3<Option<f64>>,
        temperature: Array3<Option<f64>>,
    ) -> Result<Self> {
        let expected = [depths.len(), latitudes.len(), longitudes.len()];
        for (name, array) in [(SALINITY_VAR, &salinity), (TEMPERATURE_VAR, &temperature)] {
            if array.shape() != expected {
                return Err(HycomError::ShapeMismatch {
                    message: format!(
                        "'{}' has shape {:?} but coordinates give (depth, lat, lon) = {:?}",
                        name,
                        array.shape(),
                        expected
                    ),
                });
            }
        }

        Ok(Self {
            longitudes,
            latitudes,
            depths,
            salinity,
            temperature,
        })
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    /// `(salinity, temperature)` at depth `k`, latitude `j`, longitude `i`.
    pub fn sample(&self, k: usize, j: usize, i: usize) -> (Option<f64>, Option<f64>) {
        (self.salinity[[k, j, i]], self.temperature[[k, j, i]])
    }
}

/// Reads the downloaded subset file into a [`GridDataset`].
///
/// The number of depth levels comes from the declared `depth` dimension. It
/// may not exceed the depth extent of the data variables.
pub fn read_grid(path: &Path) -> Result<GridDataset> {
    let file = netcdf::open(path)?;
    info!(path = %path.display(), "Read NetCDF matrix");

    let n_depth = file
        .dimension(DEPTH_DIM)
        .ok_or_else(|| HycomError::DimensionNotFound {
            dim: DEPTH_DIM.to_string(),
        })?
        .len();

    let longitudes = read_coordinate(&file, LONGITUDE_VAR)?;
    let latitudes = read_coordinate(&file, LATITUDE_VAR)?;
    let mut depths = read_coordinate(&file, DEPTH_VAR)?;

    if depths.len() < n_depth {
        return Err(HycomError::ShapeMismatch {
            message: format!(
                "depth dimension declares {} levels but '{}' holds {}",
                n_depth,
                DEPTH_VAR,
                depths.len()
            ),
        });
    }
    depths.truncate(n_depth);

    let salinity = read_first_time_slice(&file, SALINITY_VAR, n_depth)?;
    let temperature = read_first_time_slice(&file, TEMPERATURE_VAR, n_depth)?;

    debug!(
        lon = longitudes.len(),
        lat = latitudes.len(),
        depth = n_depth,
        "Loaded grid"
    );

    GridDataset::new(longitudes, latitudes, depths, salinity, temperature)
}

fn find_variable<'f>(file: &'f File, var_name: &str) -> Result<Variable<'f>> {
    file.variable(var_name)
        .ok_or_else(|| HycomError::VariableNotFound {
            var: var_name.to_string(),
        })
}

fn read_coordinate(file: &File, var_name: &str) -> Result<Vec<f64>> {
    let var = find_variable(file, var_name)?;
    Ok(read_widened!(var, ..)?)
}

/// Loads `var[0, 0..n_depth, .., ..]` as a `(depth, lat, lon)` array with
/// packing and masking applied.
fn read_first_time_slice(
    file: &File,
    var_name: &str,
    n_depth: usize,
) -> Result<Array3<Option<f64>>> {
    let var = find_variable(file, var_name)?;

    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();

    let (n_time, depth_extent, n_lat, n_lon) = match shape.as_slice() {
        [t, d, m, l] => (*t, *d, *m, *l),
        _ => {
            return Err(HycomError::ShapeMismatch {
                message: format!(
                    "'{}' must be (time, depth, lat, lon), found {} dimensions",
                    var_name,
                    shape.len()
                ),
            })
        }
    };

    if n_time == 0 {
        return Err(HycomError::ShapeMismatch {
            message: format!("'{}' has no time steps", var_name),
        });
    }

    if n_depth > depth_extent {
        return Err(HycomError::ShapeMismatch {
            message: format!(
                "depth dimension declares {} levels but '{}' only has {}",
                n_depth, var_name, depth_extent
            ),
        });
    }

    let raw = read_widened!(var, (0..1, 0..n_depth, 0..n_lat, 0..n_lon))?;
    let packing = Packing::from_variable(&var);
    let values: Vec<Option<f64>> = raw.into_iter().map(|v| packing.unpack(v)).collect();

    Ok(Array3::from_shape_vec((n_depth, n_lat, n_lon), values)?)
}

/// Fill/missing markers, valid range and linear packing of a stored
/// variable. All markers and bounds are in stored (packed) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub valid_min: Option<f64>,
    pub valid_max: Option<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            fill_value: None,
            missing_value: None,
            valid_min: None,
            valid_max: None,
            scale_factor: 1.0,
            add_offset: 0.0,
        }
    }
}

impl Packing {
    pub fn from_variable(var: &Variable) -> Self {
        let (valid_min, valid_max) = valid_bounds(
            attribute_values(var, "valid_range"),
            numeric_attribute(var, "valid_min"),
            numeric_attribute(var, "valid_max"),
        );
        Self {
            fill_value: numeric_attribute(var, "_FillValue"),
            missing_value: numeric_attribute(var, "missing_value"),
            valid_min,
            valid_max,
            scale_factor: numeric_attribute(var, "scale_factor").unwrap_or(1.0),
            add_offset: numeric_attribute(var, "add_offset").unwrap_or(0.0),
        }
    }

    /// Masks fill/missing/non-finite/out-of-range raw values, then applies
    /// scale and offset.
    pub fn unpack(&self, raw: f64) -> Option<f64> {
        if !raw.is_finite() || Some(raw) == self.fill_value || Some(raw) == self.missing_value {
            return None;
        }
        if self.valid_min.map_or(false, |min| raw < min)
            || self.valid_max.map_or(false, |max| raw > max)
        {
            return None;
        }
        Some(raw * self.scale_factor + self.add_offset)
    }
}

/// `valid_range` gives both bounds; `valid_min`/`valid_max` override either end.
fn valid_bounds(
    range: Option<Vec<f64>>,
    min: Option<f64>,
    max: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let (range_min, range_max) = match range.as_deref() {
        Some([lo, hi]) => (Some(*lo), Some(*hi)),
        _ => (None, None),
    };
    (min.or(range_min), max.or(range_max))
}

fn numeric_attribute(var: &Variable, name: &str) -> Option<f64> {
    attribute_values(var, name)?.first().copied()
}

fn attribute_values(var: &Variable, name: &str) -> Option<Vec<f64>> {
    let values = match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Float(v) => vec![f64::from(v)],
        AttributeValue::Int(v) => vec![f64::from(v)],
        AttributeValue::Short(v) => vec![f64::from(v)],
        AttributeValue::Ushort(v) => vec![f64::from(v)],
        AttributeValue::Uint(v) => vec![f64::from(v)],
        AttributeValue::Schar(v) => vec![f64::from(v)],
        AttributeValue::Uchar(v) => vec![f64::from(v)],
        AttributeValue::Doubles(vs) => vs,
        AttributeValue::Floats(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Shorts(vs) => vs.into_iter().map(f64::from).collect(),
        AttributeValue::Ints(vs) => vs.into_iter().map(f64::from).collect(),
        _ => return None,
    };
    Some(values)
}
