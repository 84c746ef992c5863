//! Invocation settings, read once at startup from the environment (or flags).
//!
//! The defaults reproduce the historical South Atlantic region and date the
//! job was originally scheduled for.

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// HYCOM NetCDF Subset Service endpoint for the GLBu0.08 expt_19.1 2012 run.
pub const DEFAULT_GRID_URL: &str = "http://ncss.hycom.org/thredds/ncss/GLBu0.08/expt_19.1/2012";
pub const DEFAULT_NORTH: f64 = 5.272265855051468;
pub const DEFAULT_WEST: f64 = -53.37020817534605;
pub const DEFAULT_EAST: f64 = -25.739999560977726;
pub const DEFAULT_SOUTH: f64 = -33.74341396166777;
pub const DEFAULT_SEARCH_DATE: &str = "2012-12-31";
pub const DEFAULT_WORK_DIR: &str = "/tmp";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Fetch a HYCOM salinity/temperature snapshot and publish it as JSON
#[derive(Parser, Debug, Clone)]
#[command(
    version = "1.1.0",
    name = "hycom-grid",
    about = "Fetches a HYCOM grid snapshot, converts it to JSON and uploads it to a bucket"
)]
pub struct Settings {
    /// Northern latitude limit of the requested box
    #[arg(long, env = "NORTH_BOUND", default_value_t = DEFAULT_NORTH, allow_hyphen_values = true)]
    pub north: f64,

    /// Western longitude limit of the requested box
    #[arg(long, env = "WEST_BOUND", default_value_t = DEFAULT_WEST, allow_hyphen_values = true)]
    pub west: f64,

    /// Eastern longitude limit of the requested box
    #[arg(long, env = "EAST_BOUND", default_value_t = DEFAULT_EAST, allow_hyphen_values = true)]
    pub east: f64,

    /// Southern latitude limit of the requested box
    #[arg(long, env = "SOUTH_BOUND", default_value_t = DEFAULT_SOUTH, allow_hyphen_values = true)]
    pub south: f64,

    /// Day to fetch, formatted as YYYY-MM-DD
    #[arg(long, env = "SEARCH_DATE", default_value = DEFAULT_SEARCH_DATE, value_parser = parse_search_date)]
    pub search_date: NaiveDate,

    /// Destination bucket. Only required once the JSON document is ready to upload.
    #[arg(long, env = "DATA_BUCKET")]
    pub data_bucket: Option<String>,

    /// Base URL of the NetCDF subset service
    #[arg(long, env = "HYCOM_URL", default_value = DEFAULT_GRID_URL)]
    pub grid_url: String,

    /// Directory holding the downloaded NetCDF file and the generated JSON
    #[arg(long, env = "WORK_DIR", default_value = DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            north: DEFAULT_NORTH,
            west: DEFAULT_WEST,
            east: DEFAULT_EAST,
            south: DEFAULT_SOUTH,
            search_date: parse_search_date(DEFAULT_SEARCH_DATE).unwrap_or_default(),
            data_bucket: None,
            grid_url: DEFAULT_GRID_URL.to_string(),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// The bounding box and instant this invocation asks the grid service for.
    pub fn grid_request(&self) -> GridRequest {
        GridRequest {
            bbox: BoundingBox {
                north: self.north,
                west: self.west,
                east: self.east,
                south: self.south,
            },
            date: self.search_date,
        }
    }
}

/// Geographic extent of the requested subset, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub east: f64,
    pub south: f64,
}

/// A single-instant request: one box, one day at midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub bbox: BoundingBox,
    pub date: NaiveDate,
}

impl GridRequest {
    /// `YYYY-MM-DDT00:00:00Z`, used for both ends of the time range.
    pub fn instant(&self) -> String {
        format!("{}T00:00:00Z", self.date.format("%Y-%m-%d"))
    }
}

fn parse_search_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': expected YYYY-MM-DD ({})", s, e))
}
