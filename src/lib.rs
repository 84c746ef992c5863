//! hycom_grid: HYCOM ocean snapshot → coordinate-keyed JSON
//!
//! Downloads one day of HYCOM salinity and water temperature for a bounding
//! box from the THREDDS NetCDF Subset Service, reshapes the
//! `(depth, lat, lon)` grid into a nested JSON document keyed by rounded
//! longitude and latitude, and uploads that document to an S3-compatible
//! bucket.
//!
//! ## Module Organization
//!
//! - [`config`]: Environment/flag settings and the request they describe
//! - [`fetch`]: Subset service query and download
//! - [`dataset`]: NetCDF reading into a validated in-memory grid
//! - [`document`]: Typed output document and its JSON shape
//! - [`transform`]: NetCDF file → JSON file step
//! - [`publish`]: Upload to object storage
//! - [`handler`]: Invocation orchestration and status reply
//! - [`errors`]: Centralized error handling
//!
//! ## Usage
//! ```rust,no_run
//! use hycom_grid::prelude::*;
//!
//! # async fn run() -> hycom_grid::Result<()> {
//! let settings = Settings::default();
//! let fetcher = HycomFetcher::new(settings.grid_url.clone())?;
//! let reply = Handler::new(settings, fetcher).run().await?;
//! println!("{}", serde_json::to_string(&reply).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod document;
pub mod errors;
pub mod fetch;
pub mod handler;
pub mod publish;
pub mod transform;

pub use errors::{HycomError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::{BoundingBox, GridRequest, Settings};
    pub use crate::dataset::{read_grid, GridDataset};
    pub use crate::document::{coordinate_key, GridData, OutputDocument};
    pub use crate::errors::{HycomError, Result};
    pub use crate::fetch::{GridFetcher, HycomFetcher};
    pub use crate::handler::{Handler, InvocationState, Reply};
    pub use crate::publish::Publisher;
    pub use crate::transform::transform;
}
