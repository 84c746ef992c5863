//! Retrieval of the NetCDF subset from the HYCOM subset service

use crate::config::GridRequest;
use crate::errors::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Variables requested from the service, in request order.
pub const REQUESTED_VARIABLES: [&str; 2] = ["salinity", "water_temp"];

/// Something that can place a NetCDF subset for `request` at a local path.
#[async_trait]
pub trait GridFetcher {
    /// Returns `Ok(false)` when the service answers with anything but 200.
    /// In that case `destination` is not touched. Transport failures are
    /// errors, and an interrupted body never leaves a file at `destination`.
    async fn fetch(&self, request: &GridRequest, destination: &Path) -> Result<bool>;
}

/// Query string for a single-instant, full-column subset in NetCDF format.
///
/// `vertCoord` is left out entirely, which asks for every depth level.
pub fn query_params(request: &GridRequest) -> Vec<(&'static str, String)> {
    let instant = request.instant();
    let mut params: Vec<(&'static str, String)> = REQUESTED_VARIABLES
        .iter()
        .map(|var| ("var", var.to_string()))
        .collect();

    params.extend([
        ("north", request.bbox.north.to_string()),
        ("west", request.bbox.west.to_string()),
        ("east", request.bbox.east.to_string()),
        ("south", request.bbox.south.to_string()),
        ("disableLLSubset", "on".to_string()),
        ("disableProjSubset", "on".to_string()),
        ("horizStride", "1".to_string()),
        ("time_start", instant.clone()),
        ("time_end", instant),
        ("timeStride", "1".to_string()),
        ("accept", "netcdf".to_string()),
    ]);
    params
}

/// HTTP fetcher for the NetCDF Subset Service.
pub struct HycomFetcher {
    client: Client,
    base_url: String,
}

impl HycomFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GridFetcher for HycomFetcher {
    #[instrument(skip(self, request), fields(url = %self.base_url, date = %request.date))]
    async fn fetch(&self, request: &GridRequest, destination: &Path) -> Result<bool> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params(request))
            .send()
            .await?;

        let status = response.status();
        info!("HYCOM - {}", status.as_u16());

        if status != StatusCode::OK {
            return Ok(false);
        }

        let partial = partial_path(destination);
        let written = match stream_to_file(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    debug!(error = %cleanup, "No partial download to remove");
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, destination).await?;

        debug!(bytes = written, path = %destination.display(), "Saved NetCDF subset");
        Ok(true)
    }
}

/// `<destination>.part`, where the body is staged until it is complete.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn stream_to_file(response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
