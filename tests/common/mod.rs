//! NetCDF fixtures shaped like a HYCOM subset response.

#![allow(dead_code)]

use hycom_grid::Result;
use netcdf::create;
use std::path::Path;

/// Coordinates plus flat `[depth][lat][lon]` values for both variables.
pub struct GridFixture {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub depth: Vec<f64>,
    pub salinity: Vec<f64>,
    pub temperature: Vec<f64>,
}

pub fn salinity_sentinel(k: usize, j: usize, i: usize) -> f64 {
    1000.0 + 100.0 * k as f64 + 10.0 * j as f64 + i as f64
}

pub fn temperature_sentinel(k: usize, j: usize, i: usize) -> f64 {
    2000.0 + 100.0 * k as f64 + 10.0 * j as f64 + i as f64
}

impl GridFixture {
    /// Every cell holds distinct sentinel values derived from its indices.
    pub fn sentinel(lon: &[f64], lat: &[f64], depth: &[f64]) -> Self {
        let mut salinity = Vec::new();
        let mut temperature = Vec::new();
        for k in 0..depth.len() {
            for j in 0..lat.len() {
                for i in 0..lon.len() {
                    salinity.push(salinity_sentinel(k, j, i));
                    temperature.push(temperature_sentinel(k, j, i));
                }
            }
        }
        Self {
            lon: lon.to_vec(),
            lat: lat.to_vec(),
            depth: depth.to_vec(),
            salinity,
            temperature,
        }
    }

    fn shape(&self) -> (usize, usize, usize, usize) {
        (1, self.depth.len(), self.lat.len(), self.lon.len())
    }

    /// Writes `(time, depth, lat, lon)` variables plus coordinates.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut file = create(path)?;
        file.add_dimension("time", 1)?;
        file.add_dimension("depth", self.depth.len())?;
        file.add_dimension("lat", self.lat.len())?;
        file.add_dimension("lon", self.lon.len())?;

        write_coordinate(&mut file, "lon", &self.lon)?;
        write_coordinate(&mut file, "lat", &self.lat)?;
        write_coordinate(&mut file, "depth", &self.depth)?;

        let dims = ["time", "depth", "lat", "lon"];
        for (name, values) in [("salinity", &self.salinity), ("water_temp", &self.temperature)] {
            let (t, d, m, l) = self.shape();
            assert_eq!(values.len(), t * d * m * l, "fixture values must fill the grid");
            let mut var = file.add_variable::<f64>(name, &dims)?;
            var.put_values(values.as_slice(), ..)?;
        }
        Ok(())
    }
}

fn write_coordinate(file: &mut netcdf::FileMut, name: &str, values: &[f64]) -> Result<()> {
    let mut var = file.add_variable::<f64>(name, &[name])?;
    var.put_values(values, ..)?;
    Ok(())
}

/// The 2×2×2 sentinel grid with both longitudes at -40.0.
pub fn colliding_longitude_fixture() -> GridFixture {
    GridFixture::sentinel(&[-40.0, -40.0], &[-10.0, -10.25], &[0.0, 10.0])
}

/// Single-purpose HTTP stand-in for the subset service.
///
/// Answers every request with the same status and body and records each
/// request line (`GET /path?query HTTP/1.1`).
pub struct StubServer {
    pub url: String,
    pub requests: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(status: u16, body: Vec<u8>) -> std::io::Result<Self> {
        let content_length = body.len();
        Self::start_with_length(status, body, content_length).await
    }

    /// Like [`StubServer::start`] but announces `content_length` bytes.
    /// A value larger than the body makes the connection close mid-body.
    pub async fn start_with_length(
        status: u16,
        body: Vec<u8>,
        content_length: usize,
    ) -> std::io::Result<Self> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/thredds/ncss/grid", listener.local_addr()?);
        let requests = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            head.extend_from_slice(&buf[..n]);
                            if head.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }

                let text = String::from_utf8_lossy(&head);
                if let Some(line) = text.lines().next() {
                    seen.lock().expect("request log").push(line.to_string());
                }

                let reason = if status == 200 { "OK" } else { "Error" };
                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status, reason, content_length
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });

        Ok(Self { url, requests })
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

/// Fetcher pointed at a local stub, bypassing any proxy settings.
pub fn local_fetcher(url: &str) -> hycom_grid::fetch::HycomFetcher {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("HTTP client");
    hycom_grid::fetch::HycomFetcher::with_client(client, url)
}
