//! One invocation: fetch → transform → publish → reply
//!
//! Only a failed download produces a structured error reply. Transform and
//! publish failures are returned as `Err` so the caller fails the whole
//! invocation.

use crate::config::Settings;
use crate::errors::{HycomError, Result};
use crate::fetch::GridFetcher;
use crate::publish::Publisher;
use crate::transform::transform;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Name of the downloaded subset inside the work directory.
pub const DOWNLOAD_FILE_NAME: &str = "data.nc4";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "Fail to download data";

/// Where an invocation is (or stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Fetching,
    FetchFailed,
    Transforming,
    Publishing,
    Done,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationState::Fetching => "FETCHING",
            InvocationState::FetchFailed => "FETCH_FAILED",
            InvocationState::Transforming => "TRANSFORMING",
            InvocationState::Publishing => "PUBLISHING",
            InvocationState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// `{ "statusCode": ..., "body": "{\"error\": \"...\"}" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status_code: u16, error_message: &str) -> Self {
        // Same separators as the consumers already parse: `{"error": "..."}`.
        let message = serde_json::Value::String(error_message.to_string());
        Self {
            status_code,
            body: format!("{{\"error\": {}}}", message),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "")
    }

    pub fn download_failed() -> Self {
        Self::new(400, DOWNLOAD_FAILED_MESSAGE)
    }
}

/// Drives one invocation against a fetcher and a destination bucket.
pub struct Handler<F> {
    settings: Settings,
    fetcher: F,
    publisher: Option<Publisher>,
}

impl<F: GridFetcher> Handler<F> {
    /// The publisher is created from `DATA_BUCKET` when it is first needed.
    pub fn new(settings: Settings, fetcher: F) -> Self {
        Self {
            settings,
            fetcher,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[instrument(skip(self), fields(date = %self.settings.search_date))]
    pub async fn run(&self) -> Result<Reply> {
        let request = self.settings.grid_request();
        let work_dir = self.settings.work_dir.as_path();
        let download_path = work_dir.join(DOWNLOAD_FILE_NAME);

        info!(state = %InvocationState::Fetching);
        if !self.fetcher.fetch(&request, &download_path).await? {
            warn!(state = %InvocationState::FetchFailed, "{}", DOWNLOAD_FAILED_MESSAGE);
            return Ok(Reply::download_failed());
        }

        info!(state = %InvocationState::Transforming);
        let file_name = transform(&download_path, work_dir, &request)?;

        info!(state = %InvocationState::Publishing, file = %file_name);
        let created;
        let publisher = match &self.publisher {
            Some(publisher) => publisher,
            None => {
                let bucket = self.settings.data_bucket.as_deref().ok_or_else(|| {
                    HycomError::ConfigError("DATA_BUCKET is not set".to_string())
                })?;
                created = Publisher::s3(bucket)?;
                &created
            }
        };
        publisher.publish(&work_dir.join(&file_name), &file_name).await?;

        info!(state = %InvocationState::Done);
        Ok(Reply::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reply_has_empty_error() {
        let reply = Reply::ok();
        assert_eq!(reply.status_code, 200);
        assert_eq!(reply.body, r#"{"error": ""}"#);
    }

    #[test]
    fn download_failure_reply() {
        let reply = Reply::download_failed();
        assert_eq!(reply.status_code, 400);
        assert_eq!(reply.body, r#"{"error": "Fail to download data"}"#);
    }

    #[test]
    fn reply_uses_status_code_field_name() {
        let json = serde_json::to_value(Reply::ok()).expect("serialize reply");
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], r#"{"error": ""}"#);
    }
}
