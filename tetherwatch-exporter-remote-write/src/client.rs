//! Remote-write HTTP client.

use std::collections::BTreeMap;

use prost::Message;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, trace};

use tetherwatch_common::MetricPoint;

use crate::config::{ConfigError, RemoteWriteConfig};
use crate::mapping::build_write_request;

/// Remote-write protocol version sent with every request.
pub const REMOTE_WRITE_VERSION: &str = "0.1.0";

const USER_AGENT: &str = concat!("tetherwatch/", env!("CARGO_PKG_VERSION"));

/// Longest response body kept in a [`PushError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Errors returned by [`RemoteWriteClient`].
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Invalid remote-write configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to compress write request: {0}")]
    Compress(#[from] snap::Error),

    #[error("Remote-write request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Remote-write receiver returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl PushError {
    /// Whether the request hit the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PushError::Request(e) if e.is_timeout())
    }
}

/// Outcome of a successful push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Number of series in the request.
    pub series: usize,
    /// Compressed body size in bytes.
    pub bytes: usize,
}

/// Client that sends one remote-write request per call.
///
/// There is no retry or buffering: a failed push is reported to the caller
/// and the batch is dropped.
#[derive(Debug, Clone)]
pub struct RemoteWriteClient {
    http: reqwest::Client,
    url: reqwest::Url,
    basic_auth: Option<(String, Option<String>)>,
    external_labels: BTreeMap<String, String>,
}

impl RemoteWriteClient {
    /// Create a client from a validated configuration.
    pub fn new(config: &RemoteWriteConfig) -> Result<Self, PushError> {
        config.validate()?;

        let url = reqwest::Url::parse(&config.url)
            .map_err(|e| ConfigError::Validation(format!("Invalid remote_write.url: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(PushError::Client)?;

        Ok(Self {
            http,
            url,
            basic_auth: config
                .basic_auth()
                .map(|(user, password)| (user.to_string(), password.map(str::to_string))),
            external_labels: config.external_labels.clone(),
        })
    }

    /// Encode points as a snappy-compressed protobuf `WriteRequest`.
    pub fn encode(&self, points: &[MetricPoint]) -> Result<Vec<u8>, PushError> {
        let request = build_write_request(points, &self.external_labels);
        let raw = request.encode_to_vec();
        let compressed = snap::raw::Encoder::new().compress_vec(&raw)?;

        trace!(
            series = request.timeseries.len(),
            raw_bytes = raw.len(),
            compressed_bytes = compressed.len(),
            "Encoded write request"
        );

        Ok(compressed)
    }

    /// Push all points in a single request.
    ///
    /// An empty batch is not sent.
    pub async fn push(&self, points: &[MetricPoint]) -> Result<PushSummary, PushError> {
        if points.is_empty() {
            debug!("No points to push, skipping remote write");
            return Ok(PushSummary::default());
        }

        let body = self.encode(points)?;
        let bytes = body.len();

        let mut request = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/x-protobuf")
            .header(CONTENT_ENCODING, "snappy")
            .header("X-Prometheus-Remote-Write-Version", REMOTE_WRITE_VERSION)
            .body(body);

        if let Some((ref username, ref password)) = self.basic_auth {
            request = request.basic_auth(username, password.as_deref());
        }

        let response = request.send().await.map_err(PushError::Request)?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(PushError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        debug!(
            url = %self.url,
            series = points.len(),
            bytes,
            status = status.as_u16(),
            "Pushed metrics"
        );

        Ok(PushSummary {
            series: points.len(),
            bytes,
        })
    }
}
