//! InfluxDB v2 write sink.

use super::{line_protocol, SinkError, WriteSink, WriteTarget};
use crate::models::Point;
use async_trait::async_trait;
use std::time::Duration;

/// Writes points to an InfluxDB v2 compatible `/api/v2/write` endpoint.
///
/// The underlying `reqwest::Client` pools connections and is safe to share
/// across writer tasks.
#[derive(Clone)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    token: String,
}

impl InfluxSink {
    /// Creates a sink for the store at `url`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            write_url: format!("{}/api/v2/write", url.trim_end_matches('/')),
            token: token.to_string(),
        })
    }

    /// Returns the write endpoint URL.
    #[must_use]
    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

impl std::fmt::Debug for InfluxSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxSink")
            .field("write_url", &self.write_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WriteSink for InfluxSink {
    async fn write(&self, point: &Point, target: &WriteTarget) -> Result<(), SinkError> {
        let line = line_protocol::encode(point)?;

        let response = self
            .client
            .post(&self.write_url)
            .query(&[
                ("org", target.organization.as_str()),
                ("bucket", target.bucket.as_str()),
                ("precision", "ms"),
            ])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
