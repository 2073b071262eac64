// SolaX HTTP client
//
// Wraps `reqwest::Client` with SolaX URL construction, the timeout-only
// retry loop, and validation of every body before it leaves this module.

use std::time::Duration;

use tracing::{debug, error, trace, warn};
use url::Url;

use crate::endpoint::{self, Credentials, LocalTarget};
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::schema::{self, RealTimeData, SiteResponse, Validate};
use crate::transport::TransportConfig;

/// Outcome of a single attempt that did not produce a body.
enum AttemptError {
    TimedOut,
    Failed(Error),
}

/// Async client for SolaX cloud site lists and local real-time data.
///
/// Stateless apart from the HTTP connection pool: credentials are passed per
/// call so one client can serve any number of configured sites.
#[derive(Debug, Clone)]
pub struct SolaxClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl SolaxClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the portal root (e.g. `https://www.solax-portal.com`).
    /// It is unused by [`realtime`](Self::realtime), which talks to the
    /// inverter directly.
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, retry))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url,
            retry,
        }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The retry policy applied when no attempt count is given.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch and validate a cloud site list using the client's attempt count.
    ///
    /// The response type selects the list: `fetch::<BatteryResponse>` hits
    /// `BatteryList`, `fetch::<InverterResponse>` hits `InverterList`.
    pub async fn fetch<S: SiteResponse>(&self, credentials: &Credentials) -> Result<S, Error> {
        self.fetch_with_attempts(credentials, self.retry.attempts)
            .await
    }

    /// Fetch and validate a cloud site list with an explicit attempt count.
    pub async fn fetch_with_attempts<S: SiteResponse>(
        &self,
        credentials: &Credentials,
        attempts: u32,
    ) -> Result<S, Error> {
        let url = endpoint::site_url(&self.base_url, S::LIST, credentials)?;
        debug!(list = %S::LIST, site = credentials.site_id(), "fetching SolaX site list");
        let body = self.get_with_retry(url, attempts).await?;
        decode::<S>(&body)
    }

    /// Fetch and validate the inverter's local real-time data.
    pub async fn realtime(&self, target: &LocalTarget) -> Result<RealTimeData, Error> {
        let url = endpoint::realtime_url(target)?;
        debug!(%target, "fetching SolaX real-time data");
        let body = self.get_with_retry(url, self.retry.attempts).await?;
        decode::<RealTimeData>(&schema::sanitize_realtime_body(&body))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET `url`, retrying timeouts with backoff. Any other failure is
    /// returned from the attempt that hit it.
    async fn get_with_retry(&self, url: Url, attempts: u32) -> Result<String, Error> {
        let max_attempts = attempts.max(1);
        let mut backoff = self.retry.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let delay = backoff.next().unwrap_or(Duration::ZERO);
            if !delay.is_zero() {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "timeout connecting to SolaX, waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }

            match self.get_once(url.clone()).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::TimedOut) if attempt < max_attempts => {}
                Err(AttemptError::TimedOut) => {
                    error!(attempts = attempt, "too many timeouts connecting to SolaX");
                    return Err(Error::Timeout {
                        attempts: attempt,
                        timeout: self.retry.timeout,
                    });
                }
                Err(AttemptError::Failed(e)) => {
                    error!(error = %e, "SolaX request failed");
                    return Err(e);
                }
            }
        }
    }

    /// One bounded attempt: connect, check status, read the body.
    async fn get_once(&self, url: Url) -> Result<String, AttemptError> {
        let resp = self
            .http
            .get(url)
            .timeout(self.retry.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Failed(Error::Status {
                status: status.as_u16(),
            }));
        }

        let body = resp.text().await.map_err(classify)?;
        trace!(bytes = body.len(), "received SolaX response body");
        Ok(body)
    }
}

fn classify(err: reqwest::Error) -> AttemptError {
    if err.is_timeout() {
        AttemptError::TimedOut
    } else {
        AttemptError::Failed(Error::Transport(err))
    }
}

/// Parse `body` as JSON and validate it as `T`.
fn decode<T: Validate>(body: &str) -> Result<T, Error> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::MalformedPayload {
            message: e.to_string(),
            body: body.to_owned(),
        })?;
    T::validate(&value).map_err(|e| {
        debug!(path = e.path(), "SolaX response failed validation");
        Error::Schema(e)
    })
}
