use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{Method, RequestSpec};
use crate::stats::StatsCollector;

/// Trait for the HTTP transport behind a dispatch
pub trait RequestSender: Send + Sync {
    fn name(&self) -> &'static str;

    /// Issues one request; `Ok` iff the client classifies the exchange as
    /// successful. Transport errors, protocol-level errors and request
    /// construction failures all come back as `Err`.
    fn send<'a>(
        &'a self,
        spec: &'a RequestSpec,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>>;
}

/// Mock transport for tests and offline runs (fixed delay, fixed outcome)
pub struct MockSender {
    delay: Duration,
    fail: bool,
}

impl MockSender {
    pub fn new(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    /// A sender whose every request fails at the transport level.
    pub fn failing(delay: Duration) -> Self {
        Self { delay, fail: true }
    }
}

impl RequestSender for MockSender {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn send<'a>(
        &'a self,
        spec: &'a RequestSpec,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if self.fail {
                anyhow::bail!("mock transport refused {}", spec.endpoint);
            }
            Ok(())
        })
    }
}

/// Real transport over a shared reqwest client
pub struct HttpSender {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSender {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url_for(&self, spec: &RequestSpec) -> String {
        format!("{}/{}", self.base_url, spec.endpoint.trim_start_matches('/'))
    }
}

impl RequestSender for HttpSender {
    fn name(&self) -> &'static str {
        "http"
    }

    fn send<'a>(
        &'a self,
        spec: &'a RequestSpec,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(spec);
            let request = match spec.method {
                Method::Get => self.client.get(&url),
                Method::Post => self
                    .client
                    .post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(spec.body.clone().unwrap_or_default()),
            };

            let response = request.send().await?;
            // The client's own protocol-level classification: 4xx/5xx come
            // back as errors, anything else counts as served.
            response.error_for_status()?;
            Ok(())
        })
    }
}

/// Performs one attempt end to end: counts it, races the transport against
/// cancellation, classifies the outcome and logs it.
pub struct Dispatcher {
    sender: Arc<dyn RequestSender>,
    stats: Arc<StatsCollector>,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn RequestSender>, stats: Arc<StatsCollector>) -> Self {
        Self { sender, stats }
    }

    /// Never fails and never panics: every transport or construction error
    /// is absorbed here, so one bad request cannot take down its batch.
    ///
    /// `sent` is incremented before the cancellation race: it counts
    /// attempts, so an abandoned in-flight request leaves
    /// `succeeded + failed` short of `sent`.
    pub async fn dispatch(&self, spec: RequestSpec, cancel: CancellationToken) {
        self.stats.record_sent();

        tokio::select! {
            _ = cancel.cancelled() => {
                // Abandoned: neither succeeded nor failed.
            }
            result = self.sender.send(&spec) => match result {
                Ok(()) => {
                    self.stats.record_success();
                    debug!(endpoint = %spec.endpoint, "request succeeded");
                }
                Err(error) => {
                    self.stats.record_failure();
                    warn!(endpoint = %spec.endpoint, %error, "request failed");
                }
            },
        }
    }
}
