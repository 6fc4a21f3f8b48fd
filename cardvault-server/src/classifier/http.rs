//! HTTP classifier client with retry and backoff.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::{ClassifierError, ClassifierVerdict, ImageClassifier};

/// Configuration for the HTTP classifier client.
#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    /// Classifier endpoint accepting a POSTed image body.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on total retry time for transient failures.
    pub max_elapsed: Duration,
}

impl HttpClassifierConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(30),
        }
    }
}

/// Classifier reached over HTTP.
///
/// Classification is a pure read, so transient failures are retried with
/// exponential backoff. The publish operation wrapping it is never retried
/// from here.
pub struct HttpClassifier {
    client: Client,
    config: HttpClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifierError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn classify_once(
        &self,
        image: &[u8],
    ) -> Result<ClassifierVerdict, backoff::Error<ClassifierError>> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("content-type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    backoff::Error::transient(ClassifierError::Request(format!(
                        "transient error (will retry): {e}"
                    )))
                } else {
                    backoff::Error::permanent(ClassifierError::Request(e.to_string()))
                }
            })?;

        let status = response.status();
        debug!(status = %status, "Classifier response received");

        if !status.is_success() {
            let err = ClassifierError::Request(format!("classifier returned status {status}"));
            return if is_transient_status(status) {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        response
            .json::<ClassifierVerdict>()
            .await
            .map_err(|e| backoff::Error::permanent(ClassifierError::InvalidResponse(e.to_string())))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl ImageClassifier for HttpClassifier {
    async fn classify(&self, image: &[u8]) -> Result<ClassifierVerdict, ClassifierError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.config.max_elapsed),
            ..ExponentialBackoff::default()
        };

        retry_notify(
            backoff,
            || async { self.classify_once(image).await },
            |err: ClassifierError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Classifier retry scheduled"
                );
            },
        )
        .await
    }

    fn provider_id(&self) -> &'static str {
        "http"
    }
}
