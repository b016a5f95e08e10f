//! Generative restyling service client.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use image::ImageFormat;
use memoria_config::RemoteConfig;
use memoria_core::StrategyKind;
use memoria_error::{MemoriaResult, RemoteError, RemoteErrorKind, RetryableError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, info, instrument, warn};

use crate::RestyleStrategy;

/// Request body sent to the service.
#[derive(Debug, Serialize)]
struct RestyleRequest<'a> {
    /// Base64 of the source image
    image: String,
    /// Style instruction
    prompt: &'a str,
}

/// Response body returned by the service.
#[derive(Debug, Deserialize)]
struct RestyleResponse {
    /// Base64 of the restyled image
    #[serde(default)]
    image: Option<String>,
    /// Reason the service declined the content
    #[serde(default)]
    refusal: Option<String>,
}

/// Restyles images by POSTing them to a generative service.
///
/// Each attempt carries its own deadline. Transient failures (connection
/// errors, timeouts, 408/429/5xx) are retried with jittered exponential
/// backoff; permission and policy failures are returned immediately so the
/// pipeline can fall through to the local filter.
#[derive(Debug, Clone)]
pub struct RemoteStrategy {
    client: Client,
    config: RemoteConfig,
    api_key: String,
}

impl RemoteStrategy {
    /// Creates a strategy reading its bearer token from the configured
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteErrorKind::MissingApiKey`] if the variable is unset.
    #[instrument(skip_all, fields(endpoint = %config.endpoint()))]
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let api_key = std::env::var(config.api_key_env()).map_err(|_| {
            RemoteError::new(RemoteErrorKind::MissingApiKey(config.api_key_env().clone()))
        })?;
        Ok(Self::with_api_key(config.clone(), api_key))
    }

    /// Creates a strategy with an explicit bearer token.
    pub fn with_api_key(config: RemoteConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            api_key: api_key.into(),
        }
    }

    /// Endpoint this strategy calls.
    pub fn endpoint(&self) -> &str {
        self.config.endpoint()
    }

    async fn attempt(&self, request: &RestyleRequest<'_>) -> Result<Vec<u8>, RemoteError> {
        let deadline = self.config.timeout();
        match tokio::time::timeout(deadline, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::new(RemoteErrorKind::Timeout(
                deadline.as_millis() as u64,
            ))),
        }
    }

    async fn send(&self, request: &RestyleRequest<'_>) -> Result<Vec<u8>, RemoteError> {
        debug!(endpoint = %self.config.endpoint(), "Sending restyle request");

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RemoteError::new(RemoteErrorKind::Request(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::new(RemoteErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }

        let body: RestyleResponse = response.json().await.map_err(|e| {
            RemoteError::new(RemoteErrorKind::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        if let Some(refusal) = body.refusal {
            return Err(RemoteError::new(RemoteErrorKind::Policy(refusal)));
        }
        let encoded = body.image.ok_or_else(|| {
            RemoteError::new(RemoteErrorKind::InvalidResponse(
                "response carries no image".to_string(),
            ))
        })?;
        BASE64.decode(encoded.as_bytes()).map_err(|e| {
            RemoteError::new(RemoteErrorKind::InvalidResponse(format!(
                "image is not base64: {}",
                e
            )))
        })
    }
}

/// Check that the service returned an image and hand it back as PNG.
///
/// PNG bytes pass through untouched; any other decodable format is re-encoded
/// so the stored derivative matches its `.png` key.
fn ensure_png(bytes: Vec<u8>) -> Result<Vec<u8>, RemoteError> {
    let invalid = |reason: String| RemoteError::new(RemoteErrorKind::InvalidResponse(reason));

    let format = image::guess_format(&bytes)
        .map_err(|e| invalid(format!("response is not an image: {}", e)))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| invalid(format!("cannot decode {:?} response: {}", format, e)))?;
    if format == ImageFormat::Png {
        return Ok(bytes);
    }

    let mut out = std::io::Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| invalid(format!("cannot re-encode {:?} response: {}", format, e)))?;
    debug!(from = ?format, "Re-encoded remote output as PNG");
    Ok(out.into_inner())
}

#[async_trait]
impl RestyleStrategy for RemoteStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Remote
    }

    #[instrument(skip(self, source), fields(endpoint = %self.config.endpoint(), source_bytes = source.len()))]
    async fn apply(&self, source: &[u8]) -> MemoriaResult<Vec<u8>> {
        let request = RestyleRequest {
            image: BASE64.encode(source),
            prompt: self.config.style_prompt(),
        };
        let request = &request;

        let retry_strategy = ExponentialBackoff::from_millis(*self.config.initial_backoff_ms())
            .factor(2)
            .max_delay(Duration::from_secs(*self.config.max_delay_secs()))
            .map(jitter)
            .take(*self.config.max_retries());

        let output = Retry::spawn(retry_strategy, || async move {
            match self.attempt(request).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Remote restyle failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) if e.kind.is_policy() => {
                    info!(error = %e, "Remote service refused the image, not retrying");
                    Err(RetryError::Permanent(e))
                }
                Err(e) => {
                    warn!(error = %e, "Permanent remote restyle error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await?;

        let output = tokio::task::spawn_blocking(move || ensure_png(output))
            .await
            .map_err(|e| {
                RemoteError::new(RemoteErrorKind::InvalidResponse(format!(
                    "image check failed: {}",
                    e
                )))
            })??;

        info!(output_bytes = output.len(), "Remote restyle complete");
        Ok(output)
    }
}
