//! Ollama embedding adapter.
//!
//! Speaks the `/api/embed` endpoint of a local Ollama server. Transport
//! failures, bad statuses, unparseable bodies, and dimension/count
//! mismatches all map to [`ProviderError`]; retries live at the cache
//! boundary, not here.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use super::error::{ProviderError, ProviderResult};
use crate::config::EmbeddingConfig;
use crate::constants::DEFAULT_EMBED_TIMEOUT_SECS;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP client for an Ollama server's embedding endpoint.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl OllamaProvider {
    /// Creates a provider for `base_url` (scheme + host + port, no trailing
    /// slash required) serving `model` at `dimension`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> ProviderResult<Self> {
        Self::with_timeout(
            base_url,
            model,
            dimension,
            Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http {
                url: base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
            timeout,
        })
    }

    /// Creates a provider from the engine's embedding configuration.
    pub fn from_config(config: &EmbeddingConfig) -> ProviderResult<Self> {
        Self::with_timeout(
            config.base_url.clone(),
            config.model.clone(),
            config.dimension,
            config.call_timeout,
        )
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.embed_url();
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    ProviderError::Http {
                        url: url.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                url,
                message: format!("status {status}: {body}"),
            });
        }

        let body: EmbedResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    message: e.to_string(),
                })?;

        if body.embeddings.len() != texts.len() {
            return Err(ProviderError::CountMismatch {
                expected: texts.len(),
                actual: body.embeddings.len(),
            });
        }
        for values in &body.embeddings {
            if values.len() != self.dimension {
                return Err(ProviderError::DimensionMismatch {
                    expected: self.dimension,
                    actual: values.len(),
                });
            }
        }

        debug!(
            count = texts.len(),
            model = %self.model,
            "embedded batch via ollama"
        );

        Ok(body.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
