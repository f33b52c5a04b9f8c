//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! Requests carry the `google_search` tool so answers come back with
//! grounding chunks, which become the panel's numbered sources.

use std::time::Duration;

use async_trait::async_trait;
use prospecto_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::AnalysisError;
use crate::retry::retry_with_backoff;
use crate::types::{GenerateRequest, GenerateResponse, ModelReply};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A text model that answers enrichment prompts.
#[async_trait]
pub trait EnrichmentModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<ModelReply, AnalysisError>;
}

/// Client for the Gemini API.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GeminiClient {
    /// Builds a client from the loaded application config.
    ///
    /// A missing API key is not an error here; it surfaces from
    /// [`GeminiClient::generate`] so only the enrichment action fails.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AnalysisError::InvalidBaseUrl`] for a malformed endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let client = Self::with_base_url(
            config.gemini_api_key.as_deref(),
            &config.gemini_model,
            &config.endpoints.gemini_url,
            config.ai_request_timeout_secs,
        )?;
        Ok(client.with_retry(config.ai_max_retries, config.ai_retry_backoff_base_ms))
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// `timeout_secs == 0` leaves the request unbounded.
    ///
    /// # Errors
    ///
    /// Same as [`GeminiClient::from_config`].
    pub fn with_base_url(
        api_key: Option<&str>,
        model: &str,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, AnalysisError> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build()?;

        let raw = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let normalised = format!("{}/", raw.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AnalysisError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
            model: model.to_owned(),
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sends `prompt` with search grounding and returns the first candidate.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingApiKey`] when no key is configured.
    /// - [`AnalysisError::UnexpectedStatus`] / [`AnalysisError::Http`] once
    ///   retries are exhausted.
    /// - [`AnalysisError::Deserialize`] if the envelope is not JSON.
    pub async fn generate(&self, prompt: &str) -> Result<ModelReply, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalysisError::MissingApiKey("GEMINI_API_KEY"))?;
        let url = self.endpoint()?;

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Gemini generateContent request");

        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_once(&url, api_key, prompt)
        })
        .await?;

        let reply = ModelReply::from(response);
        tracing::info!(
            model = %self.model,
            reply_len = reply.text.len(),
            sources = reply.citations.len(),
            "Gemini reply received"
        );
        Ok(reply)
    }

    fn endpoint(&self) -> Result<Url, AnalysisError> {
        let path = format!("models/{}:generateContent", self.model);
        self.base_url
            .join(&path)
            .map_err(|e| AnalysisError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    async fn post_once(
        &self,
        url: &Url,
        api_key: &str,
        prompt: &str,
    ) -> Result<GenerateResponse, AnalysisError> {
        let response = self
            .client
            .post(url.clone())
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest::grounded(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalysisError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AnalysisError::Deserialize {
            context: "Gemini generateContent".to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl EnrichmentModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<ModelReply, AnalysisError> {
        self.generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_model_and_method() {
        let client = GeminiClient::with_base_url(
            Some("k"),
            "gemini-2.5-flash",
            "https://generativelanguage.googleapis.com/v1beta",
            0,
        )
        .unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let client = GeminiClient::with_base_url(Some("  "), "m", "http://localhost", 0).unwrap();
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn generate_without_key_fails_before_sending() {
        let client = GeminiClient::with_base_url(None, "m", "http://127.0.0.1:1", 0).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingApiKey("GEMINI_API_KEY")));
        assert!(err.is_banner());
    }
}
