//! Client for the replacement-copy generation collaborator.
//!
//! Posts one [`GenerationRequest`] per campaign to `{base}/generate` and
//! expects `{"replacements": [...]}` back.

use pmax_core::{GenerationRequest, ReplacementCopy};
use pmax_engine::GenerationResult;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::RelayError;
use crate::retry::retry_with_backoff;
use crate::{build_client, check_status, parse_url, RelayConfig};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    replacements: Vec<ReplacementCopy>,
}

pub struct HttpCopyGenerator {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    config: RelayConfig,
}

impl HttpCopyGenerator {
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidUrl`] for a malformed base URL, or
    /// [`RelayError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        config: RelayConfig,
    ) -> Result<Self, RelayError> {
        let base = parse_url(&format!("{}/", base_url.trim_end_matches('/')))?;
        let endpoint = base.join("generate").map_err(|e| RelayError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint,
            api_key: api_key.map(str::to_owned),
            config,
        })
    }

    async fn post_once(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<ReplacementCopy>, RelayError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = check_status(self.endpoint.as_str(), builder.send().await?).await?;
        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| RelayError::Deserialize {
                context: format!("generate(campaign={})", request.campaign_name),
                source: e,
            })?;
        Ok(parsed.replacements)
    }

    /// Request replacement copy for one campaign's flagged text assets.
    ///
    /// Replacements for identities that were not requested are dropped.
    ///
    /// # Errors
    ///
    /// Returns the last [`RelayError`] once retries are exhausted.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<ReplacementCopy>, RelayError> {
        if request.targets.is_empty() {
            return Ok(Vec::new());
        }

        let copies = retry_with_backoff(
            "copy-generator",
            self.config.max_retries,
            self.config.backoff_base_ms,
            || self.post_once(request),
        )
        .await?;

        let requested: std::collections::HashSet<&str> = request
            .targets
            .iter()
            .map(|t| t.asset_identity.as_str())
            .collect();
        let kept: Vec<ReplacementCopy> = copies
            .into_iter()
            .filter(|c| requested.contains(c.asset_identity.as_str()) && !c.text.trim().is_empty())
            .collect();

        tracing::info!(
            campaign = %request.campaign_name,
            requested = request.targets.len(),
            received = kept.len(),
            "replacement copy generated"
        );
        Ok(kept)
    }

    /// Run every request. A failing campaign does not discard copy already
    /// generated for the others.
    pub async fn generate_all(&self, requests: &[GenerationRequest]) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::default();
        for request in requests {
            match self.generate(request).await {
                Ok(copies) => outcome.replacements.extend(copies),
                Err(error) => {
                    tracing::error!(
                        campaign = %request.campaign_name,
                        error = %error,
                        "replacement generation failed for campaign"
                    );
                    outcome.failures.push((request.campaign_name.clone(), error));
                }
            }
        }
        outcome
    }
}

/// Copies delivered across every campaign request, plus the campaigns that failed.
#[derive(Debug, Default)]
pub struct GenerationOutcome {
    pub replacements: Vec<ReplacementCopy>,
    pub failures: Vec<(String, RelayError)>,
}

impl GenerationOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// One line naming every failed campaign, or `None` when all succeeded.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|(campaign, error)| format!("campaign '{campaign}': {error}"))
            .collect();
        Some(parts.join("; "))
    }
}

impl From<GenerationOutcome> for GenerationResult {
    fn from(outcome: GenerationOutcome) -> Self {
        let error = outcome.error_summary();
        GenerationResult {
            replacements: outcome.replacements,
            error,
        }
    }
}
