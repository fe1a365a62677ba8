//! Correction service
//!
//! Sends raw recognized text to an Ollama-compatible generation endpoint
//! with the fixed instruction policy and returns corrected, tagged markup.
//! Correction is best-effort: every fault falls back to the raw text so a
//! document is always available.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::CorrectionConfig;

use super::policy;
use super::types::{CorrectedPayload, CorrectionError, GenerateRequest, GenerateResponse};

/// Transport for the correction model
#[async_trait]
pub trait CorrectionBackend: Send + Sync {
    /// Run one generation and return the raw model output.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, CorrectionError>;
}

/// HTTP backend for an Ollama-compatible endpoint
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &CorrectionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Check whether the endpoint is reachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl CorrectionBackend for HttpBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, CorrectionError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            system: system.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CorrectionError::Timeout
                } else {
                    CorrectionError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CorrectionError::Status { status, body });
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CorrectionError::Schema(e.to_string()))?;

        Ok(result.response)
    }
}

/// Correction service
pub struct CorrectionService {
    backend: Arc<dyn CorrectionBackend>,
}

impl CorrectionService {
    pub fn new(backend: Arc<dyn CorrectionBackend>) -> Self {
        Self { backend }
    }

    /// Correct raw OCR text into tagged markup.
    ///
    /// On any fault (endpoint unreachable, timeout, bad status, schema
    /// violation) the raw text is returned unchanged. This never raises.
    pub async fn correct(&self, raw_text: &str) -> String {
        let prompt = policy::build_prompt(raw_text);

        match self.try_correct(&prompt).await {
            Ok(corrected) => corrected,
            Err(e) => {
                tracing::warn!(
                    policy = policy::POLICY_VERSION,
                    "Correction fell back to raw text: {}",
                    e
                );
                raw_text.to_string()
            }
        }
    }

    async fn try_correct(&self, prompt: &str) -> Result<String, CorrectionError> {
        let output = self.backend.generate(policy::SYSTEM_PROMPT, prompt).await?;

        let payload: CorrectedPayload = serde_json::from_str(&output)
            .map_err(|e| CorrectionError::Schema(format!("{} in: {:.80}", e, output)))?;

        Ok(payload.corrected_text)
    }
}

/// Mock backend for testing
#[cfg(test)]
pub struct MockBackend {
    /// Exact prompt-substring to response mappings; first match wins
    pub responses: Vec<(String, String)>,
    /// When set, every call fails with this error message
    pub fail_with: Option<CorrectionError>,
}

#[cfg(test)]
impl MockBackend {
    pub fn failing(error: CorrectionError) -> Self {
        Self {
            responses: Vec::new(),
            fail_with: Some(error),
        }
    }

    /// Backend that answers with a fixed corrected payload whenever the
    /// prompt contains the given needle.
    pub fn answering(pairs: &[(&str, &str)]) -> Self {
        Self {
            responses: pairs
                .iter()
                .map(|(needle, corrected)| {
                    let payload = serde_json::to_string(&CorrectedPayload {
                        corrected_text: corrected.to_string(),
                    })
                    .unwrap();
                    (needle.to_string(), payload)
                })
                .collect(),
            fail_with: None,
        }
    }

    /// Backend that returns a payload violating the schema.
    pub fn malformed() -> Self {
        Self {
            responses: vec![(String::new(), r#"{"unexpected": 1}"#.to_string())],
            fail_with: None,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CorrectionBackend for MockBackend {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, CorrectionError> {
        if let Some(e) = &self.fail_with {
            return Err(match e {
                CorrectionError::Timeout => CorrectionError::Timeout,
                CorrectionError::Unreachable(m) => CorrectionError::Unreachable(m.clone()),
                CorrectionError::Status { status, body } => CorrectionError::Status {
                    status: *status,
                    body: body.clone(),
                },
                CorrectionError::Schema(m) => CorrectionError::Schema(m.clone()),
            });
        }

        for (needle, response) in &self.responses {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }

        Err(CorrectionError::Schema("no mock response".to_string()))
    }
}
