//! Backend endpoint catalog and HTTP plumbing.
//!
//! One user action maps to one generation attempt against a provider's
//! candidate endpoints, tried in a fixed fallback order — the first
//! success is used and the rest are skipped. This is a static ordering,
//! not a retry policy: there is no backoff and no second pass.

use archgenie_core::{CostEstimate, CostItem, GenerationRequest, GenerationResult, Settings};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::parse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API key required — save one with `archgenie config set-key` before generating")]
    MissingApiKey,
    #[error("backend returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Cloud provider selecting which endpoints to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Azure,
    Aws,
    Gcp,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
        }
    }

    /// Whether any endpoint for this provider can return live cost data.
    /// GCP only has the fixed-response mock.
    pub fn supports_cost(&self) -> bool {
        !matches!(self, Provider::Gcp)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azure" => Ok(Provider::Azure),
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            other => Err(format!("unknown provider: {other} (expected azure, aws, or gcp)")),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

/// One candidate endpoint in a provider's fallback chain.
struct Candidate {
    method: Method,
    path: &'static str,
    body: Option<serde_json::Value>,
}

/// The fixed fallback order per provider: the primary endpoint plus any
/// fallbacks. AWS tries the live diagram+cost endpoint first and falls
/// back to the mock; Azure and GCP each have a single endpoint.
fn candidates_for(provider: Provider, request: &GenerationRequest) -> (Candidate, Vec<Candidate>) {
    match provider {
        Provider::Azure => (
            Candidate {
                method: Method::Post,
                path: "/mcp/azure/diagram-tf",
                body: Some(serde_json::json!({
                    "app_name": request.app_name,
                    "prompt": request.prompt,
                    "region": request.region,
                })),
            },
            vec![],
        ),
        Provider::Aws => (
            Candidate {
                method: Method::Post,
                path: "/mcp/aws/diagram-tf-cost",
                body: Some(serde_json::json!({
                    "prompt": request.prompt,
                    "format": "svg",
                })),
            },
            vec![Candidate {
                method: Method::Get,
                path: "/mcp/aws/diagram-tf",
                body: None,
            }],
        ),
        Provider::Gcp => (
            Candidate {
                method: Method::Get,
                path: "/mcp/gcp/diagram-tf",
                body: None,
            },
            vec![],
        ),
    }
}

/// Body for the standalone `/estimate` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EstimateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CostItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    estimate: CostEstimate,
}

/// HTTP client for the ArchGenie backend. Construction fails up front
/// when no API key is configured, so a missing credential never turns
/// into a network call.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Client {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        if !settings.has_api_key() {
            return Err(ClientError::MissingApiKey);
        }
        Ok(Client {
            http: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.trim().to_string(),
        })
    }

    /// Run one generation action: walk the provider's candidate chain,
    /// normalize the first successful body.
    pub async fn generate(
        &self,
        provider: Provider,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ClientError> {
        let (first, fallbacks) = candidates_for(provider, request);

        let mut last_err = match self.send(&first).await {
            Ok(body) => return Ok(parse::normalize(&body)),
            Err(e) => e,
        };
        for candidate in &fallbacks {
            tracing::warn!(
                provider = provider.as_str(),
                path = candidate.path,
                "endpoint failed, falling back: {last_err}"
            );
            match self.send(candidate).await {
                Ok(body) => return Ok(parse::normalize(&body)),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Request a standalone cost estimate.
    pub async fn estimate(&self, request: &EstimateRequest) -> Result<CostEstimate, ClientError> {
        let body = self
            .send(&Candidate {
                method: Method::Post,
                path: "/estimate",
                body: Some(serde_json::to_value(request).unwrap_or_default()),
            })
            .await?;
        let parsed: EstimateResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Malformed(format!("estimate: {e}")))?;
        Ok(parsed.estimate)
    }

    /// Issue one request. Non-success responses surface their body text
    /// verbatim as the error message.
    async fn send(&self, candidate: &Candidate) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, candidate.path);
        tracing::debug!(url, method = ?candidate.method, "sending request");
        let builder = match candidate.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url).json(
                candidate
                    .body
                    .as_ref()
                    .unwrap_or(&serde_json::Value::Object(Default::default())),
            ),
        };
        let response = builder.header("x-api-key", &self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_blocks_before_any_network_call() {
        let settings = Settings::default();
        assert!(matches!(
            Client::new(&settings),
            Err(ClientError::MissingApiKey)
        ));
    }

    #[test]
    fn aws_falls_back_from_cost_endpoint_to_mock() {
        let req = GenerationRequest::default();
        let (first, fallbacks) = candidates_for(Provider::Aws, &req);
        assert_eq!(first.path, "/mcp/aws/diagram-tf-cost");
        assert_eq!(first.method, Method::Post);
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].path, "/mcp/aws/diagram-tf");
        assert_eq!(fallbacks[0].method, Method::Get);
    }

    #[test]
    fn azure_body_carries_form_parameters() {
        let req = GenerationRequest {
            app_name: "3-tier web app".to_string(),
            prompt: Some("with a queue".to_string()),
            region: Some("eastus".to_string()),
        };
        let (first, fallbacks) = candidates_for(Provider::Azure, &req);
        assert!(fallbacks.is_empty());
        let body = first.body.as_ref().unwrap();
        assert_eq!(body["app_name"], "3-tier web app");
        assert_eq!(body["prompt"], "with a queue");
        assert_eq!(body["region"], "eastus");
    }

    #[test]
    fn aws_cost_body_requests_svg_format() {
        let req = GenerationRequest::default();
        let (first, _) = candidates_for(Provider::Aws, &req);
        let body = first.body.as_ref().unwrap();
        assert_eq!(body["format"], "svg");
    }

    #[test]
    fn provider_parsing() {
        assert_eq!("AWS".parse::<Provider>().unwrap(), Provider::Aws);
        assert!("oracle".parse::<Provider>().is_err());
        assert!(Provider::Azure.supports_cost());
        assert!(!Provider::Gcp.supports_cost());
    }
}
