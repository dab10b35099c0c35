//! Gemini vision client for focal-point detection.
//!
//! Sends the original screenshot inline (base64) together with an instruction
//! and asks for a JSON answer of the form
//! `{"focalPoint": {"x": .., "y": ..}, "description": ".."}`.

use std::time::Instant;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::traits::{FocalAnalysis, ImageAnalyzer};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::render::SourceImage;

/// Longest slice of an error body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// Gemini API client.
pub struct GeminiAnalyzer {
    api_key: String,
    endpoint: String,
    model: String,
    instruction: String,
    temperature: f32,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiAnalyzer {
    /// Create a client, reading the API key from the configured environment variable.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key<S: Into<String>>(api_key: S, config: &AnalysisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AnalysisError::RequestFailed {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            instruction: config.instruction.clone(),
            temperature: config.temperature,
            client,
        })
    }

    /// `generateContent` URL without the key query parameter
    pub fn request_url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request<'a>(&'a self, image: &'a SourceImage) -> GeminiRequest<'a> {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type(),
                            data: STANDARD.encode(image.bytes()),
                        },
                    },
                    Part::Text {
                        text: &self.instruction,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, image: &SourceImage) -> Result<FocalAnalysis> {
        let started = Instant::now();
        let request = self.build_request(image);

        debug!(
            "Sending {} ({}, {} bytes) to {}",
            image.name(),
            image.mime_type(),
            image.bytes().len(),
            self.model
        );

        let response = self
            .client
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::RequestFailed {
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.without_url().to_string()
                },
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AnalysisError::RequestFailed {
            reason: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            warn!("Gemini returned {} for {}", status, image.name());
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(AnalysisError::BadStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let analysis = parse_response(&body)?;
        info!(
            "Analyzed {} in {:?}: ({:.1}, {:.1}) {}",
            image.name(),
            started.elapsed(),
            analysis.focal_point.x,
            analysis.focal_point.y,
            analysis.description
        );
        Ok(analysis)
    }
}

/// Parse a raw `generateContent` response body into a clamped analysis.
pub fn parse_response(body: &str) -> Result<FocalAnalysis> {
    let response: GeminiResponse = serde_json::from_str(body).map_err(|e| AnalysisError::ParseFailed {
        reason: format!("invalid response envelope: {}", e),
    })?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::ParseFailed {
            reason: "response contained no text".to_string(),
        }
        .into());
    }

    parse_analysis_text(&text)
}

/// Parse the model's text answer, tolerating a surrounding ```json fence.
pub fn parse_analysis_text(text: &str) -> Result<FocalAnalysis> {
    let json = extract_json(text).ok_or_else(|| AnalysisError::ParseFailed {
        reason: "no JSON object in response".to_string(),
    })?;

    let analysis: FocalAnalysis = serde_json::from_str(json).map_err(|e| AnalysisError::ParseFailed {
        reason: e.to_string(),
    })?;

    Ok(analysis.clamped())
}

/// Find the JSON object in a model answer.
///
/// Prefers a ```json fenced block, then falls back to the outermost `{...}`.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(marker) = text.find("```json") {
        let start = marker + "```json".len();
        if let Some(len) = text[start..].find("```") {
            return Some(text[start..start + len].trim());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
