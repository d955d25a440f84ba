//! Gemini `generateContent` transport for [`GenerativeModel`].

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use libris_kernel::settings::RecommendationSettings;
use serde::Deserialize;
use serde_json::json;

use super::client::{GenerateRequest, GenerativeModel, RecommendationError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Upper bound on how much of an error body ends up in logs.
const ERROR_BODY_LIMIT: usize = 512;

pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &RecommendationSettings, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(format!("libris/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build recommendation HTTP client")?;

        Ok(Self {
            http,
            url: generate_url(&settings.endpoint, &settings.model),
            api_key,
        })
    }
}

fn generate_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}

/// Body of a `generateContent` call with structured JSON output.
pub fn request_body(request: &GenerateRequest) -> serde_json::Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Concatenated text of the first candidate.
pub fn response_text(body: &str) -> Result<String, RecommendationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| RecommendationError::MalformedResponse(err.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(RecommendationError::ServiceError(format!(
            "prompt blocked: {reason}"
        )));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(RecommendationError::MalformedResponse(
            "response carried no text".to_string(),
        ));
    }
    Ok(text)
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, RecommendationError> {
        let response = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|err| {
                let reason = if err.is_timeout() {
                    "request timed out".to_string()
                } else {
                    format!("request failed: {err}")
                };
                RecommendationError::ServiceError(reason)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RecommendationError::ServiceError(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            return Err(RecommendationError::ServiceError(format!(
                "service answered {}: {}",
                status.as_u16(),
                truncate(&body)
            )));
        }

        response_text(&body)
    }
}
