//! Minimal client for the Gemini `generateContent` REST endpoint.
//!
//! One request, one response: the dispatcher's protocol never retries and
//! never streams, so this client stays deliberately small. Tool use follows
//! the function-declaration wire format; a response is either text parts,
//! function-call parts, or a mix, and the caller decides what to honor.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A function the model is allowed to invoke.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    /// Tool name the model calls it by.
    pub name: String,
    /// What the tool does, for the model's benefit.
    pub description: String,
    /// Parameter schema (Gemini's OpenAPI subset).
    pub parameters: Value,
}

/// A function invocation emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the declared function.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub args: Value,
}

/// One part of a model turn: text or a function call.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    /// Plain text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Function invocation request.
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Client for one Gemini model behind an API credential.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for the given credential and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the API base URL (tests point this at a local mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, request: &GenerateRequest) -> Result<Vec<Part>> {
        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint(), self.api_key))
            .json(request)
            .send()
            .await
            .context("request to language model service failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("language model service returned {status}: {body}"));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed to parse language model response")?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("language model returned no candidates"))?;

        Ok(candidate.content.map(|c| c.parts).unwrap_or_default())
    }

    /// Sends one user message with a system instruction and tool
    /// declarations; returns the raw parts of the model's turn.
    pub async fn generate(
        &self,
        system: &str,
        message: &str,
        tools: Vec<FunctionDeclaration>,
    ) -> Result<Vec<Part>> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(message.to_string()),
                    function_call: None,
                }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some(system.to_string()),
                    function_call: None,
                }],
            }),
            tools: if tools.is_empty() {
                None
            } else {
                Some(vec![Tool {
                    function_declarations: tools,
                }])
            },
        };

        self.send(&request).await
    }

    /// Sends a plain prompt (no tools) and returns the concatenated text.
    pub async fn generate_text(&self, system: &str, prompt: &str) -> Result<String> {
        let parts = self.generate(system, prompt, Vec::new()).await?;
        let text = collect_text(&parts);
        if text.is_empty() {
            return Err(anyhow!("language model returned no text"));
        }
        Ok(text)
    }
}

/// Concatenates the text parts of a model turn.
#[must_use]
pub fn collect_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}
