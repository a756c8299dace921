//! Google Gemini provider implementation

use super::types::{
    GenerationParams, LlmRequest, LlmResponse, MessageRole, SafetySetting, Usage,
};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    endpoint: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(
        api_key: String,
        model: &str,
        api_root: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let root = api_root.unwrap_or(DEFAULT_API_ROOT).trim_end_matches('/');
        let endpoint = format!("{root}/models/{model}:generateContent");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let system_instruction = if request.system.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: request
                        .system
                        .iter()
                        .map(|s| s.text.as_str())
                        .collect::<Vec<_>>()
                        .join("\n\n"),
                }],
            })
        };

        let contents = request
            .messages
            .iter()
            .filter(|msg| !msg.text.is_empty())
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: msg.text.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: request.generation.map(GeminiGenerationConfig::from),
            safety_settings: if request.safety.is_empty() {
                None
            } else {
                Some(request.safety.clone())
            },
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed("No candidates in response"))?;

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::malformed("Candidate contained no text"));
        }

        let usage = resp.usage_metadata.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_token_count),
            output_tokens: u64::from(u.candidates_token_count),
        });

        Ok(LlmResponse { text, usage })
    }
}

/// Map a non-success HTTP status to a classified error
fn error_from_status(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |r| r.error.message);
    match status {
        400 => LlmError::invalid_request(format!("Invalid request: {message}")),
        401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
        429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
        500..=599 => LlmError::server_error(format!("Server error: {message}")),
        _ => LlmError::unknown(format!("HTTP {status}: {message}")),
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::malformed(format!("Failed to parse response: {e}")))?;

        Self::normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<GenerationParams> for GeminiGenerationConfig {
    fn from(p: GenerationParams) -> Self {
        Self {
            temperature: p.temperature,
            top_p: p.top_p,
            top_k: p.top_k,
            max_output_tokens: p.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FailureClass, LlmErrorKind, LlmMessage, SystemContent};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn full_request() -> LlmRequest {
        LlmRequest {
            system: vec![SystemContent::new("be helpful"), SystemContent::new("be brief")],
            messages: vec![
                LlmMessage::user("hi"),
                LlmMessage::assistant("hello"),
                LlmMessage::user("where is the beach?"),
            ],
            generation: Some(GenerationParams::default()),
            safety: SafetySetting::standard(),
        }
    }

    #[test]
    fn translate_full_request() {
        let value = serde_json::to_value(GeminiService::translate_request(&full_request())).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be helpful\n\nbe brief");
        assert_eq!(value["contents"].as_array().unwrap().len(), 3);
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(value["safetySettings"][0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn translate_minimal_request_omits_overrides() {
        let request = LlmRequest {
            system: vec![SystemContent::new("be helpful")],
            messages: vec![LlmMessage::user("hi")],
            ..LlmRequest::default()
        };
        let value = serde_json::to_value(GeminiService::translate_request(&request)).unwrap();

        assert!(value.get("generationConfig").is_none());
        assert!(value.get("safetySettings").is_none());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let resp: GeminiResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        let err = GeminiService::normalize_response(resp).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::MalformedResponse);
    }

    #[test]
    fn candidate_text_parts_are_joined() {
        let resp: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}],
                "usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":3}}"#,
        )
        .unwrap();
        let out = GeminiService::normalize_response(resp).unwrap();
        assert_eq!(out.text, "Hello there");
        assert_eq!(out.usage.input_tokens, 12);
    }

    #[test]
    fn status_mapping() {
        let body = r#"{"error":{"code":400,"message":"bad field","status":"INVALID_ARGUMENT"}}"#;
        let err = error_from_status(400, body);
        assert_eq!(err.class(), FailureClass::Retryable);
        assert!(err.message.contains("bad field"));

        assert_eq!(error_from_status(403, "nope").class(), FailureClass::Unauthorized);
        assert_eq!(error_from_status(401, "").class(), FailureClass::Unauthorized);
        assert_eq!(error_from_status(503, "").kind, LlmErrorKind::ServerError);
        assert_eq!(error_from_status(418, "").kind, LlmErrorKind::Unknown);
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn complete_against_local_backend() {
        let router = Router::new().route(
            "/models/test-model:generateContent",
            post(|Json(body): Json<Value>| async move {
                let asked = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("").to_string();
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": format!("echo: {asked}")}]}}]
                }))
            }),
        );
        let root = serve(router).await;
        let service =
            GeminiService::new("k".into(), "test-model", Some(&root), Duration::from_secs(5)).unwrap();

        let out = service
            .complete(&LlmRequest {
                messages: vec![LlmMessage::user("ping")],
                ..LlmRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(out.text, "echo: ping");
    }

    #[tokio::test]
    async fn bad_request_status_is_classified() {
        let router = Router::new().route(
            "/models/test-model:generateContent",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"code": 400, "message": "Invalid JSON payload"}})),
                )
            }),
        );
        let root = serve(router).await;
        let service =
            GeminiService::new("k".into(), "test-model", Some(&root), Duration::from_secs(5)).unwrap();

        let err = service.complete(&LlmRequest::default()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::InvalidRequest);
    }
}
