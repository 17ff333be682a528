//! Azure OpenAI client
//!
//! Blocking HTTP client for Azure OpenAI deployments. One client serves both
//! the embedding deployment and the chat-completion deployment; the API key is
//! sent in the `api-key` header and the API version as a query parameter.

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::{CompletionRequest, GenerationError, GenerationProvider};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Azure OpenAI resource and deployment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// REST API version, e.g. `2024-02-01`
    pub api_version: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Deployment name of the embedding model
    pub embedding_deployment: String,
    /// Deployment name of the chat-completion model
    pub completion_deployment: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://your-resource.openai.azure.com".to_string(),
            api_version: "2024-02-01".to_string(),
            api_key_env: "AZURE_OPENAI_API_KEY".to_string(),
            embedding_deployment: "text-embedding-ada-002".to_string(),
            completion_deployment: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Azure OpenAI embedding and completion client
pub struct AzureOpenAiClient {
    http: Client,
    api_key: String,
    embeddings_url: String,
    chat_url: String,
    embedding_deployment: String,
    completion_deployment: String,
}

impl AzureOpenAiClient {
    /// Create a client with an explicit API key
    pub fn new(config: &AzureConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            embeddings_url: deployment_url(config, &config.embedding_deployment, "embeddings"),
            chat_url: deployment_url(config, &config.completion_deployment, "chat/completions"),
            embedding_deployment: config.embedding_deployment.clone(),
            completion_deployment: config.completion_deployment.clone(),
        })
    }

    /// Create a client, reading the API key from `config.api_key_env`
    pub fn from_env(config: &AzureConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| RagError::InvalidConfigValue {
            path: "azure.api_key_env".to_string(),
            message: format!("Environment variable {} is not set", config.api_key_env),
        })?;

        if api_key.trim().is_empty() {
            return Err(RagError::InvalidConfigValue {
                path: "azure.api_key_env".to_string(),
                message: format!("Environment variable {} is empty", config.api_key_env),
            });
        }

        Self::new(config, api_key)
    }

    pub fn embeddings_url(&self) -> &str {
        &self.embeddings_url
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    fn post<T: Serialize>(&self, url: &str, body: &T) -> std::result::Result<(u16, String), String> {
        let response = self
            .http
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let text = response.text().map_err(|e| e.to_string())?;
        Ok((status, text))
    }
}

fn deployment_url(config: &AzureConfig, deployment: &str, operation: &str) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        config.endpoint.trim_end_matches('/'),
        deployment,
        operation,
        config.api_version
    )
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_embedding_response(body: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
    let response: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

    response
        .data
        .into_iter()
        .next()
        .map(|data| data.embedding)
        .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding returned".to_string()))
}

fn parse_completion_response(body: &str) -> std::result::Result<String, GenerationError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(GenerationError::EmptyCompletion)
}

impl EmbeddingProvider for AzureOpenAiClient {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        tracing::debug!(
            "Requesting embedding from {} ({} chars)",
            self.embedding_deployment,
            text.len()
        );

        let (status, body) = self
            .post(&self.embeddings_url, &EmbeddingRequest { input: text })
            .map_err(EmbeddingError::Request)?;

        if !is_success(status) {
            return Err(EmbeddingError::Api { status, body });
        }

        parse_embedding_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.embedding_deployment
    }
}

impl GenerationProvider for AzureOpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, GenerationError> {
        tracing::debug!(
            "Requesting completion from {} (max_tokens={}, temperature={})",
            self.completion_deployment,
            request.max_tokens,
            request.temperature
        );

        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let (status, body) = self
            .post(&self.chat_url, &body)
            .map_err(GenerationError::Request)?;

        if !is_success(status) {
            return Err(GenerationError::Api { status, body });
        }

        parse_completion_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.completion_deployment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AzureConfig {
        AzureConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            ..AzureConfig::default()
        }
    }

    #[test]
    fn test_deployment_urls() {
        let client = AzureOpenAiClient::new(&test_config(), "secret").unwrap();
        assert_eq!(
            client.embeddings_url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2024-02-01"
        );
        assert_eq!(
            client.chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = AzureConfig {
            api_key_env: "RAG_PIPELINE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..test_config()
        };
        let result = AzureOpenAiClient::from_env(&config);
        assert!(matches!(result, Err(RagError::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_parse_embedding_response() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.25,-0.5,1.0]}],"model":"ada"}"#;
        assert_eq!(parse_embedding_response(body).unwrap(), vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_parse_embedding_response_without_data() {
        let result = parse_embedding_response(r#"{"data":[]}"#);
        assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));

        let result = parse_embedding_response("not json");
        assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_completion_response() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Paris."},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_completion_response(body).unwrap(), "Paris.");
    }

    #[test]
    fn test_parse_completion_without_content() {
        let result = parse_completion_response(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(GenerationError::EmptyCompletion)));

        let result =
            parse_completion_response(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#);
        assert!(matches!(result, Err(GenerationError::EmptyCompletion)));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: "ctx",
                },
                ChatMessage {
                    role: "user",
                    content: "q",
                },
            ],
            max_tokens: 150,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    #[ignore] // Requires a live Azure OpenAI deployment and AZURE_OPENAI_API_KEY
    fn test_live_embedding() {
        let client = AzureOpenAiClient::from_env(&AzureConfig::default()).unwrap();
        let embedding = client.embed("The cat sat on the mat").unwrap();
        assert!(!embedding.is_empty());
    }
}
