//! REST implementations of the capability traits.
//!
//! Thin wrappers over the vendor HTTP surfaces: an OpenAI-compatible
//! chat/image service, an image-analysis service, and a blob store. Each
//! client is built from [`ServicesConfig`]; the API key is resolved from the
//! environment variable the config names and never appears in config files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use parley_core::config::ServicesConfig;
use parley_core::types::JobStatus;
use parley_core::Turn;

use crate::error::ClientError;
use crate::{BlobStore, Caption, ChatCompletion, ImageGeneration, JobPoll, JobSubmission, SceneCaption};

const CHAT_TEMPERATURE: f64 = 0.7;
const CHAT_MAX_TOKENS: u32 = 800;
const CHAT_TOP_P: f64 = 0.95;
const GENERATION_RESOLUTION: &str = "1024x1024";
const CAPTION_API_VERSION: &str = "2023-02-01-preview";

/// Resolve the API key from the environment variable named in the config.
fn resolve_api_key(env_var: &str) -> Result<String, ClientError> {
    std::env::var(env_var).map_err(|_| ClientError::MissingCredential(env_var.to_string()))
}

/// Turn a non-success response into a `Status` error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

// =============================================================================
// Chat completion
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completion over the OpenAI-compatible deployments API.
#[derive(Debug)]
pub struct RestChatCompletion {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl RestChatCompletion {
    pub fn from_config(services: &ServicesConfig) -> Result<Self, ClientError> {
        let api_key = resolve_api_key(&services.api_key_env)?;
        let url = format!(
            "{}openai/deployments/{}/chat/completions?api-version={}",
            services.endpoint, services.chat_deployment, services.api_version
        );
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        })
    }
}

#[async_trait]
impl ChatCompletion for RestChatCompletion {
    async fn complete(
        &self,
        system_profile: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ClientError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system_profile.to_string(),
        });
        for turn in history {
            messages.push(ChatMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: utterance.to_string(),
        });

        debug!(messages = messages.len(), "Requesting chat completion");
        let request = ChatRequest {
            messages,
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
            top_p: CHAT_TOP_P,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response: ChatResponse = check_status(response).await?.json().await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClientError::Completion("response contained no choices".to_string()))
    }
}

// =============================================================================
// Image generation
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    caption: &'a str,
    resolution: &'a str,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: String,
    result: Option<PollResult>,
    error: Option<PollError>,
}

#[derive(Debug, Deserialize)]
struct PollResult {
    #[serde(rename = "contentUrl")]
    content_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollError {
    message: Option<String>,
}

/// Long-running text-to-image generation over the vendor's operations API.
///
/// `submit` answers with an `Operation-Location` header naming the operation
/// and a `Retry-after` header with the pacing the service wants.
pub struct RestImageGeneration {
    client: reqwest::Client,
    submit_url: String,
    api_key: String,
}

impl RestImageGeneration {
    pub fn from_config(services: &ServicesConfig) -> Result<Self, ClientError> {
        let api_key = resolve_api_key(&services.api_key_env)?;
        let submit_url = format!(
            "{}dalle/text-to-image?api-version={}",
            services.endpoint, services.image_api_version
        );
        Ok(Self {
            client: reqwest::Client::new(),
            submit_url,
            api_key,
        })
    }

    fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }
}

#[async_trait]
impl ImageGeneration for RestImageGeneration {
    async fn submit(&self, prompt: &str) -> Result<JobSubmission, ClientError> {
        debug!(prompt, "Submitting image generation");
        let response = self
            .client
            .post(&self.submit_url)
            .header("api-key", &self.api_key)
            .json(&GenerationRequest {
                caption: prompt,
                resolution: GENERATION_RESOLUTION,
            })
            .send()
            .await?;
        let response = check_status(response).await?;

        let operation_location =
            Self::header_value(&response, "Operation-Location").ok_or_else(|| {
                ClientError::Generation("response missing Operation-Location header".to_string())
            })?;
        let retry_after_secs = Self::header_value(&response, "Retry-after")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        Ok(JobSubmission {
            operation_location,
            retry_after_secs,
        })
    }

    async fn poll(&self, operation_location: &str) -> Result<JobPoll, ClientError> {
        let response = self
            .client
            .get(operation_location)
            .header("api-key", &self.api_key)
            .send()
            .await?;
        let response: PollResponse = check_status(response).await?.json().await?;

        let status = JobStatus::parse(&response.status);
        debug!(raw = %response.status, ?status, "Polled generation operation");
        Ok(JobPoll {
            status,
            result_url: response.result.and_then(|r| r.content_url),
            message: response.error.and_then(|e| e.message),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.client.get(url).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Scene captioning
// =============================================================================

#[derive(Debug, Serialize)]
struct CaptionRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    #[serde(rename = "captionResult")]
    caption_result: CaptionResult,
}

#[derive(Debug, Deserialize)]
struct CaptionResult {
    text: String,
    confidence: f64,
}

/// Scene captioning over the image-analysis API.
pub struct RestSceneCaption {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestSceneCaption {
    pub fn from_config(services: &ServicesConfig) -> Result<Self, ClientError> {
        let api_key = resolve_api_key(&services.api_key_env)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: services.vision_endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl SceneCaption for RestSceneCaption {
    async fn caption(&self, image_url: &str, language: &str) -> Result<Caption, ClientError> {
        let url = format!(
            "{}computervision/imageanalysis:analyze?features=caption&language={}&api-version={}",
            self.endpoint, language, CAPTION_API_VERSION
        );
        debug!(image_url, language, "Requesting scene caption");
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&CaptionRequest { url: image_url })
            .send()
            .await?;
        let response: CaptionResponse = check_status(response).await?.json().await?;

        Ok(Caption {
            text: response.caption_result.text,
            confidence: response.caption_result.confidence,
        })
    }
}

// =============================================================================
// Blob store
// =============================================================================

/// Blob store over a plain HTTP PUT/GET surface.
///
/// The configured endpoint is expected to carry its own authorization (a
/// shared-access signature or an anonymous container).
pub struct RestBlobStore {
    client: reqwest::Client,
    endpoint: String,
}

impl RestBlobStore {
    pub fn from_config(services: &ServicesConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: services.blob_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn blob_url(&self, container: &str, name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, container, name)
    }
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<String, ClientError> {
        let url = self.blob_url(container, name);
        debug!(url, size = bytes.len(), "Uploading blob");
        let response = self
            .client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes.to_vec())
            .send()
            .await?;
        check_status(response).await?;
        Ok(url)
    }

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.blob_url(container, name);
        let response = self.client.get(&url).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_reported() {
        let mut services = ServicesConfig::default();
        services.api_key_env = "PARLEY_TEST_KEY_UNSET".to_string();
        std::env::remove_var("PARLEY_TEST_KEY_UNSET");

        let err = RestChatCompletion::from_config(&services).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential(var) if var == "PARLEY_TEST_KEY_UNSET"));
    }

    #[test]
    fn test_chat_url_from_config() {
        let mut services = ServicesConfig::default();
        services.endpoint = "https://svc.example/".to_string();
        services.api_key_env = "PARLEY_TEST_KEY_CHAT".to_string();
        std::env::set_var("PARLEY_TEST_KEY_CHAT", "secret");

        let chat = RestChatCompletion::from_config(&services).unwrap();
        assert_eq!(
            chat.url,
            "https://svc.example/openai/deployments/gpt-35-turbo-16k/chat/completions\
             ?api-version=2023-03-15-preview"
        );
    }

    #[test]
    fn test_generation_url_from_config() {
        let mut services = ServicesConfig::default();
        services.endpoint = "https://svc.example/".to_string();
        services.api_key_env = "PARLEY_TEST_KEY_GEN".to_string();
        std::env::set_var("PARLEY_TEST_KEY_GEN", "secret");

        let imaging = RestImageGeneration::from_config(&services).unwrap();
        assert_eq!(
            imaging.submit_url,
            "https://svc.example/dalle/text-to-image?api-version=2023-09-15-preview"
        );
    }

    #[test]
    fn test_blob_url_joins_cleanly() {
        let mut services = ServicesConfig::default();
        services.blob_endpoint = "https://blobs.example/".to_string();
        let blobs = RestBlobStore::from_config(&services);
        assert_eq!(
            blobs.blob_url("images", "snapshot.jpg"),
            "https://blobs.example/images/snapshot.jpg"
        );
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: "perfil".to_string(),
            }],
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
            top_p: CHAT_TOP_P,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["top_p"], 0.95);
    }

    #[test]
    fn test_poll_response_parses_success_payload() {
        let raw = r#"{"id":"op-1","status":"Succeeded","result":{"contentUrl":"https://img.example/x.jpg"}}"#;
        let parsed: PollResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(JobStatus::parse(&parsed.status), JobStatus::Succeeded);
        assert_eq!(
            parsed.result.unwrap().content_url.as_deref(),
            Some("https://img.example/x.jpg")
        );
    }

    #[test]
    fn test_poll_response_parses_failure_payload() {
        let raw = r#"{"status":"Failed","error":{"message":"content filtered"}}"#;
        let parsed: PollResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(JobStatus::parse(&parsed.status), JobStatus::Failed);
        assert_eq!(
            parsed.error.unwrap().message.as_deref(),
            Some("content filtered")
        );
    }

    #[test]
    fn test_caption_response_parses_payload() {
        let raw = r#"{"captionResult":{"text":"um gato no sofá","confidence":0.87}}"#;
        let parsed: CaptionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.caption_result.text, "um gato no sofá");
        assert!((parsed.caption_result.confidence - 0.87).abs() < 1e-9);
    }
}
