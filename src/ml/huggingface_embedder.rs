use super::encoder::TextEncoder;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 15;
const MAX_TEXT_PREVIEW_LENGTH: usize = 100;

/// Sentence embeddings from the HuggingFace inference API.
#[derive(Clone)]
pub struct HuggingFaceEncoder {
    client: Client,
    api_key: String,
    model_url: String,
    model_name: String,
    dim: usize,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    inputs: &'a str,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize, Default)]
struct EmbeddingObject {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    embedding: Vec<f32>,
}

impl HuggingFaceEncoder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model_name: &str,
        dim: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("HuggingFace API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECONDS).min(timeout))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let model_url = format!("{}/models/{}", base_url.trim_end_matches('/'), model_name);

        info!(
            "HuggingFace encoder ready: model={}, dim={}, timeout={}s",
            model_name,
            dim,
            timeout.as_secs()
        );

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model_url,
            model_name: model_name.to_string(),
            dim,
        })
    }

    async fn request(&self, text: &str) -> Result<Value> {
        let request = EncodeRequest {
            inputs: text,
            options: Options {
                wait_for_model: true,
                use_cache: true,
            },
        };

        let response = self
            .client
            .post(&self.model_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, &body));
        }

        Ok(response.json::<Value>().await?)
    }

    fn status_error(&self, status: StatusCode, body: &str) -> AppError {
        let message = match status {
            StatusCode::NOT_FOUND => format!(
                "Model not found: {}. Check APP_HUGGINGFACE_MODEL.",
                self.model_name
            ),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                "Authentication failed. Check APP_HUGGINGFACE_API_KEY.".to_string()
            }
            StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded on HuggingFace API".to_string(),
            _ => format!("HuggingFace API returned {}: {}", status, body),
        };
        AppError::ExternalService(message)
    }
}

/// Extracts one embedding from the shapes the inference API is known to return:
/// `[f32]`, `[[f32]]`, `{"embedding": [f32]}` or `{"embeddings": [[f32]]}`.
pub(crate) fn parse_embedding_response(value: Value) -> Result<Vec<f32>> {
    let embedding = match value {
        Value::Array(items) => match items.first() {
            None => {
                return Err(AppError::ExternalService(
                    "Received empty array from model".to_string(),
                ))
            }
            Some(Value::Array(first)) => first
                .iter()
                .filter_map(Value::as_f64)
                .map(|f| f as f32)
                .collect(),
            Some(_) => items
                .iter()
                .filter_map(Value::as_f64)
                .map(|f| f as f32)
                .collect(),
        },
        Value::Object(_) => {
            let parsed: EmbeddingObject = serde_json::from_value(value)?;
            if !parsed.embedding.is_empty() {
                parsed.embedding
            } else {
                parsed.embeddings.into_iter().next().unwrap_or_default()
            }
        }
        _ => Vec::new(),
    };

    if embedding.is_empty() {
        return Err(AppError::ExternalService(
            "Failed to extract embedding from response".to_string(),
        ));
    }
    Ok(embedding)
}

#[async_trait]
impl TextEncoder for HuggingFaceEncoder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let preview: String = text.chars().take(MAX_TEXT_PREVIEW_LENGTH).collect();
        debug!("Encoding text (length: {}): {}", text.len(), preview);

        let embedding = parse_embedding_response(self.request(text).await?)?;
        if embedding.len() != self.dim {
            return Err(AppError::DimensionMismatch {
                expected: self.dim,
                got: embedding.len(),
            });
        }

        debug!("Got embedding of size {} from HuggingFace API", embedding.len());
        Ok(embedding)
    }
}
