use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "APP";

/// Which text encoder backs the embedding adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderBackend {
    HuggingFace,
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub favorites_path: PathBuf,
    pub encoder: EncoderBackend,
    pub huggingface_api_key: Option<String>,
    pub huggingface_base_url: String,
    pub huggingface_model: String,
    pub embedding_dim: usize,
    pub encoder_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    pub google_books_url: String,
    pub openlibrary_url: String,
}

impl Config {
    /// Load settings from defaults overridden by `APP_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("favorites_path", "favorites.json")?
            .set_default("encoder", "huggingface")?
            .set_default("huggingface_base_url", "https://api-inference.huggingface.co")?
            .set_default("huggingface_model", "sentence-transformers/all-MiniLM-L6-v2")?
            .set_default("embedding_dim", 384)?
            .set_default("encoder_timeout_secs", 30)?
            .set_default("lookup_timeout_secs", 10)?
            .set_default(
                "google_books_url",
                "https://www.googleapis.com/books/v1/volumes",
            )?
            .set_default(
                "openlibrary_url",
                "https://openlibrary.org/api/volumes/brief/isbn",
            )?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(AppError::Config(
                "embedding_dim must be greater than zero".to_string(),
            ));
        }

        if self.encoder == EncoderBackend::HuggingFace
            && self
                .huggingface_api_key
                .as_deref()
                .map_or(true, |key| key.trim().is_empty())
        {
            return Err(AppError::Config(
                "APP_HUGGINGFACE_API_KEY must be set when APP_ENCODER=huggingface".to_string(),
            ));
        }

        Ok(())
    }

    pub fn encoder_timeout(&self) -> Duration {
        Duration::from_secs(self.encoder_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            favorites_path: PathBuf::from("favorites.json"),
            encoder: EncoderBackend::Hashing,
            huggingface_api_key: None,
            huggingface_base_url: "https://api-inference.huggingface.co".to_string(),
            huggingface_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            embedding_dim: 384,
            encoder_timeout_secs: 30,
            lookup_timeout_secs: 10,
            google_books_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            openlibrary_url: "https://openlibrary.org/api/volumes/brief/isbn".to_string(),
        }
    }

    #[test]
    fn test_hashing_encoder_needs_no_key() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_huggingface_requires_api_key() {
        let mut config = sample();
        config.encoder = EncoderBackend::HuggingFace;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.huggingface_api_key = Some("   ".to_string());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.huggingface_api_key = Some("hf_test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = sample();
        config.embedding_dim = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_encoder_backend_names() {
        let backend: EncoderBackend = serde_json::from_str("\"hashing\"").unwrap();
        assert_eq!(backend, EncoderBackend::Hashing);
        let backend: EncoderBackend = serde_json::from_str("\"huggingface\"").unwrap();
        assert_eq!(backend, EncoderBackend::HuggingFace);
    }
}
