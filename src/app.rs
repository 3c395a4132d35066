use crate::{
    config::{Config, EncoderBackend},
    error::{AppError, Result},
    ml::{EmbeddingAdapter, HashingEncoder, HuggingFaceEncoder, TextEncoder},
    routes::api_routes,
    services::{FallbackLookup, JsonFavoritesStore, MatchOrchestrator},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener, e.g. a random port in tests.
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let orchestrator = build_orchestrator(&self.config)
            .context("Failed to initialize match orchestrator")?;
        let orchestrator = web::Data::new(orchestrator);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(orchestrator.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}

fn build_encoder(config: &Config) -> Result<Arc<dyn TextEncoder>> {
    match config.encoder {
        EncoderBackend::HuggingFace => {
            let api_key = config.huggingface_api_key.as_deref().ok_or_else(|| {
                AppError::Config("APP_HUGGINGFACE_API_KEY is required".to_string())
            })?;
            info!("Using Hugging Face encoder {}", config.huggingface_model);
            let encoder = HuggingFaceEncoder::new(
                api_key,
                &config.huggingface_base_url,
                &config.huggingface_model,
                config.embedding_dim,
                config.encoder_timeout(),
            )?;
            Ok(Arc::new(encoder))
        }
        EncoderBackend::Hashing => {
            info!("Using hashing encoder ({} dimensions)", config.embedding_dim);
            Ok(Arc::new(HashingEncoder::new(config.embedding_dim)))
        }
    }
}

/// Wires the provider chain, encoder and favorites store from configuration.
pub fn build_orchestrator(config: &Config) -> Result<MatchOrchestrator> {
    let lookup = FallbackLookup::standard(
        &config.google_books_url,
        &config.openlibrary_url,
        config.lookup_timeout(),
    )?;
    let adapter = EmbeddingAdapter::new(build_encoder(config)?, config.encoder_timeout());
    let store = JsonFavoritesStore::new(&config.favorites_path);

    Ok(MatchOrchestrator::new(
        Arc::new(lookup),
        adapter,
        Arc::new(store),
    ))
}
