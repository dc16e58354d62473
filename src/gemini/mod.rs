pub mod image_client;

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::{
    config::GeminiConfig,
    error::{PhotorealError, Result},
    models::{AttachmentPayload, GenerationOptions, ImageReference},
};

pub use image_client::ImageClient;

/// One outbound generation call. Implementations make exactly one attempt and
/// leave the caller's options and attachment untouched.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        options: &GenerationOptions,
        attachment: Option<&AttachmentPayload>,
    ) -> Result<ImageReference>;
}

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
    config: Arc<GeminiConfig>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let http = Client::builder()
            .user_agent(concat!("photoreal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PhotorealError::ConfigError(e.to_string()))?;
        let config = Arc::new(config);

        log::debug!("Gemini client ready: {:?}", config);

        Ok(Self {
            image_client: ImageClient::new(http, config.clone(), api_key),
            config,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(
        &self,
        options: &GenerationOptions,
        attachment: Option<&AttachmentPayload>,
    ) -> Result<ImageReference> {
        match attachment {
            Some(image) => self.image_client.edit(&options.prompt, image).await,
            None => self.image_client.generate(options).await,
        }
    }
}
