use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::{
    config::GeminiConfig,
    error::{PhotorealError, Result},
    logger,
    models::{
        ApiErrorResponse, AttachmentPayload, Content, GenerateContentRequest,
        GenerateContentResponse, GenerationConfig, GenerationOptions, ImageReference,
        ImagenInstance, ImagenOutputOptions, ImagenParameters, ImagenPredictRequest,
        ImagenPredictResponse, InlineData, Part, DEFAULT_OUTPUT_MIME,
    },
};

const ERROR_BODY_LIMIT: usize = 512;

#[derive(Clone)]
pub struct ImageClient {
    http: Client,
    config: Arc<GeminiConfig>,
    api_key: String,
}

impl ImageClient {
    pub fn new(http: Client, config: Arc<GeminiConfig>, api_key: String) -> Self {
        Self {
            http,
            config,
            api_key,
        }
    }

    /// Text-to-image through Imagen. Style and resolution travel inside the prompt text;
    /// aspect ratio is a first-class parameter.
    pub async fn generate(&self, options: &GenerationOptions) -> Result<ImageReference> {
        let model = &self.config.generate_model;
        let request = ImagenPredictRequest {
            instances: vec![ImagenInstance {
                prompt: options.compose_generation_prompt(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: options.aspect_ratio.api_code().to_string(),
                output_options: ImagenOutputOptions {
                    mime_type: DEFAULT_OUTPUT_MIME.to_string(),
                },
            },
        };

        log::info!(
            "Generating image with model: {} (style: {}, aspect: {}, resolution: {})",
            model,
            options.style,
            options.aspect_ratio,
            options.resolution
        );
        let _timer = logger::timer("imagen predict");

        let response: ImagenPredictResponse =
            self.post_json(&self.endpoint(model, "predict"), &request).await?;

        let Some(prediction) = response.predictions.iter().find(|prediction| {
            prediction
                .bytes_base64_encoded
                .as_deref()
                .is_some_and(|data| !data.is_empty())
        }) else {
            let reason = response
                .predictions
                .iter()
                .find_map(|prediction| prediction.rai_filtered_reason.as_deref());
            log::warn!("Imagen returned no usable image (filtered: {:?})", reason);
            return Err(PhotorealError::no_image(reason));
        };

        let data = prediction.bytes_base64_encoded.as_deref().unwrap_or_default();
        let mime_type = prediction.mime_type.as_deref().unwrap_or(DEFAULT_OUTPUT_MIME);
        to_reference(mime_type, data)
    }

    /// Image editing through Gemini: the attached image plus the prompt as an instruction.
    /// Aspect ratio and resolution are not sent; the model keeps its own output defaults.
    pub async fn edit(&self, instruction: &str, image: &AttachmentPayload) -> Result<ImageReference> {
        let model = &self.config.edit_model;
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.base64.clone(),
                        }),
                    },
                    Part {
                        text: Some(instruction.trim().to_string()),
                        inline_data: None,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        };

        log::info!(
            "Editing {} image with model: {}",
            image.mime_type,
            model
        );
        let _timer = logger::timer("gemini edit");

        let response: GenerateContentResponse = self
            .post_json(&self.endpoint(model, "generateContent"), &request)
            .await?;

        let mut model_text = Vec::new();
        for candidate in &response.candidates {
            let Some(content) = candidate.content.as_ref() else {
                log::debug!("Candidate without content (finish: {:?})", candidate.finish_reason);
                continue;
            };
            for part in &content.parts {
                if let Some(inline) = part.inline_data.as_ref().filter(|inline| !inline.data.is_empty()) {
                    return to_reference(&inline.mime_type, &inline.data);
                }
                if let Some(text) = part.text.as_deref() {
                    model_text.push(text.trim());
                }
            }
        }

        let block_reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref());
        log::warn!("Gemini returned no image (block reason: {:?})", block_reason);

        let explanation = if model_text.is_empty() {
            block_reason.map(|reason| format!("Blocked: {}", reason))
        } else {
            Some(model_text.join(" "))
        };
        Err(PhotorealError::no_image(explanation.as_deref()))
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:{}", self.config.api_base, model_path, method)
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        log::debug!("POST {}", endpoint);

        let response = self
            .http
            .post(endpoint)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| truncate(&text, ERROR_BODY_LIMIT));
            log::error!("Generation API returned {}: {}", status.as_u16(), message);
            return Err(PhotorealError::generation_failed(format!(
                "{} ({})",
                message,
                status.as_u16()
            )));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

fn to_reference(mime_type: &str, data: &str) -> Result<ImageReference> {
    let bytes = BASE64.decode(data)?;
    log::info!("Received {} image ({} bytes)", mime_type, bytes.len());
    Ok(ImageReference::from_base64(mime_type, data))
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
