//! Prompt-driven photorealistic image generation and editing over the Gemini / Imagen API.
//!
//! [`GenerationController`] owns a session: the [`GenerationOptions`], an optional reference
//! image held in an [`AttachmentSlot`], and the idle/loading/success/failure state of the
//! current request. Calls go out through an [`ImageGenerator`], normally [`GeminiClient`].

pub mod attachment;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;

pub use attachment::{AttachedImage, AttachmentSlot, PreviewRegistry, PreviewUrl, SelectedFile};
pub use config::GeminiConfig;
pub use controller::{Completion, GenerationController, GenerationState, Mode, PendingGeneration};
pub use download::{save_image, suggested_filename};
pub use error::{PhotorealError, Result};
pub use gemini::{GeminiClient, ImageClient, ImageGenerator};
pub use models::{
    AspectRatio, AttachmentPayload, GenerationOptions, ImageReference, OptionUpdate, Resolution,
    Style,
};
