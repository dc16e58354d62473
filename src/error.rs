use thiserror::Error;

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt to generate or edit the image.";

pub const NO_IMAGE_MESSAGE: &str = "The model did not return an image. \
     This usually means the request was blocked by the safety filter; try rephrasing your prompt.";

pub const UNKNOWN_FAILURE_MESSAGE: &str = "An unknown error occurred.";

#[derive(Debug, Error)]
pub enum PhotorealError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Please select an image file (got '{0}').")]
    InvalidFileType(String),
    #[error("Failed to read image file: {0}")]
    FileReadError(String),
    #[error("{0}")]
    NoImageReturned(String),
    #[error("Failed to generate image: {0}")]
    GenerationFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PhotorealError {
    pub fn empty_prompt() -> Self {
        PhotorealError::ValidationError(EMPTY_PROMPT_MESSAGE.to_string())
    }

    pub fn no_image(model_text: Option<&str>) -> Self {
        match model_text.map(str::trim).filter(|text| !text.is_empty()) {
            Some(text) => {
                PhotorealError::NoImageReturned(format!("{} Model said: {}", NO_IMAGE_MESSAGE, text))
            }
            None => PhotorealError::NoImageReturned(NO_IMAGE_MESSAGE.to_string()),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            PhotorealError::GenerationFailed(UNKNOWN_FAILURE_MESSAGE.to_string())
        } else {
            PhotorealError::GenerationFailed(message)
        }
    }
}

impl From<reqwest::Error> for PhotorealError {
    fn from(err: reqwest::Error) -> Self {
        PhotorealError::generation_failed(err.to_string())
    }
}

impl From<serde_json::Error> for PhotorealError {
    fn from(err: serde_json::Error) -> Self {
        PhotorealError::generation_failed(format!("malformed response: {}", err))
    }
}

impl From<base64::DecodeError> for PhotorealError {
    fn from(err: base64::DecodeError) -> Self {
        PhotorealError::generation_failed(format!("image payload is not valid base64: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PhotorealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt_message() {
        let err = PhotorealError::empty_prompt();
        assert_eq!(err.to_string(), EMPTY_PROMPT_MESSAGE);
    }

    #[test]
    fn test_no_image_wording_differs_from_generic_failure() {
        let no_image = PhotorealError::no_image(None).to_string();
        let failed = PhotorealError::generation_failed("boom").to_string();
        assert!(no_image.contains("did not return an image"));
        assert!(!failed.contains("did not return an image"));
        assert_eq!(failed, "Failed to generate image: boom");
    }

    #[test]
    fn test_no_image_includes_model_text() {
        let err = PhotorealError::no_image(Some("  I can't edit that photo. "));
        assert!(err.to_string().ends_with("Model said: I can't edit that photo."));
        assert_eq!(
            PhotorealError::no_image(Some("   ")).to_string(),
            NO_IMAGE_MESSAGE
        );
    }

    #[test]
    fn test_blank_failure_falls_back() {
        let err = PhotorealError::generation_failed("");
        assert_eq!(
            err.to_string(),
            format!("Failed to generate image: {}", UNKNOWN_FAILURE_MESSAGE)
        );
    }
}
