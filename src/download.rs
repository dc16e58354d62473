use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ImageReference;

pub const DOWNLOAD_EXTENSION: &str = "jpg";
const PROMPT_PREFIX_CHARS: usize = 50;
const FALLBACK_STEM: &str = "image";

/// Filename stem derived from the first 50 characters of the raw prompt: every character
/// that is not an ASCII letter or digit becomes `_`, then the result is lowercased.
/// An empty prompt yields `image`.
pub fn filename_stem(prompt: &str) -> String {
    if prompt.is_empty() {
        return FALLBACK_STEM.to_string();
    }
    prompt
        .chars()
        .take(PROMPT_PREFIX_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub fn suggested_filename(prompt: &str) -> String {
    format!("{}.{}", filename_stem(prompt), DOWNLOAD_EXTENSION)
}

/// Writes the image behind `image` into `dir` under the name suggested for `prompt`.
pub async fn save_image(image: &ImageReference, prompt: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = image.decode_bytes()?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(suggested_filename(prompt));
    tokio::fs::write(&path, &bytes).await?;
    log::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitizes_and_lowercases() {
        assert_eq!(filename_stem("A Dog! By the/Lake"), "a_dog__by_the_lake");
        assert_eq!(suggested_filename("A Dog! By the/Lake"), "a_dog__by_the_lake.jpg");
    }

    #[test]
    fn test_truncates_raw_prompt_first() {
        let prompt = format!("{}{}", "x".repeat(49), "!tail");
        let stem = filename_stem(&prompt);
        assert_eq!(stem.chars().count(), 50);
        assert!(stem.ends_with("x_"));
    }

    #[test]
    fn test_non_ascii_becomes_underscore() {
        assert_eq!(filename_stem("Café über"), "caf___ber");
    }

    #[test]
    fn test_empty_prompt_is_not_a_dotfile() {
        assert_eq!(filename_stem(""), "image");
        assert_eq!(suggested_filename(""), "image.jpg");
        assert_eq!(suggested_filename("   "), "___.jpg");
    }

    #[tokio::test]
    async fn test_save_image_with_cleared_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let image = ImageReference::from_bytes("image/jpeg", b"jpg");

        let path = save_image(&image, "", dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "image.jpg");
    }

    #[tokio::test]
    async fn test_save_image_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let image = ImageReference::from_bytes("image/jpeg", b"\xff\xd8\xff");

        let path = save_image(&image, "Sunset Over Hills", dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "sunset_over_hills.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"\xff\xd8\xff".to_vec());
    }
}
