use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Style {
    #[default]
    #[serde(rename = "Realistic")]
    Realistic,
    #[serde(rename = "Cinematic")]
    Cinematic,
    #[serde(rename = "Product Shot")]
    ProductShot,
    #[serde(rename = "Macro")]
    Macro,
    #[serde(rename = "Architectural")]
    Architectural,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Realistic,
        Style::Cinematic,
        Style::ProductShot,
        Style::Macro,
        Style::Architectural,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Style::Realistic => "Realistic",
            Style::Cinematic => "Cinematic",
            Style::ProductShot => "Product Shot",
            Style::Macro => "Macro",
            Style::Architectural => "Architectural",
        }
    }

    /// Photographic direction appended to the prompt in generate mode.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Style::Realistic => {
                "Photorealistic, natural lighting, true-to-life colors, shot on a full-frame camera"
            }
            Style::Cinematic => {
                "Cinematic still, dramatic lighting, shallow depth of field, anamorphic lens look"
            }
            Style::ProductShot => {
                "Professional product photography, clean studio backdrop, softbox lighting"
            }
            Style::Macro => "Macro photography, extreme close-up, fine surface detail",
            Style::Architectural => {
                "Architectural photography, straight verticals, wide-angle lens, balanced exposure"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::Tall,
    ];

    pub fn label(&self) -> &'static str {
        self.api_code()
    }

    /// Encoding used by the generation API's `aspectRatio` parameter.
    pub fn api_code(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Resolution {
    #[serde(rename = "1080p")]
    Hd,
    #[serde(rename = "2K")]
    Qhd,
    #[default]
    #[serde(rename = "4K")]
    Uhd,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Hd, Resolution::Qhd, Resolution::Uhd];

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Hd => "1080p",
            Resolution::Qhd => "2K",
            Resolution::Uhd => "4K",
        }
    }

    /// The API has no resolution parameter, so this is folded into the prompt text.
    pub fn quality_hint(&self) -> &'static str {
        match self {
            Resolution::Hd => "Rendered in crisp 1080p high definition",
            Resolution::Qhd => "Rendered in sharp 2K resolution with fine detail",
            Resolution::Uhd => "Rendered in ultra-detailed 4K resolution, tack-sharp focus",
        }
    }
}

macro_rules! impl_label_traits {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|value| {
                        normalize(value.label()) == wanted
                            || normalize(&format!("{:?}", value)) == wanted
                    })
                    .ok_or_else(|| {
                        let known: Vec<&str> = $ty::ALL.iter().map(|value| value.label()).collect();
                        format!("unknown {} '{}', expected one of: {}", $what, s, known.join(", "))
                    })
            }
        }
    };
}

impl_label_traits!(Style, "style");
impl_label_traits!(AspectRatio, "aspect ratio");
impl_label_traits!(Resolution, "resolution");

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub prompt: String,
    pub style: Style,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

/// A single-field change to [`GenerationOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionUpdate {
    Prompt(String),
    Style(Style),
    AspectRatio(AspectRatio),
    Resolution(Resolution),
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn set(&mut self, update: OptionUpdate) {
        match update {
            OptionUpdate::Prompt(prompt) => self.prompt = prompt,
            OptionUpdate::Style(style) => self.style = style,
            OptionUpdate::AspectRatio(aspect_ratio) => self.aspect_ratio = aspect_ratio,
            OptionUpdate::Resolution(resolution) => self.resolution = resolution,
        }
    }

    pub fn trimmed_prompt(&self) -> &str {
        self.prompt.trim()
    }

    pub fn is_submittable(&self) -> bool {
        !self.trimmed_prompt().is_empty()
    }

    /// Prompt text sent in generate mode: description, style direction and quality hint.
    pub fn compose_generation_prompt(&self) -> String {
        let description = self.trimmed_prompt().trim_end_matches('.');
        format!(
            "{}. Style: {}. {}. {}.",
            description,
            self.style.label(),
            self.style.descriptor(),
            self.resolution.quality_hint()
        )
    }
}
