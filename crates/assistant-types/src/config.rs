use serde::{Deserialize, Serialize};

/// Top-level assistant configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub languages: LanguageConfig,
}

/// Credentials for the cloud file-storage SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub api_key: String,
    pub client_id: String,
    pub scope: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            client_id: String::new(),
            scope: DEFAULT_CLOUD_SCOPE.to_string(),
        }
    }
}

impl CloudConfig {
    /// False while credentials are missing or still the template placeholders.
    pub fn is_configured(&self) -> bool {
        let usable = |value: &str| {
            let value = value.trim();
            !value.is_empty() && !value.to_ascii_uppercase().starts_with(PLACEHOLDER_PREFIX)
        };
        usable(&self.api_key) && usable(&self.client_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Synthesized speech arrives as 16-bit PCM at this rate
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// BCP-47 tag used for speech recognition
    pub voice: String,
    /// Translation target, by language name
    pub target: String,
    pub source: SourceLanguage,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            voice: "es-ES".to_string(),
            target: "English".to_string(),
            source: SourceLanguage::Auto,
        }
    }
}

/// Translation source: auto-detect or an explicit language name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    #[default]
    Auto,
    Named(String),
}

impl SourceLanguage {
    /// "Auto" (any case) or an empty name selects auto-detection.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(AUTO_SOURCE_LANGUAGE) {
            SourceLanguage::Auto
        } else {
            SourceLanguage::Named(name.to_string())
        }
    }

    /// Source hint for the translation gateway; `None` means auto-detect.
    pub fn hint(&self) -> Option<&str> {
        match self {
            SourceLanguage::Auto => None,
            SourceLanguage::Named(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

pub const AUTO_SOURCE_LANGUAGE: &str = "Auto";

pub const TARGET_LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Italian",
    "Portuguese",
    "Japanese",
    "Chinese",
];

const DEFAULT_CLOUD_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const PLACEHOLDER_PREFIX: &str = "YOUR_";
