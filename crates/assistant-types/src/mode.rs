use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AssistantError;

/// Which gateway a submission is routed to. Doubles as the history category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Document,
    Encyclopedia,
    Image,
    Translation,
}

pub type HistoryCategory = Mode;

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[Mode::Document, Mode::Encyclopedia, Mode::Image, Mode::Translation]
    }

    pub fn label(&self) -> &str {
        match self {
            Mode::Document => "Document",
            Mode::Encyclopedia => "Encyclopedia",
            Mode::Image => "Image",
            Mode::Translation => "Translation",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Document => "document",
            Mode::Encyclopedia => "encyclopedia",
            Mode::Image => "image",
            Mode::Translation => "translation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Mode::Document),
            "encyclopedia" => Ok(Mode::Encyclopedia),
            "image" => Ok(Mode::Image),
            "translation" => Ok(Mode::Translation),
            other => Err(AssistantError::Validation(format!("Unknown mode: {}", other))),
        }
    }
}
