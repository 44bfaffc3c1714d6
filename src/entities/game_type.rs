use serde::{Deserialize, Serialize};
use std::fmt;

/// How a game's main file is interpreted at play time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Webgl,
    Html5,
    Javascript,
    Unity,
    Phaser,
    /// Text adventure: playable content is stored inline on the record
    /// instead of as a file.
    Text,
    Pixel,
    Wasm,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameType {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "webgl" => Some(Self::Webgl),
            "html5" => Some(Self::Html5),
            "javascript" => Some(Self::Javascript),
            "unity" => Some(Self::Unity),
            "phaser" => Some(Self::Phaser),
            "text" => Some(Self::Text),
            "pixel" => Some(Self::Pixel),
            "wasm" => Some(Self::Wasm),
            _ => None,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Webgl => "webgl",
            Self::Html5 => "html5",
            Self::Javascript => "javascript",
            Self::Unity => "unity",
            Self::Phaser => "phaser",
            Self::Text => "text",
            Self::Pixel => "pixel",
            Self::Wasm => "wasm",
        }
    }

    /// Whether play requests serve inline content instead of a file.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(GameType::from_str("html5"), Some(GameType::Html5));
        assert_eq!(GameType::from_str("HTML5"), Some(GameType::Html5));
        assert_eq!(GameType::from_str("text"), Some(GameType::Text));
        assert_eq!(GameType::from_str("flash"), None);
    }

    #[test]
    fn test_as_str_round_trip() {
        for ty in [
            GameType::Webgl,
            GameType::Html5,
            GameType::Javascript,
            GameType::Unity,
            GameType::Phaser,
            GameType::Text,
            GameType::Pixel,
            GameType::Wasm,
        ] {
            assert_eq!(GameType::from_str(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn test_is_text() {
        assert!(GameType::Text.is_text());
        assert!(!GameType::Html5.is_text());
    }
}
