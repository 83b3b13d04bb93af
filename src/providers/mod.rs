/*!
 * Provider implementations for the translation server.
 *
 * This module contains the client side of the LibreTranslate REST API:
 * - `libretranslate`: HTTP client that classifies every failure
 * - `mock`: in-memory provider that records its calls
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One installed source language and the targets it can translate into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// Language code, e.g. "en"
    pub code: String,
    /// Display name, e.g. "English"
    pub name: String,
    /// Codes this language can be translated into
    #[serde(default)]
    pub targets: Vec<String>,
}

impl LanguageDescriptor {
    /// Create a new descriptor
    pub fn new(code: impl Into<String>, name: impl Into<String>, targets: &[&str]) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Whether `target` is reachable from this language
    pub fn supports_target(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }
}

/// A detected language with its confidence (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    /// Language code
    pub language: String,
    /// Confidence in percent
    pub confidence: f64,
}

impl DetectionCandidate {
    /// Create a new candidate
    pub fn new(language: impl Into<String>, confidence: f64) -> Self {
        Self {
            language: language.into(),
            confidence,
        }
    }
}

/// Response body of `POST /translate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    /// The translated text
    #[serde(rename = "translatedText")]
    pub translated_text: String,

    /// Language the server detected, sent for `source = "auto"` and
    /// occasionally for explicit sources
    #[serde(rename = "detectedLanguage", default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<DetectionCandidate>,
}

impl TranslateResponse {
    /// Response without detection data
    pub fn text(translated_text: impl Into<String>) -> Self {
        Self {
            translated_text: translated_text.into(),
            detected_language: None,
        }
    }

    /// Attach a detected language
    pub fn with_detected(mut self, language: impl Into<String>, confidence: f64) -> Self {
        self.detected_language = Some(DetectionCandidate::new(language, confidence));
        self
    }
}

/// Common trait for translation server clients
///
/// Every method either returns the parsed response or a classified
/// `ProviderError`; see `ProviderError::kind`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Fetch installed languages (`GET /languages`)
    async fn languages(&self) -> Result<Vec<LanguageDescriptor>, ProviderError>;

    /// Translate text (`POST /translate`)
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslateResponse, ProviderError>;

    /// Detect the language of text (`POST /detect`), ordered by descending confidence
    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, ProviderError>;

    /// Test the connection to the server
    ///
    /// # Returns
    /// * `Result<usize, ProviderError>` - Number of installed languages
    async fn test_connection(&self) -> Result<usize, ProviderError> {
        Ok(self.languages().await?.len())
    }
}

pub mod libretranslate;
pub mod mock;
