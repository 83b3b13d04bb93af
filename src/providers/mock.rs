/*!
 * Mock provider implementation for testing.
 *
 * `MockProvider` answers from canned results and records every call, so
 * tests can assert both on outcomes and on whether the network would have
 * been touched at all.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{DetectionCandidate, LanguageDescriptor, Provider, TranslateResponse};

/// A call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `GET /languages`
    Languages,
    /// `POST /translate`
    Translate {
        /// Text to translate
        text: String,
        /// Source language
        source: String,
        /// Target language
        target: String,
    },
    /// `POST /detect`
    Detect {
        /// Text to detect
        text: String,
    },
}

/// Mock provider for testing orchestration behavior
#[derive(Debug)]
pub struct MockProvider {
    languages: Mutex<Result<Vec<LanguageDescriptor>, ProviderError>>,
    translate: Mutex<Result<TranslateResponse, ProviderError>>,
    detect: Mutex<Result<Vec<DetectionCandidate>, ProviderError>>,
    /// Artificial latency of `languages()`
    languages_delay: Option<Duration>,
    calls: Mutex<Vec<MockCall>>,
    languages_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a mock serving the given languages
    pub fn new(languages: Vec<LanguageDescriptor>) -> Self {
        Self {
            languages: Mutex::new(Ok(languages)),
            translate: Mutex::new(Ok(TranslateResponse::text(""))),
            detect: Mutex::new(Ok(Vec::new())),
            languages_delay: None,
            calls: Mutex::new(Vec::new()),
            languages_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// English/Spanish/French fixture
    pub fn with_default_languages() -> Self {
        Self::new(vec![
            LanguageDescriptor::new("en", "English", &["es", "fr"]),
            LanguageDescriptor::new("es", "Spanish", &["en"]),
            LanguageDescriptor::new("fr", "French", &["en", "es"]),
        ])
    }

    /// Set the `/translate` response
    pub fn with_translate(self, response: TranslateResponse) -> Self {
        *self.translate.lock() = Ok(response);
        self
    }

    /// Make `/translate` fail
    pub fn with_translate_error(self, error: ProviderError) -> Self {
        *self.translate.lock() = Err(error);
        self
    }

    /// Set the `/detect` response
    pub fn with_detect(self, candidates: Vec<DetectionCandidate>) -> Self {
        *self.detect.lock() = Ok(candidates);
        self
    }

    /// Make `/detect` fail
    pub fn with_detect_error(self, error: ProviderError) -> Self {
        *self.detect.lock() = Err(error);
        self
    }

    /// Delay every `/languages` call
    pub fn with_languages_delay(mut self, delay: Duration) -> Self {
        self.languages_delay = Some(delay);
        self
    }

    /// Change the `/languages` result between polls
    pub fn set_languages(&self, result: Result<Vec<LanguageDescriptor>, ProviderError>) {
        *self.languages.lock() = result;
    }

    /// Change the `/translate` result
    pub fn set_translate(&self, result: Result<TranslateResponse, ProviderError>) {
        *self.translate.lock() = result;
    }

    /// Change the `/detect` result
    pub fn set_detect(&self, result: Result<Vec<DetectionCandidate>, ProviderError>) {
        *self.detect.lock() = result;
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of `/translate` and `/detect` calls
    pub fn request_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, MockCall::Languages))
            .count()
    }

    /// Number of `/languages` calls
    pub fn languages_calls(&self) -> usize {
        self.languages_count.load(Ordering::SeqCst)
    }

    /// Transport failure fixture
    pub fn connection_refused() -> ProviderError {
        ProviderError::ConnectionError("Connection refused".to_string())
    }

    /// Unsupported pair fixture
    pub fn pair_unavailable() -> ProviderError {
        ProviderError::ApiError {
            status_code: 400,
            message: "Language pair is not supported".to_string(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn languages(&self) -> Result<Vec<LanguageDescriptor>, ProviderError> {
        self.languages_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall::Languages);
        if let Some(delay) = self.languages_delay {
            tokio::time::sleep(delay).await;
        }
        self.languages.lock().clone()
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslateResponse, ProviderError> {
        self.calls.lock().push(MockCall::Translate {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        });
        self.translate.lock().clone()
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>, ProviderError> {
        self.calls.lock().push(MockCall::Detect {
            text: text.to_string(),
        });
        self.detect.lock().clone()
    }
}
