/*!
 * Tests for request orchestration
 */

use libretranslate_bridge::coordinator::HealthState;
use libretranslate_bridge::errors::{ProviderError, ServiceError};
use libretranslate_bridge::providers::mock::{MockCall, MockProvider};
use libretranslate_bridge::providers::{DetectionCandidate, TranslateResponse};
use libretranslate_bridge::translation_service::TranslationService;
use serde_json::json;

use crate::common::{coordinator_for, ready_service, sample_languages};

#[tokio::test]
async fn test_translate_withInstalledPair_shouldReturnOnlyTranslatedText() {
    let mock = MockProvider::new(sample_languages()).with_translate(TranslateResponse::text("Hola"));
    let (service, mock) = ready_service(mock).await;

    let outcome = service.translate("Hello", "en", "es").await.unwrap();

    assert_eq!(serde_json::to_value(&outcome).unwrap(), json!({"translated_text": "Hola"}));
    assert_eq!(
        mock.calls().last(),
        Some(&MockCall::Translate {
            text: "Hello".to_string(),
            source: "en".to_string(),
            target: "es".to_string(),
        })
    );
}

#[tokio::test]
async fn test_translate_withUnknownSource_shouldFailWithoutNetworkCall() {
    let (service, mock) = ready_service(MockProvider::new(sample_languages())).await;

    let err = service.translate("Hallo", "de", "en").await.unwrap_err();

    assert_eq!(err, ServiceError::InvalidSource { language: "de".to_string() });
    assert!(err.is_validation());
    assert_eq!(mock.request_count(), 0);
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translate_withUnsupportedTarget_shouldFailWithoutNetworkCall() {
    let (service, mock) = ready_service(MockProvider::new(sample_languages())).await;

    let err = service.translate("Hola", "es", "fr").await.unwrap_err();

    assert_eq!(
        err,
        ServiceError::InvalidTarget {
            from: "es".to_string(),
            to: "fr".to_string(),
        }
    );
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withoutSnapshot_shouldRejectEverySource() {
    let mock = std::sync::Arc::new(MockProvider::new(sample_languages()));
    let service = TranslationService::new(coordinator_for(&mock));

    let err = service.translate("Hello", "en", "es").await.unwrap_err();

    assert!(matches!(err, ServiceError::InvalidSource { .. }));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_translate_withTransportFailure_shouldDegradeImmediately() {
    let mock = MockProvider::new(sample_languages()).with_translate_error(MockProvider::connection_refused());
    let (service, _mock) = ready_service(mock).await;
    assert_eq!(service.coordinator().health(), HealthState::Healthy);

    let err = service.translate("Hello", "en", "es").await.unwrap_err();

    assert_eq!(err, ServiceError::TranslationFailed(MockProvider::connection_refused()));
    assert_eq!(service.coordinator().health(), HealthState::Degraded);
    assert!(!service.coordinator().last_update_success());
    assert!(service.coordinator().data().is_some(), "snapshot must be kept");
}

#[tokio::test]
async fn test_translate_withRequestFailure_shouldKeepHealth() {
    let mock = MockProvider::new(sample_languages()).with_translate_error(MockProvider::pair_unavailable());
    let (service, _mock) = ready_service(mock).await;

    let err = service.translate("Hello", "en", "es").await.unwrap_err();

    assert!(matches!(err, ServiceError::TranslationFailed(ProviderError::ApiError { status_code: 400, .. })));
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translate_withAuthFailure_shouldKeepHealth() {
    let mock = MockProvider::new(sample_languages())
        .with_translate_error(ProviderError::AuthenticationError { status_code: 403 });
    let (service, _mock) = ready_service(mock).await;

    let err = service.translate("Hello", "en", "es").await.unwrap_err();

    assert!(matches!(err, ServiceError::TranslationFailed(ProviderError::AuthenticationError { .. })));
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translate_withUninstalledDetectedLanguage_shouldFlagIt() {
    let mock = MockProvider::new(sample_languages())
        .with_translate(TranslateResponse::text("Hello").with_detected("zh", 85.0));
    let (service, _mock) = ready_service(mock).await;

    let outcome = service.translate("你好", "en", "es").await.unwrap();

    assert_eq!(outcome.translated_text, "Hello");
    assert_eq!(outcome.detected_language.as_deref(), Some("zh"));
    assert_eq!(outcome.detection_confidence, Some(85.0));
    assert_eq!(outcome.uninstalled_detected_language.as_deref(), Some("zh"));
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_translateAuto_withUnsupportedSource_shouldSkipValidation() {
    let mock = MockProvider::new(sample_languages())
        .with_detect(vec![DetectionCandidate::new("es", 97.0)])
        .with_translate(TranslateResponse::text("Hello").with_detected("es", 97.0));
    let (service, mock) = ready_service(mock).await;

    let outcome = service.translate("Hola", "auto", "de").await.unwrap();

    assert_eq!(outcome.translated_text, "Hello");
    assert_eq!(outcome.detected_language.as_deref(), Some("es"));
    assert!(outcome.uninstalled_detected_language.is_none());
    assert!(mock.calls().contains(&MockCall::Translate {
        text: "Hola".to_string(),
        source: "auto".to_string(),
        target: "de".to_string(),
    }));
}

#[tokio::test]
async fn test_translateAuto_withRejectedPair_shouldReturnPartialOutcome() {
    let mock = MockProvider::new(sample_languages())
        .with_detect(vec![DetectionCandidate::new("fr", 92.0), DetectionCandidate::new("it", 60.0)])
        .with_translate_error(MockProvider::pair_unavailable());
    let (service, _mock) = ready_service(mock).await;

    let outcome = service.translate("Bonjour", "auto", "es").await.unwrap();

    assert!(outcome.is_partial());
    assert_eq!(outcome.translated_text, "");
    assert_eq!(outcome.detected_language.as_deref(), Some("fr"));
    assert_eq!(outcome.detection_confidence, Some(92.0));
    assert_eq!(outcome.uninstalled_detected_language.as_deref(), Some("fr"));
    assert_eq!(
        outcome.error.as_deref(),
        Some("Detected French (92% confidence), but translation from French to Spanish is not available")
    );
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translateAuto_withLowConfidenceOnly_shouldKeepServerMessage() {
    let mock = MockProvider::new(sample_languages())
        .with_detect(vec![DetectionCandidate::new("fr", 49.9)])
        .with_translate_error(MockProvider::pair_unavailable());
    let (service, _mock) = ready_service(mock).await;

    let outcome = service.translate("Bonjour", "auto", "es").await.unwrap();

    assert!(outcome.detected_language.is_none());
    assert!(outcome.detection_confidence.is_none());
    assert_eq!(outcome.error, Some(MockProvider::pair_unavailable().to_string()));
}

#[tokio::test]
async fn test_translateAuto_withDetectAndTranslateFailing_shouldReturnBareError() {
    let mock = MockProvider::new(sample_languages())
        .with_detect_error(ProviderError::ApiError {
            status_code: 500,
            message: "Internal Server Error".to_string(),
        })
        .with_translate_error(MockProvider::pair_unavailable());
    let (service, _mock) = ready_service(mock).await;

    let outcome = service.translate("???", "auto", "es").await.unwrap();

    assert_eq!(outcome.translated_text, "");
    assert!(outcome.error.is_some());
    assert!(outcome.detected_language.is_none());
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translateAuto_withDetectTransportFailure_shouldNotDegrade() {
    let mock = MockProvider::new(sample_languages())
        .with_detect_error(MockProvider::connection_refused())
        .with_translate(TranslateResponse::text("Hi"));
    let (service, _mock) = ready_service(mock).await;

    let outcome = service.translate("Hola", "auto", "en").await.unwrap();

    assert_eq!(outcome.translated_text, "Hi");
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_translateAuto_withTransportFailure_shouldDegradeAndFail() {
    let mock = MockProvider::new(sample_languages()).with_translate_error(MockProvider::connection_refused());
    let (service, _mock) = ready_service(mock).await;

    let err = service.translate("Hola", "auto", "en").await.unwrap_err();

    assert!(matches!(err, ServiceError::TranslationFailed(ProviderError::ConnectionError(_))));
    assert_eq!(service.coordinator().health(), HealthState::Degraded);
}

#[tokio::test]
async fn test_translateAuto_withAuthFailure_shouldFailWithoutPartialResult() {
    let mock = MockProvider::new(sample_languages())
        .with_detect(vec![DetectionCandidate::new("es", 99.0)])
        .with_translate_error(ProviderError::AuthenticationError { status_code: 401 });
    let (service, _mock) = ready_service(mock).await;

    let err = service.translate("Hola", "auto", "en").await.unwrap_err();

    assert!(matches!(err, ServiceError::TranslationFailed(ProviderError::AuthenticationError { status_code: 401 })));
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}

#[tokio::test]
async fn test_detect_withCandidates_shouldKeepServerOrder() {
    let candidates = vec![DetectionCandidate::new("es", 90.0), DetectionCandidate::new("pt", 40.0)];
    let mock = MockProvider::new(sample_languages()).with_detect(candidates.clone());
    let (service, _mock) = ready_service(mock).await;

    let result = service.detect("Hola").await.unwrap();

    assert_eq!(result.detections, candidates);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"detections": [{"language": "es", "confidence": 90.0}, {"language": "pt", "confidence": 40.0}]})
    );
}

#[tokio::test]
async fn test_detect_withTransportFailure_shouldDegrade() {
    let mock = MockProvider::new(sample_languages()).with_detect_error(MockProvider::connection_refused());
    let (service, _mock) = ready_service(mock).await;

    let err = service.detect("Hola").await.unwrap_err();

    assert!(matches!(err, ServiceError::DetectionFailed(ProviderError::ConnectionError(_))));
    assert_eq!(service.coordinator().health(), HealthState::Degraded);
}

#[tokio::test]
async fn test_detect_withRequestFailure_shouldKeepHealth() {
    let mock = MockProvider::new(sample_languages()).with_detect_error(ProviderError::ParseError("bad json".to_string()));
    let (service, _mock) = ready_service(mock).await;

    let err = service.detect("Hola").await.unwrap_err();

    assert!(matches!(err, ServiceError::DetectionFailed(ProviderError::ParseError(_))));
    assert_eq!(service.coordinator().health(), HealthState::Healthy);
}
