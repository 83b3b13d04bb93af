/*!
 * Integration tests for the LibreTranslate client against a mock HTTP server
 */

use std::time::Duration;

use libretranslate_bridge::errors::{FailureKind, ProviderError};
use libretranslate_bridge::providers::libretranslate::LibreTranslate;
use libretranslate_bridge::providers::{DetectionCandidate, Provider};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: &str) -> LibreTranslate {
    let url = Url::parse(&server.uri()).unwrap();
    LibreTranslate::from_url(&url, api_key, 5)
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_languages_withOkResponse_shouldParseDescriptors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "en", "name": "English", "targets": ["es", "fr"]},
            {"code": "es", "name": "Spanish", "targets": ["en"]}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let languages = client_for(&server, "").languages().await.unwrap();

    assert_eq!(languages.len(), 2);
    assert!(languages[0].supports_target("fr"));
    assert_eq!(client_for(&server, "").test_connection().await, Ok(2));
}

#[tokio::test]
async fn test_translate_withApiKey_shouldSendItInBody() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(body_json(json!({"q": "Hello", "source": "en", "target": "es", "api_key": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"translatedText": "Hola"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server, "secret").translate("Hello", "en", "es").await.unwrap();

    assert_eq!(response.translated_text, "Hola");
    assert!(response.detected_language.is_none());
}

#[tokio::test]
async fn test_translate_withAutoSource_shouldParseDetectedLanguage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translatedText": "Hello",
            "detectedLanguage": {"language": "zh", "confidence": 85.0}
        })))
        .mount(&server)
        .await;

    let response = client_for(&server, "").translate("你好", "auto", "en").await.unwrap();

    assert_eq!(response.detected_language, Some(DetectionCandidate::new("zh", 85.0)));
}

#[tokio::test]
async fn test_detect_withoutApiKey_shouldOmitKeyAndKeepOrder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(body_json(json!({"q": "Hola"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"language": "es", "confidence": 90.0},
            {"language": "pt", "confidence": 35.5}
        ])))
        .mount(&server)
        .await;

    let candidates = client_for(&server, "").detect("Hola").await.unwrap();

    assert_eq!(candidates, vec![DetectionCandidate::new("es", 90.0), DetectionCandidate::new("pt", 35.5)]);
}

#[tokio::test]
async fn test_call_withAuthStatuses_shouldClassifyAsAuth() {
    for status in [401, 403] {
        let server = MockServer::start().await;
        mount_status(&server, "/languages", status).await;

        let err = client_for(&server, "wrong").languages().await.unwrap_err();

        assert_eq!(err, ProviderError::AuthenticationError { status_code: status });
        assert_eq!(err.kind(), FailureKind::Auth);
    }
}

#[tokio::test]
async fn test_call_withOtherErrorStatuses_shouldClassifyAsRequest() {
    for status in [400, 404, 429, 500, 503] {
        let server = MockServer::start().await;
        mount_status(&server, "/translate", status).await;

        let err = client_for(&server, "").translate("Hello", "en", "xx").await.unwrap_err();

        assert!(matches!(err, ProviderError::ApiError { status_code, .. } if status_code == status));
        assert_eq!(err.kind(), FailureKind::Request);
    }
}

#[tokio::test]
async fn test_call_withErrorBody_shouldUseServerMessage() {
    let server = MockServer::start().await;
    Mock::given(path("/translate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "en (English) is not available as a target language from fr (French)"})))
        .mount(&server)
        .await;

    let err = client_for(&server, "").translate("Bonjour", "auto", "en").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::ApiError {
            status_code: 400,
            message: "en (English) is not available as a target language from fr (French)".to_string(),
        }
    );
}

#[tokio::test]
async fn test_call_withInvalidJson_shouldBeParseError() {
    let server = MockServer::start().await;
    Mock::given(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server, "").languages().await.unwrap_err();

    assert!(matches!(err, ProviderError::ParseError(_)));
    assert_eq!(err.kind(), FailureKind::Request);
}

#[tokio::test]
async fn test_call_withRefusedConnection_shouldClassifyAsTransport() {
    let url = Url::parse("http://127.0.0.1:1").unwrap();
    let client = LibreTranslate::from_url(&url, "", 5);

    let err = client.languages().await.unwrap_err();

    assert!(matches!(err, ProviderError::ConnectionError(_)));
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_call_withSlowServer_shouldTimeOutAsTransport() {
    let server = MockServer::start().await;
    Mock::given(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let url = Url::parse(&server.uri()).unwrap();
    let client = LibreTranslate::from_url(&url, "", 1);

    let err = client.detect("Hola").await.unwrap_err();

    assert_eq!(err, ProviderError::ConnectionError("Request timed out".to_string()));
}
