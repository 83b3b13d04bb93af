/*!
 * Full lifecycle tests: configure, set up, call services, reload
 */

use libretranslate_bridge::app_config::{Config, ConnectionEntry};
use libretranslate_bridge::app_controller::Controller;
use libretranslate_bridge::config_flow::{self, ConnectionOptions};
use libretranslate_bridge::coordinator::HealthState;
use libretranslate_bridge::providers::libretranslate::LibreTranslate;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config_path, create_temp_dir, init_logging};

async fn libretranslate_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "en", "name": "English", "targets": ["es"]},
            {"code": "es", "name": "Spanish", "targets": ["en"]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Language pair not supported"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"language": "fr", "confidence": 80.0}])))
        .mount(&server)
        .await;
    server
}

fn entry_for(server: &MockServer) -> ConnectionEntry {
    let url = Url::parse(&server.uri()).unwrap();
    ConnectionEntry::new(
        "Home",
        url.host_str().unwrap(),
        url.port().unwrap(),
        "",
        false,
    )
}

#[tokio::test]
async fn test_lifecycle_withMockServer_shouldSetUpAndServe() {
    init_logging();
    let server = libretranslate_server().await;
    let dir = create_temp_dir().unwrap();
    let path = config_path(dir.path());

    let mut config = Config::load_or_create(&path).unwrap();
    let entry = entry_for(&server);
    let client = LibreTranslate::from_entry(&entry, config.timeout_secs).unwrap();
    let entry = config_flow::add_entry(&mut config, entry, &client).await.unwrap();
    config.save(&path).unwrap();

    let config = Config::load_or_create(&path).unwrap();
    let mut controller = Controller::with_config(config).unwrap().with_polling(false);
    assert_eq!(controller.setup_all().await, 1);

    let response = controller
        .call_service("translate", None, json!({"text": "Bonjour", "source": "auto", "target": "es"}))
        .await
        .unwrap()
        .to_json();

    assert_eq!(response["translated_text"], "");
    assert_eq!(response["detected_language"], "fr");
    assert_eq!(response["uninstalled_detected_language"], "fr");
    assert_eq!(
        response["error"],
        "Detected French (80% confidence), but translation from French to Spanish is not available"
    );

    let snapshot = controller.health(&entry.entry_id).unwrap().display_snapshot();
    assert_eq!(snapshot.language_count, Some(2));
    assert_eq!(
        controller.coordinator(&entry.entry_id).unwrap().health(),
        HealthState::Healthy
    );
}

#[tokio::test]
async fn test_reload_afterServerMoved_shouldFollowNewAddress() {
    init_logging();
    let old_server = libretranslate_server().await;
    let new_server = libretranslate_server().await;

    let mut config = Config::default();
    let entry = entry_for(&old_server);
    let client = LibreTranslate::from_entry(&entry, 5).unwrap();
    let entry = config_flow::add_entry(&mut config, entry, &client).await.unwrap();

    let mut controller = Controller::with_config(config).unwrap().with_polling(false);
    controller.setup_entry(&entry.entry_id).await.unwrap();

    let moved = entry_for(&new_server);
    let options = ConnectionOptions {
        port: moved.port,
        ..ConnectionOptions::from_entry(&entry)
    };
    let client = LibreTranslate::from_entry(&moved, 5).unwrap();
    config_flow::update_entry_options(controller.config_mut(), &entry.entry_id, options, &client)
        .await
        .unwrap();
    controller.reload_entry(&entry.entry_id).await.unwrap();

    let languages_before = new_server.received_requests().await.unwrap_or_default().len();
    controller
        .call_service("detect", Some(&entry.entry_id), json!({"text": "Bonjour"}))
        .await
        .unwrap();
    let requests = new_server.received_requests().await.unwrap_or_default();

    assert_eq!(requests.len(), languages_before + 1);
    assert_eq!(requests.last().unwrap().url.path(), "/detect");
    assert_eq!(controller.loaded_entries().len(), 1);
}

#[tokio::test]
async fn test_setupPending_afterServerComesUp_shouldLoadEntry() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let entry = entry_for(&server);
    let mut config = Config::default();
    config.entries.push(entry.clone());
    let mut controller = Controller::with_config(config).unwrap().with_polling(false);

    assert_eq!(controller.setup_all().await, 0);
    assert!(controller.health(&entry.entry_id).is_none());
    assert_eq!(controller.config().entries.len(), 1);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "en", "name": "English", "targets": ["es"]}
        ])))
        .mount(&server)
        .await;

    assert_eq!(controller.setup_pending().await, 1);
    assert_eq!(controller.loaded_entries().len(), 1);
    let coordinator = controller.coordinator(&entry.entry_id).unwrap();
    assert_eq!(coordinator.health(), HealthState::Healthy);
    assert_eq!(controller.setup_pending().await, 0);
}
