/*!
 * # libretranslate-bridge
 *
 * Connects a home automation host to self-hosted LibreTranslate servers.
 *
 * ## Features
 *
 * - Poll each server for its installed languages and translation pairs
 * - Translate text with an explicit source or with `source = "auto"`
 * - Detect the language of text
 * - Report server reachability and installed languages to display widgets
 * - Partial results when an auto-detected language has no installed pair
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `providers`: LibreTranslate client and failure classification:
 *   - `providers::libretranslate`: HTTP client
 *   - `providers::mock`: Recording mock for tests
 * - `coordinator`: Capability cache and health state per server
 * - `translation_service`: Request orchestration
 * - `health`: Read-side projections and sensors
 * - `services`: `translate` and `detect` service handlers
 * - `config_flow`: Connection setup and options validation
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language name utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod providers;
pub mod coordinator;
pub mod translation_service;
pub mod health;
pub mod services;
pub mod config_flow;
pub mod app_controller;
pub mod language_utils;

// Re-export main types for easier usage
pub use app_config::{Config, ConnectionEntry};
pub use app_controller::Controller;
pub use coordinator::{CapabilitySnapshot, Coordinator, HealthState};
pub use errors::{AppError, ConfigFlowError, CoordinatorError, FailureKind, ProviderError, ServiceError};
pub use health::HealthProjection;
pub use language_utils::get_language_name;
pub use translation_service::{TranslationOutcome, TranslationService};
