/*!
 * Error types for the libretranslate-bridge library.
 *
 * This module contains custom error types for the different layers,
 * using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: classified failures of a single call to the server
 * - `CoordinatorError`: capability refresh failures
 * - `ServiceError`: failures surfaced to service callers
 * - `ConfigFlowError`: connection setup failures
 */

use thiserror::Error;

/// The three ways a call to the translation server can fail.
///
/// Only `Transport` says anything about reachability; the other two mean the
/// server answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, unreachable host, timeout
    Transport,
    /// HTTP 401 or 403
    Auth,
    /// Any other rejection by a reachable server
    Request,
}

/// Errors that can occur when talking to the translation server
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication failed (HTTP {status_code})")]
    AuthenticationError {
        /// HTTP status code (401 or 403)
        status_code: u16,
    },

    /// Error returned by the API itself
    #[error("Server returned HTTP {status_code}: {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Reason or error message from the server
        message: String,
    },

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectionError(_) => FailureKind::Transport,
            Self::AuthenticationError { .. } => FailureKind::Auth,
            Self::ApiError { .. } | Self::ParseError(_) => FailureKind::Request,
        }
    }

    /// Whether this failure means the server could not be reached
    pub fn is_transport(&self) -> bool {
        self.kind() == FailureKind::Transport
    }

    /// Classify an HTTP status code. `None` means success.
    pub fn from_status(status_code: u16, reason: &str) -> Option<Self> {
        match status_code {
            401 | 403 => Some(Self::AuthenticationError { status_code }),
            code if code >= 400 => Some(Self::ApiError {
                status_code: code,
                message: reason.to_string(),
            }),
            _ => None,
        }
    }
}

/// Errors raised by the capability coordinator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    /// A poll of the server's capabilities could not complete
    #[error("Error communicating with API: {0}")]
    UpdateFailed(#[source] ProviderError),

    /// The first refresh at setup failed
    #[error("Translation server '{name}' is not ready: {reason}")]
    NotReady {
        /// Coordinator name
        name: String,
        /// Why the first refresh failed
        reason: String,
    },
}

/// Errors surfaced to callers of the `translate` and `detect` services
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Source language is not installed on the server
    #[error("Source language '{language}' is not installed on the translation server")]
    InvalidSource {
        /// Requested source code
        language: String,
    },

    /// Target language is not reachable from the source language
    #[error("Cannot translate from '{from}' to '{to}': language pair is not installed")]
    InvalidTarget {
        /// Requested source code
        from: String,
        /// Requested target code
        to: String,
    },

    /// No translation server is configured
    #[error("No translation server is configured")]
    NoConfigEntry,

    /// The requested config entry does not exist
    #[error("Unknown config entry: {0}")]
    UnknownEntry(String),

    /// Service data did not match the service schema
    #[error("Invalid service data: {0}")]
    InvalidServiceData(String),

    /// No such service
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The translate call failed
    #[error("Translation failed: {0}")]
    TranslationFailed(#[source] ProviderError),

    /// The detect call failed
    #[error("Language detection failed: {0}")]
    DetectionFailed(#[source] ProviderError),
}

impl ServiceError {
    /// Whether this error was raised locally before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource { .. }
                | Self::InvalidTarget { .. }
                | Self::NoConfigEntry
                | Self::UnknownEntry(_)
                | Self::InvalidServiceData(_)
                | Self::UnknownService(_)
        )
    }

    /// The underlying server failure, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::TranslationFailed(err) | Self::DetectionFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors that can occur while adding or updating a connection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigFlowError {
    /// Server unreachable or rejected the connection check
    #[error("Cannot connect to the translation server: {0}")]
    CannotConnect(String),

    /// Server rejected the API key
    #[error("Invalid API key")]
    InvalidAuth,

    /// Server is reachable but has no language models installed
    #[error("No languages installed on server")]
    NoLanguages,

    /// The same host and port is already configured
    #[error("A translation server at {0} is already configured")]
    AlreadyConfigured(String),

    /// The entry to update does not exist
    #[error("Unknown config entry: {0}")]
    UnknownEntry(String),
}

impl ConfigFlowError {
    /// Form error key, or abort reason for `AlreadyConfigured`
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::CannotConnect(_) => "cannot_connect",
            Self::InvalidAuth => "invalid_auth",
            Self::NoLanguages => "no_languages",
            Self::AlreadyConfigured(_) => "already_configured",
            Self::UnknownEntry(_) => "unknown_entry",
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the coordinator
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// Error from a service call
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Error from connection setup
    #[error("Config flow error: {0}")]
    ConfigFlow(#[from] ConfigFlowError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
