/*!
 * Response-only services exposed to the host.
 *
 * Service data arrives as untyped JSON and is checked against the service
 * schema by deserialization; anything that does not fit is rejected before
 * the orchestrator sees it.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::ServiceError;
use crate::translation_service::{DetectionResult, TranslationOutcome, TranslationService};

pub const SERVICE_TRANSLATE: &str = "translate";
pub const SERVICE_DETECT: &str = "detect";

/// Data of the `translate` service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateCall {
    pub text: String,
    pub source: String,
    pub target: String,
}

/// Data of the `detect` service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectCall {
    pub text: String,
}

/// Registered services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Translate,
    Detect,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Translate, Service::Detect];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Translate => SERVICE_TRANSLATE,
            Self::Detect => SERVICE_DETECT,
        }
    }

    /// Short description of the fields the service accepts
    pub fn schema(&self) -> &'static str {
        match self {
            Self::Translate => "{text: string, source: string (or \"auto\"), target: string}",
            Self::Detect => "{text: string}",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Service {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SERVICE_TRANSLATE => Ok(Self::Translate),
            SERVICE_DETECT => Ok(Self::Detect),
            other => Err(ServiceError::UnknownService(other.to_string())),
        }
    }
}

/// Response of a service call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceResponse {
    Translation(TranslationOutcome),
    Detection(DetectionResult),
}

impl ServiceResponse {
    /// Response as JSON
    pub fn to_json(&self) -> Value {
        // Both variants are plain structs of strings and numbers
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, ServiceError> {
    serde_json::from_value(data).map_err(|e| ServiceError::InvalidServiceData(e.to_string()))
}

/// Validate service data and run the service
pub async fn handle(
    service: Service,
    translator: &TranslationService,
    data: Value,
) -> Result<ServiceResponse, ServiceError> {
    match service {
        Service::Translate => {
            let call: TranslateCall = parse(data)?;
            let outcome = translator.translate(&call.text, &call.source, &call.target).await?;
            Ok(ServiceResponse::Translation(outcome))
        }
        Service::Detect => {
            let call: DetectCall = parse(data)?;
            let result = translator.detect(&call.text).await?;
            Ok(ServiceResponse::Detection(result))
        }
    }
}
