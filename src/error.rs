use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Navigation engine error types
///
/// Raised only at the boundary where external input is admitted
/// (fixes, route steps, configuration). The transform and interpolation
/// math itself never fails.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Latitude out of range [-90, 90]: {0}")]
    InvalidLatitude(f64),

    #[error("Longitude out of range [-180, 180]: {0}")]
    InvalidLongitude(f64),

    #[error("Coordinate is not a finite number")]
    NonFiniteCoordinate,

    #[error("Horizontal accuracy must be finite and non-negative: {0}")]
    InvalidAccuracy(f64),

    #[error("Interpolation spacing must be finite and at least 0.1 m: {0}")]
    InvalidSpacing(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Location update failed: {0}")]
    LocationFailed(String),

    #[error("Routing request failed: {0}")]
    RoutingFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for navigation operations
pub type NavResult<T> = Result<T, NavError>;

/// Pending states. These are not failures: the caller is expected to wait
/// for the missing input and retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotReady {
    #[error("no location fix received yet")]
    NoFixes,

    #[error("no sufficiently accurate location fix yet")]
    NoOrigin,

    #[error("no route received yet")]
    NoRoute,
}

/// Message surfaced to the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub title: String,
    pub body: String,
}

impl UserMessage {
    pub fn error(body: impl Into<String>) -> Self {
        UserMessage {
            title: "Error".to_string(),
            body: body.into(),
        }
    }
}

impl From<&NavError> for UserMessage {
    fn from(error: &NavError) -> Self {
        UserMessage::error(error.to_string())
    }
}
