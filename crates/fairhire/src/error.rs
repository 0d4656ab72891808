use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::hiring::{HiringError, MatchImportError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Import(MatchImportError),
    Hiring(HiringError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Import(err) => write!(f, "match import error: {}", err),
            AppError::Hiring(err) => write!(f, "hiring workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Hiring(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Hiring(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Storage failures during an import are server faults, not bad input.
impl From<MatchImportError> for AppError {
    fn from(value: MatchImportError) -> Self {
        match value {
            MatchImportError::Store(err) => Self::Hiring(HiringError::Persistence(err)),
            other => Self::Import(other),
        }
    }
}

impl From<HiringError> for AppError {
    fn from(value: HiringError) -> Self {
        Self::Hiring(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::StoreError;

    #[test]
    fn malformed_import_rows_are_client_errors() {
        let error = AppError::from(MatchImportError::InvalidRow {
            line: 2,
            reason: "rank is not a number".to_string(),
        });

        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_outage_during_import_is_a_server_error() {
        let error = AppError::from(MatchImportError::Store(StoreError::Unavailable(
            "match store offline".to_string(),
        )));

        assert!(matches!(
            error,
            AppError::Hiring(HiringError::Persistence(StoreError::Unavailable(_)))
        ));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
