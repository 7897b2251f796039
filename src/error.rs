use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Configuration error
    ConfigError(String),
    /// Gold data file missing at the configured path (fatal at startup)
    DataNotFound(PathBuf),
    /// Gold data file exists but cannot be read as a price table
    DataFormat(String),
    /// Requested market is not a column of the price table
    UnknownMarket(String),
    /// Date query parameter is not a valid YYYY-MM-DD date
    BadDate(String),
    /// Requested best/worst hours count outside 1..=8
    InvalidHourCount(usize),
    /// Selected market/date combination has no priced rows
    EmptySlice { market: String, date: NaiveDate },
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::DataNotFound(path) => {
                write!(f, "gold data not found at {}", path.display())
            }
            Self::DataFormat(msg) => write!(f, "Invalid gold data: {}", msg),
            Self::UnknownMarket(market) => write!(f, "Unknown market: {}", market),
            Self::BadDate(raw) => write!(f, "Invalid date: {} (expected YYYY-MM-DD)", raw),
            Self::InvalidHourCount(n) => {
                write!(f, "Invalid hours count: {} (expected 1..=8)", n)
            }
            Self::EmptySlice { market, date } => {
                write!(f, "No data for market {} on {}", market, date)
            }
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DataNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DataFormat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownMarket(_) => StatusCode::BAD_REQUEST,
            Self::BadDate(_) => StatusCode::BAD_REQUEST,
            Self::InvalidHourCount(_) => StatusCode::BAD_REQUEST,
            Self::EmptySlice { .. } => StatusCode::NOT_FOUND,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

pub(crate) fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::ConfigError(_) => "config_error",
        AppError::DataNotFound(_) => "data_not_found",
        AppError::DataFormat(_) => "data_format",
        AppError::UnknownMarket(_) => "unknown_market",
        AppError::BadDate(_) => "bad_date",
        AppError::InvalidHourCount(_) => "invalid_hour_count",
        AppError::EmptySlice { .. } => "empty_slice",
        AppError::InternalError(_) => "internal_error",
    }
}

// Implement conversions from common error types
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::DataFormat(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}
